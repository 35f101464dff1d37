//! Intrinsic Unicode for predefined CMaps.
//!
//! Predefined CMaps carry no `bfchar`/`bfrange` data, but for many of them
//! the character code already says which character is meant: the `Uni*`
//! CMaps take UTF-16BE codes, and the legacy CJK CMaps (GBK-EUC, ETen-B5,
//! 90ms-RKSJ, KSCms-UHC and relatives) take codes in a national encoding
//! that `encoding_rs` can decode.

use encoding_rs::Encoding;
use pdfcmap_core::{CharCode, MAX_CODE_BYTES};

/// How the codes of a predefined CMap encode Unicode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicEncoding {
    /// Codes are UTF-16BE code units (2 bytes) or surrogate pairs (4 bytes).
    Utf16Be,
    /// Codes are byte sequences in a legacy multi-byte encoding.
    Legacy(&'static Encoding),
}

impl IntrinsicEncoding {
    /// Decode one code of `len` bytes.
    ///
    /// Returns `None` if the bytes are not a valid character in this
    /// encoding.
    pub fn decode(&self, code: CharCode, len: usize) -> Option<String> {
        if len == 0 || len > MAX_CODE_BYTES {
            return None;
        }
        match self {
            IntrinsicEncoding::Utf16Be => decode_utf16_code(code, len),
            IntrinsicEncoding::Legacy(encoding) => {
                let bytes = code.to_be_bytes();
                encoding
                    .decode_without_bom_handling_and_without_replacement(&bytes[MAX_CODE_BYTES - len..])
                    .map(|text| text.into_owned())
            }
        }
    }
}

/// Detect the intrinsic encoding from a predefined CMap name.
///
/// Returns `None` for Identity-H/V and for names whose codes carry no
/// character meaning.
pub fn intrinsic_encoding(cmap_name: &str) -> Option<IntrinsicEncoding> {
    // Strip -H/-V suffix for matching
    let base = cmap_name
        .strip_suffix("-H")
        .or_else(|| cmap_name.strip_suffix("-V"))
        .unwrap_or(cmap_name);

    let legacy = match base {
        // Unicode CMaps: the code is the UTF-16BE text
        "UniGB-UCS2" | "UniGB-UTF16" | "UniCNS-UCS2" | "UniCNS-UTF16" | "UniJIS-UCS2"
        | "UniJIS-UCS2-HW" | "UniJIS-UTF16" | "UniJIS2004-UTF16" | "UniKS-UCS2"
        | "UniKS-UTF16" => return Some(IntrinsicEncoding::Utf16Be),

        // Chinese Simplified: GBK/GB2312 encoding
        "GBK-EUC" | "GB-EUC" | "GBpc-EUC" | "GBKp-EUC" => encoding_rs::GBK,
        "GBK2K" => encoding_rs::GB18030,

        // Chinese Traditional: Big5 encoding
        "B5pc" | "ETen-B5" | "ETenms-B5" | "HKscs-B5" => encoding_rs::BIG5,

        // Japanese: Shift-JIS encoding
        "90ms-RKSJ" | "90pv-RKSJ" | "83pv-RKSJ" | "78-RKSJ" | "Add-RKSJ" | "Ext-RKSJ" => {
            encoding_rs::SHIFT_JIS
        }

        // Japanese: EUC-JP encoding
        "EUC" => encoding_rs::EUC_JP,

        // Korean: EUC-KR / Unified Hangul Code
        "KSC-EUC" | "KSCms-UHC" | "KSCpc-EUC" => encoding_rs::EUC_KR,

        // Identity or unknown: codes carry no character meaning
        _ => return None,
    };
    Some(IntrinsicEncoding::Legacy(legacy))
}

/// Decode a 2-byte UTF-16 unit or a 4-byte surrogate pair.
fn decode_utf16_code(code: CharCode, len: usize) -> Option<String> {
    let units = match len {
        2 => vec![code as u16],
        4 => vec![(code >> 16) as u16, code as u16],
        _ => return None,
    };
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(name: &str) -> Option<&'static Encoding> {
        match intrinsic_encoding(name) {
            Some(IntrinsicEncoding::Legacy(enc)) => Some(enc),
            _ => None,
        }
    }

    // ========== intrinsic_encoding tests ==========

    #[test]
    fn gbk_euc_returns_gbk_encoding() {
        assert_eq!(legacy("GBK-EUC-H"), Some(encoding_rs::GBK));
        assert_eq!(legacy("GBK-EUC-V"), Some(encoding_rs::GBK));
        assert_eq!(legacy("GB-EUC-H"), Some(encoding_rs::GBK));
    }

    #[test]
    fn eten_b5_returns_big5_encoding() {
        assert_eq!(legacy("ETen-B5-H"), Some(encoding_rs::BIG5));
        assert_eq!(legacy("B5pc-V"), Some(encoding_rs::BIG5));
    }

    #[test]
    fn rksj_returns_shift_jis_encoding() {
        assert_eq!(legacy("90ms-RKSJ-H"), Some(encoding_rs::SHIFT_JIS));
    }

    #[test]
    fn japanese_euc_returns_euc_jp_encoding() {
        assert_eq!(legacy("EUC-H"), Some(encoding_rs::EUC_JP));
    }

    #[test]
    fn korean_returns_euc_kr_encoding() {
        assert_eq!(legacy("KSCms-UHC-H"), Some(encoding_rs::EUC_KR));
        assert_eq!(legacy("KSC-EUC-V"), Some(encoding_rs::EUC_KR));
    }

    #[test]
    fn unicode_cmaps_are_utf16() {
        for name in ["UniGB-UCS2-H", "UniJIS-UTF16-V", "UniCNS-UTF16-H", "UniKS-UCS2-V"] {
            assert_eq!(intrinsic_encoding(name), Some(IntrinsicEncoding::Utf16Be), "{name}");
        }
    }

    #[test]
    fn identity_and_unknown_return_none() {
        assert_eq!(intrinsic_encoding("Identity-H"), None);
        assert_eq!(intrinsic_encoding("Identity-V"), None);
        assert_eq!(intrinsic_encoding("SomeCustomEncoding"), None);
    }

    // ========== decode tests ==========

    #[test]
    fn decode_gbk_chinese_chars() {
        // 关 = GBK 0xB9D8, 于 = GBK 0xD3DA
        let gbk = IntrinsicEncoding::Legacy(encoding_rs::GBK);
        assert_eq!(gbk.decode(0xB9D8, 2).as_deref(), Some("关"));
        assert_eq!(gbk.decode(0xD3DA, 2).as_deref(), Some("于"));
        assert_eq!(gbk.decode(0x41, 1).as_deref(), Some("A"));
    }

    #[test]
    fn decode_shift_jis_single_and_double_byte() {
        let sjis = IntrinsicEncoding::Legacy(encoding_rs::SHIFT_JIS);
        assert_eq!(sjis.decode(0x82A0, 2).as_deref(), Some("あ"));
        assert_eq!(sjis.decode(0xB1, 1).as_deref(), Some("ｱ"));
    }

    #[test]
    fn decode_big5_and_uhc() {
        // 中 = Big5 0xA4A4, 가 = UHC 0xB0A1
        assert_eq!(
            IntrinsicEncoding::Legacy(encoding_rs::BIG5).decode(0xA4A4, 2).as_deref(),
            Some("中")
        );
        assert_eq!(
            IntrinsicEncoding::Legacy(encoding_rs::EUC_KR).decode(0xB0A1, 2).as_deref(),
            Some("가")
        );
    }

    #[test]
    fn decode_invalid_legacy_sequence_is_none() {
        let sjis = IntrinsicEncoding::Legacy(encoding_rs::SHIFT_JIS);
        assert_eq!(sjis.decode(0x82, 1), None);
    }

    #[test]
    fn decode_utf16_bmp_and_surrogate_pair() {
        let utf16 = IntrinsicEncoding::Utf16Be;
        assert_eq!(utf16.decode(0x4E2D, 2).as_deref(), Some("中"));
        assert_eq!(utf16.decode(0xD83D_DE00, 4).as_deref(), Some("\u{1F600}"));
    }

    #[test]
    fn decode_utf16_lone_surrogate_is_none() {
        let utf16 = IntrinsicEncoding::Utf16Be;
        assert_eq!(utf16.decode(0xD800, 2), None);
        assert_eq!(utf16.decode(0x41, 1), None);
    }

    #[test]
    fn decode_rejects_bad_length() {
        assert_eq!(IntrinsicEncoding::Utf16Be.decode(0, 0), None);
        assert_eq!(IntrinsicEncoding::Legacy(encoding_rs::GBK).decode(0, 5), None);
    }
}
