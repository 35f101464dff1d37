//! Options controlling CMap loading limits and text decoding.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

use crate::error::CMapError;

/// Limits applied while loading a CMap program.
///
/// CMap programs come from untrusted documents. These limits keep a
/// hostile program from allocating without bound; the defaults are far
/// above anything a real CMap needs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CMapOptions {
    /// Maximum size of a CMap program in bytes (default: 16 MiB).
    pub max_program_bytes: usize,
    /// Maximum number of codes a single `bfrange` entry may expand to
    /// (default: 65,536).
    pub max_bfrange_codes: usize,
}

impl Default for CMapOptions {
    fn default() -> Self {
        Self {
            max_program_bytes: 16 * 1024 * 1024,
            max_bfrange_codes: 0x1_0000,
        }
    }
}

impl CMapOptions {
    /// Fail with [`CMapError::ResourceLimitExceeded`] if `actual > limit`.
    pub fn check_limit(limit_name: &str, limit: usize, actual: usize) -> Result<(), CMapError> {
        if actual > limit {
            return Err(CMapError::ResourceLimitExceeded {
                limit_name: limit_name.to_string(),
                limit_value: limit,
                actual_value: actual,
            });
        }
        Ok(())
    }
}

/// Unicode normalization form to apply to decoded text.
///
/// CJK fallback tables and ToUnicode streams disagree on composed vs.
/// decomposed and full-width vs. compatibility forms; normalizing gives
/// consistent text regardless of which source produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnicodeNorm {
    /// No normalization (default).
    #[default]
    None,
    /// Canonical Decomposition, followed by Canonical Composition (NFC).
    Nfc,
    /// Canonical Decomposition (NFD).
    Nfd,
    /// Compatibility Decomposition, followed by Canonical Composition (NFKC).
    Nfkc,
    /// Compatibility Decomposition (NFKD).
    Nfkd,
}

impl UnicodeNorm {
    /// Apply this normalization form to `text`.
    ///
    /// Borrows the input unchanged if normalization is `None`.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            UnicodeNorm::None => Cow::Borrowed(text),
            UnicodeNorm::Nfc => Cow::Owned(text.nfc().collect()),
            UnicodeNorm::Nfd => Cow::Owned(text.nfd().collect()),
            UnicodeNorm::Nfkc => Cow::Owned(text.nfkc().collect()),
            UnicodeNorm::Nfkd => Cow::Owned(text.nfkd().collect()),
        }
    }
}

/// Options for turning decoded codes into text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextOptions {
    /// Normalization applied to each decoded character (default: None).
    pub unicode_norm: UnicodeNorm,
    /// Text substituted for codes with no Unicode mapping
    /// (default: U+FFFD REPLACEMENT CHARACTER).
    pub replacement: char,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            unicode_norm: UnicodeNorm::None,
            replacement: '\u{FFFD}',
        }
    }
}

impl TextOptions {
    /// Options for search and indexing: NFKC folds ligatures and
    /// full-width forms to their plain equivalents.
    pub fn for_search() -> Self {
        Self {
            unicode_norm: UnicodeNorm::Nfkc,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmap_options_defaults() {
        let opts = CMapOptions::default();
        assert_eq!(opts.max_program_bytes, 16 * 1024 * 1024);
        assert_eq!(opts.max_bfrange_codes, 65_536);
    }

    #[test]
    fn check_limit_allows_equal() {
        assert!(CMapOptions::check_limit("max_bfrange_codes", 10, 10).is_ok());
    }

    #[test]
    fn check_limit_rejects_above() {
        let err = CMapOptions::check_limit("max_bfrange_codes", 10, 11).unwrap_err();
        assert_eq!(
            err,
            CMapError::ResourceLimitExceeded {
                limit_name: "max_bfrange_codes".to_string(),
                limit_value: 10,
                actual_value: 11,
            }
        );
    }

    #[test]
    fn unicode_norm_default_is_none() {
        assert_eq!(UnicodeNorm::default(), UnicodeNorm::None);
    }

    #[test]
    fn normalize_none_borrows() {
        let text = "caf\u{0065}\u{0301}";
        assert!(matches!(UnicodeNorm::None.normalize(text), Cow::Borrowed(t) if t == text));
    }

    #[test]
    fn normalize_nfc_composes() {
        assert_eq!(UnicodeNorm::Nfc.normalize("caf\u{0065}\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn normalize_nfd_decomposes() {
        assert_eq!(UnicodeNorm::Nfd.normalize("caf\u{00E9}"), "caf\u{0065}\u{0301}");
    }

    #[test]
    fn normalize_nfkc_folds_ligature_and_fullwidth() {
        assert_eq!(UnicodeNorm::Nfkc.normalize("\u{FB01}"), "fi");
        assert_eq!(UnicodeNorm::Nfkc.normalize("\u{FF21}"), "A");
        assert_eq!(UnicodeNorm::Nfkd.normalize("\u{FB01}"), "fi");
    }

    #[test]
    fn text_options_defaults() {
        let opts = TextOptions::default();
        assert_eq!(opts.unicode_norm, UnicodeNorm::None);
        assert_eq!(opts.replacement, '\u{FFFD}');
        assert_eq!(TextOptions::for_search().unicode_norm, UnicodeNorm::Nfkc);
    }
}
