//! Composite (Type0) font adapter.
//!
//! Ties the CMap machinery to a PDF font dictionary read through `lopdf`:
//! the `/Encoding` CMap splits shown strings into codes and selects CIDs, and
//! Unicode text is resolved from, in order, the `/ToUnicode` CMap, the
//! intrinsic encoding of a predefined `/Encoding`, and the CID→Unicode table
//! of the descendant font's character collection.

use std::sync::Arc;

use pdfcmap_core::{
    CMap, CharCode, Cid, CidSystemInfo, CidToUnicode, Code, NOTDEF_CID, TextOptions,
    cid_to_unicode_for,
};

use crate::cjk_encoding::{IntrinsicEncoding, intrinsic_encoding};
use crate::error::LoadError;
use crate::parser::CMapParser;
use crate::predefined::predefined_cmap;

/// One character decoded from a string shown with a composite font.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    /// The character code. For a byte that starts no valid code this is the
    /// byte itself.
    pub code: CharCode,
    /// Number of input bytes the code occupied.
    pub byte_len: usize,
    /// Selected CID (0 for unmapped codes and invalid bytes).
    pub cid: Cid,
    /// Unicode text, or the replacement character if none could be found.
    pub unicode: String,
}

/// A Type0 font's encoding and Unicode sources.
#[derive(Debug, Clone)]
pub struct CompositeFont {
    encoding: Arc<CMap>,
    intrinsic: Option<IntrinsicEncoding>,
    to_unicode: Option<CMap>,
    system_info: Option<CidSystemInfo>,
    fallback: Option<&'static CidToUnicode>,
    text_options: TextOptions,
}

impl CompositeFont {
    /// Build a font from an encoding CMap and optional Unicode sources.
    ///
    /// The intrinsic encoding is taken from the encoding CMap's name; the
    /// collection fallback from `system_info`, or from the encoding CMap's
    /// own `/CIDSystemInfo` when `system_info` is `None`.
    pub fn new(
        encoding: Arc<CMap>,
        to_unicode: Option<CMap>,
        system_info: Option<CidSystemInfo>,
    ) -> Self {
        let system_info = system_info.or_else(|| encoding.system_info().cloned());
        let fallback = system_info.as_ref().and_then(cid_to_unicode_for);
        Self {
            intrinsic: intrinsic_encoding(encoding.name()),
            encoding,
            to_unicode,
            system_info,
            fallback,
            text_options: TextOptions::default(),
        }
    }

    /// Read a Type0 font dictionary.
    ///
    /// `/Encoding` may name a predefined CMap or be an embedded CMap stream
    /// (optionally with a `/UseCMap` entry). A `/ToUnicode` stream that fails
    /// to parse is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Font`] if the dictionary is not a Type0 font or
    /// has no usable `/Encoding`, and [`LoadError::CMap`] if the encoding
    /// CMap cannot be loaded.
    pub fn from_font_dict(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Result<Self, LoadError> {
        if !is_type0_font(dict) {
            return Err(LoadError::Font("not a Type0 font".to_string()));
        }

        let parser = CMapParser::new();
        let encoding = load_encoding(doc, dict, &parser)?;
        let to_unicode = load_to_unicode(doc, dict, &parser);
        let system_info = get_descendant_font(doc, dict)
            .and_then(|desc| parse_cid_system_info(doc, desc));
        Ok(Self::new(encoding, to_unicode, system_info))
    }

    /// Use `options` when producing text.
    pub fn with_text_options(mut self, options: TextOptions) -> Self {
        self.text_options = options;
        self
    }

    /// The encoding CMap.
    pub fn encoding(&self) -> &CMap {
        &self.encoding
    }

    /// The `/ToUnicode` CMap, if one loaded.
    pub fn to_unicode(&self) -> Option<&CMap> {
        self.to_unicode.as_ref()
    }

    /// Character collection of the descendant font.
    pub fn system_info(&self) -> Option<&CidSystemInfo> {
        self.system_info.as_ref()
    }

    /// Whether the encoding selects vertical writing.
    pub fn is_vertical(&self) -> bool {
        self.encoding.is_vertical()
    }

    /// Decode a shown string into characters.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedChar> {
        self.encoding
            .codes(bytes)
            .map(|code| match code {
                Code::Valid { value, len } => {
                    let cid = self.encoding.to_cid(value);
                    DecodedChar {
                        code: value,
                        byte_len: usize::from(len),
                        cid,
                        unicode: self.unicode_for(value, usize::from(len), cid),
                    }
                }
                Code::Invalid(byte) => DecodedChar {
                    code: CharCode::from(byte),
                    byte_len: 1,
                    cid: NOTDEF_CID,
                    unicode: self.text_options.replacement.to_string(),
                },
            })
            .collect()
    }

    /// Decode a shown string straight to text.
    pub fn text(&self, bytes: &[u8]) -> String {
        self.decode(bytes).into_iter().map(|c| c.unicode).collect()
    }

    fn unicode_for(&self, code: CharCode, len: usize, cid: Cid) -> String {
        let raw = self
            .to_unicode
            .as_ref()
            .and_then(|tu| tu.to_unicode(code))
            .map(str::to_string)
            .or_else(|| self.intrinsic.and_then(|enc| enc.decode(code, len)))
            .or_else(|| {
                self.fallback
                    .filter(|_| cid != NOTDEF_CID)
                    .and_then(|table| table.lookup(cid))
                    .map(String::from)
            });
        match raw {
            Some(text) => self.text_options.unicode_norm.normalize(&text).into_owned(),
            None => self.text_options.replacement.to_string(),
        }
    }
}

/// Detect whether a font dictionary represents a Type0 (composite/CID) font.
pub fn is_type0_font(font_dict: &lopdf::Dictionary) -> bool {
    font_dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .and_then(|n| std::str::from_utf8(n).ok())
        .is_some_and(|s| s == "Type0")
}

/// Extract the descendant CIDFont dictionary from a Type0 font.
pub fn get_descendant_font<'a>(
    doc: &'a lopdf::Document,
    type0_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    let descendants = type0_dict.get(b"DescendantFonts").ok()?;
    let descendants = resolve_object(doc, descendants);
    let arr = descendants.as_array().ok()?;
    let first = arr.first()?;
    let first = resolve_object(doc, first);
    first.as_dict().ok()
}

/// Load the `/Encoding` CMap: a predefined name or an embedded stream.
fn load_encoding(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    parser: &CMapParser,
) -> Result<Arc<CMap>, LoadError> {
    let encoding = dict
        .get(b"Encoding")
        .map_err(|_| LoadError::Font("Type0 font has no /Encoding".to_string()))?;
    let encoding = resolve_object(doc, encoding);

    if let Some(name) = encoding.as_name().ok().and_then(|n| std::str::from_utf8(n).ok()) {
        return Ok(predefined_cmap(name)?);
    }

    let stream = encoding
        .as_stream()
        .map_err(|_| LoadError::Font("/Encoding is neither a name nor a stream".to_string()))?;
    let mut cmap = parser.load(&stream_content(stream)?)?;

    // A /UseCMap entry in the stream dictionary acts like a `usecmap` line.
    if cmap.usecmap().is_none() {
        if let Some(parent) = stream
            .dict
            .get(b"UseCMap")
            .ok()
            .and_then(|o| resolve_object(doc, o).as_name().ok())
            .and_then(|n| std::str::from_utf8(n).ok())
        {
            cmap = cmap.inherit(&*predefined_cmap(parent)?);
        }
    }
    Ok(Arc::new(cmap))
}

/// Load the `/ToUnicode` CMap, logging and dropping anything unusable.
fn load_to_unicode(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    parser: &CMapParser,
) -> Option<CMap> {
    let obj = resolve_object(doc, dict.get(b"ToUnicode").ok()?);
    let Ok(stream) = obj.as_stream() else {
        tracing::debug!("ignoring /ToUnicode that is not a stream");
        return None;
    };
    let result = stream_content(stream)
        .map_err(LoadError::from)
        .and_then(|data| parser.load(&data).map_err(LoadError::from));
    match result {
        Ok(cmap) => Some(cmap),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable /ToUnicode CMap");
            None
        }
    }
}

/// Parse /CIDSystemInfo from a CIDFont dictionary.
fn parse_cid_system_info(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<CidSystemInfo> {
    let info_obj = dict.get(b"CIDSystemInfo").ok()?;
    let info_obj = resolve_object(doc, info_obj);
    let info_dict = info_obj.as_dict().ok()?;

    let text = |key: &[u8]| {
        info_dict
            .get(key)
            .ok()
            .map(|o| resolve_object(doc, o))
            .and_then(|o| match o {
                lopdf::Object::String(s, _) => Some(String::from_utf8_lossy(s).into_owned()),
                _ => None,
            })
            .unwrap_or_default()
    };

    let supplement = info_dict
        .get(b"Supplement")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0);

    Some(CidSystemInfo::new(text(b"Registry"), text(b"Ordering"), supplement))
}

/// Stream bytes, decompressed if the stream has a /Filter.
fn stream_content(stream: &lopdf::Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

/// Resolve an indirect reference to the actual object.
fn resolve_object<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, Stream, dictionary};
    use pdfcmap_core::{CMapError, UnicodeNorm};

    const TOUNICODE: &[u8] = b"\
        /CIDInit /ProcSet findresource begin\n\
        12 dict begin\n\
        begincmap\n\
        /CMapName /Adobe-Identity-UCS def\n\
        /CMapType 2 def\n\
        1 begincodespacerange\n\
        <0000> <FFFF>\n\
        endcodespacerange\n\
        3 beginbfchar\n\
        <4E2D> <4E2D>\n\
        <6587> <6587>\n\
        <0001> <FB01>\n\
        endbfchar\n\
        endcmap\n";

    fn system_info_dict(registry: &str, ordering: &str, supplement: i64) -> Object {
        Object::Dictionary(dictionary! {
            "Registry" => Object::String(registry.as_bytes().to_vec(), lopdf::StringFormat::Literal),
            "Ordering" => Object::String(ordering.as_bytes().to_vec(), lopdf::StringFormat::Literal),
            "Supplement" => Object::Integer(supplement),
        })
    }

    /// Build a Type0 font dictionary with the given /Encoding, optional
    /// ToUnicode program and descendant collection.
    fn type0_font(
        doc: &mut Document,
        encoding: Object,
        to_unicode: Option<&[u8]>,
        collection: Option<(&str, &str)>,
    ) -> lopdf::Dictionary {
        let mut cid_font_dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "MSGothic",
        };
        if let Some((registry, ordering)) = collection {
            cid_font_dict.set("CIDSystemInfo", system_info_dict(registry, ordering, 6));
        }
        let cid_font_id = doc.add_object(Object::Dictionary(cid_font_dict));

        let mut type0_dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MSGothic",
            "Encoding" => encoding,
            "DescendantFonts" => Object::Array(vec![Object::Reference(cid_font_id)]),
        };
        if let Some(data) = to_unicode {
            let stream = Stream::new(dictionary! {}, data.to_vec());
            let id = doc.add_object(Object::Stream(stream));
            type0_dict.set("ToUnicode", Object::Reference(id));
        }
        type0_dict
    }

    fn name(n: &str) -> Object {
        Object::Name(n.as_bytes().to_vec())
    }

    #[test]
    fn identity_h_with_tounicode() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-H"), Some(TOUNICODE), Some(("Adobe", "Identity")));
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();

        let chars = font.decode(&[0x4E, 0x2D, 0x65, 0x87]);
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].code, 0x4E2D);
        assert_eq!(chars[0].cid, 0x4E2D);
        assert_eq!(chars[0].byte_len, 2);
        assert_eq!(chars[0].unicode, "中");
        assert_eq!(chars[1].unicode, "文");
        assert!(font.encoding().is_identity());
        assert!(font.to_unicode().is_some());
    }

    #[test]
    fn predefined_unicode_cmap_uses_intrinsic_text() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("UniJIS-UCS2-H"), None, Some(("Adobe", "Japan1")));
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();

        let chars = font.decode(&[0x30, 0x42, 0x4E, 0x2D]);
        assert_eq!(chars[0].cid, 843);
        assert_eq!(chars[0].unicode, "あ");
        // Not in the compiled-in CID ranges, but still decodable as UTF-16.
        assert_eq!(chars[1].cid, 0);
        assert_eq!(chars[1].unicode, "中");
    }

    #[test]
    fn legacy_cmap_decodes_through_encoding() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("90ms-RKSJ-H"), None, Some(("Adobe", "Japan1")));
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert_eq!(font.text(&[0x41, 0x82, 0xA0, 0xB1]), "Aあｱ");
    }

    #[test]
    fn identity_without_tounicode_uses_collection_fallback() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-H"), None, Some(("Adobe", "Japan1")));
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        // CID 34 is 'A' and CID 843 is 'あ' in Adobe-Japan1.
        assert_eq!(font.text(&[0x00, 0x22, 0x03, 0x4B]), "Aあ");
        assert_eq!(font.system_info().unwrap().ordering, "Japan1");
    }

    #[test]
    fn identity_collection_gives_replacement() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-H"), None, Some(("Adobe", "Identity")));
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert_eq!(font.text(&[0x00, 0x22]), "\u{FFFD}");
    }

    #[test]
    fn system_info_falls_back_to_encoding_cmap() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("UniGB-UCS2-H"), None, None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert_eq!(font.system_info().unwrap().ordering, "GB1");
    }

    #[test]
    fn vertical_encoding() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-V"), None, None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert!(font.is_vertical());
        assert_eq!(font.decode(&[0x12, 0x34])[0].cid, 0x1234);
    }

    #[test]
    fn embedded_encoding_stream_with_usecmap() {
        let mut doc = Document::with_version("1.5");
        let program = b"\
            /UniJIS-UCS2-H usecmap\n\
            /CMapName /Custom-H def\n\
            1 begincidrange <0041> <0041> 9000 endcidrange\n";
        let stream_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, program.to_vec())));
        let dict = type0_font(&mut doc, Object::Reference(stream_id), None, None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();

        // Codespaces come from the parent; the child's ranges replace the parent's.
        assert_eq!(font.encoding().name(), "Custom-H");
        assert_eq!(font.decode(&[0x00, 0x41])[0].cid, 9000);
        assert_eq!(font.decode(&[0x30, 0x42])[0].cid, 0);
    }

    #[test]
    fn embedded_encoding_stream_with_usecmap_entry() {
        let mut doc = Document::with_version("1.5");
        let program = b"/CMapName /Custom-V def /WMode 1 def";
        let stream = Stream::new(dictionary! { "UseCMap" => "Identity-H" }, program.to_vec());
        let stream_id = doc.add_object(Object::Stream(stream));
        let dict = type0_font(&mut doc, Object::Reference(stream_id), None, None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert!(font.is_vertical());
        assert_eq!(font.decode(&[0x01, 0x02])[0].cid, 0x0102);
    }

    #[test]
    fn malformed_tounicode_is_ignored() {
        let mut doc = Document::with_version("1.5");
        let bad = b"1 beginbfrange <01> <03> [<0041>] endbfrange";
        let dict = type0_font(&mut doc, name("Identity-H"), Some(bad), None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        assert!(font.to_unicode().is_none());
    }

    #[test]
    fn invalid_bytes_decode_to_placeholders() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-H"), Some(TOUNICODE), None);
        let font = CompositeFont::from_font_dict(&doc, &dict).unwrap();
        let chars = font.decode(&[0x4E, 0x2D, 0x65]);
        assert_eq!(chars.len(), 2);
        assert_eq!(
            chars[1],
            DecodedChar {
                code: 0x65,
                byte_len: 1,
                cid: 0,
                unicode: "\u{FFFD}".to_string(),
            }
        );
    }

    #[test]
    fn text_options_normalize_and_replace() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("Identity-H"), Some(TOUNICODE), Some(("Adobe", "Identity")));
        let font = CompositeFont::from_font_dict(&doc, &dict)
            .unwrap()
            .with_text_options(TextOptions {
                unicode_norm: UnicodeNorm::Nfkc,
                replacement: '?',
            });
        assert_eq!(font.text(&[0x00, 0x01, 0x00, 0x02]), "fi?");
    }

    #[test]
    fn not_type0_is_font_error() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Type" => "Font", "Subtype" => "TrueType" };
        let err = CompositeFont::from_font_dict(&doc, &dict).unwrap_err();
        assert!(matches!(err, LoadError::Font(_)));
    }

    #[test]
    fn missing_encoding_is_font_error() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Type" => "Font", "Subtype" => "Type0" };
        let err = CompositeFont::from_font_dict(&doc, &dict).unwrap_err();
        assert!(matches!(err, LoadError::Font(_)));
    }

    #[test]
    fn unknown_predefined_encoding_is_cmap_error() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc, name("NoSuch-H"), None, None);
        let err = CompositeFont::from_font_dict(&doc, &dict).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CMap(CMapError::UnknownPredefined(ref n)) if n == "NoSuch-H"
        ));
    }

    #[test]
    fn get_descendant_font_missing() {
        let doc = Document::with_version("1.5");
        let type0_dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MSGothic",
        };
        assert!(get_descendant_font(&doc, &type0_dict).is_none());
        assert!(is_type0_font(&type0_dict));
    }
}
