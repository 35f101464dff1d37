//! pdfcmap-core: Backend-independent CMap data types and decoding algorithms.
//!
//! This crate provides the foundational types (Codespace, CidRange,
//! CodeToUnicode, CMap) and algorithms (variable-length code segmentation,
//! code→CID and code→Unicode lookup, `usecmap` flattening) used by
//! pdfcmap-rs. Parsing CMap programs and reading PDF fonts live in
//! pdfcmap-parse.

pub mod cid_range;
pub mod cmap;
pub mod codespace;
pub mod collection;
pub mod error;
pub mod glyph_names;
pub mod options;
pub mod system_info;
pub mod to_unicode;

pub use cid_range::{Cid, CidRange, CidRangeTable, NOTDEF_CID};
pub use cmap::{CMap, CMapBuilder};
pub use codespace::{
    CharCode, Code, Codes, Codespace, CodespaceTable, MAX_CODE_BYTES, bytes_to_code,
};
pub use collection::{CidToUnicode, cid_to_unicode, cid_to_unicode_for};
pub use error::CMapError;
pub use glyph_names::{AdobeGlyphNames, GlyphNameResolver, glyph_name_to_char};
pub use options::{CMapOptions, TextOptions, UnicodeNorm};
pub use system_info::CidSystemInfo;
pub use to_unicode::{CodeToUnicode, decode_utf16be};
