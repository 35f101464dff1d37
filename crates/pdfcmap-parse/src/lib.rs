//! pdfcmap-parse: CMap program parser, predefined CMap registry and font adapter.
//!
//! This crate turns PostScript-syntax CMap programs (embedded `/Encoding` and
//! `/ToUnicode` streams, and the compiled-in predefined CMaps) into
//! [`pdfcmap_core::CMap`] values, resolves `usecmap` inheritance, and reads
//! Type0 font dictionaries through `lopdf`. It depends on pdfcmap-core for
//! the CMap data types and decoding algorithms.

pub mod cjk_encoding;
pub mod error;
pub mod font;
pub mod inherit;
pub mod parser;
pub mod predefined;
pub mod tokenizer;

pub use cjk_encoding::{IntrinsicEncoding, intrinsic_encoding};
pub use error::LoadError;
pub use font::{CompositeFont, DecodedChar};
pub use inherit::{CMapSource, resolve_usecmap};
pub use parser::{CMapParser, parse_cmap};
pub use pdfcmap_core;
pub use predefined::{Registry, code_to_unicode, is_predefined, predefined_cmap, predefined_names};
