//! Error types for the loading layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`LoadError`]
//! that wraps CMap construction errors and PDF object errors met while
//! reading a composite font.

use pdfcmap_core::CMapError;
use thiserror::Error;

/// Error type for loading CMaps from PDF font dictionaries.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The CMap program or predefined name could not be turned into a CMap.
    #[error(transparent)]
    CMap(#[from] CMapError),

    /// The font dictionary is not a usable composite font.
    #[error("font error: {0}")]
    Font(String),

    /// Error from the PDF object layer (missing key, bad stream filter).
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}
