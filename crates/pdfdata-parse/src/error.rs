//! Error types for the content source layer.
//!
//! Uses [`thiserror`] for derivation. [`BackendError`] wraps lopdf and I/O
//! failures and converts into [`PdfDataError`].

use pdfdata_core::PdfDataError;
use thiserror::Error;

/// Error type for content source operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// Malformed in-memory page dump.
    #[error("invalid page dump: {0}")]
    Dump(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfDataError),
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

impl From<BackendError> for PdfDataError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfDataError::ParseError(msg),
            BackendError::Io(e) => PdfDataError::IoError(e.to_string()),
            BackendError::Interpreter(msg) => PdfDataError::ParseError(msg),
            BackendError::Dump(msg) => PdfDataError::ParseError(msg),
            BackendError::Core(e) => e,
        }
    }
}
