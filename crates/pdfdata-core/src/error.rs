//! Error and diagnostic types for pdfdata.
//!
//! Provides [`PdfDataError`] for fatal errors that stop a parse and
//! [`Diagnostic`] for non-fatal issues that are collected and logged
//! while processing continues.

use std::fmt;

/// Fatal error types for PDF data extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfDataError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// The supplied password is incorrect for this encrypted PDF.
    InvalidPassword,
    /// A parser option failed validation.
    InvalidOption {
        /// Option name (e.g., "cells").
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A requested page does not exist in the document.
    PageOutOfRange {
        /// The requested 1-based page number.
        page: usize,
        /// Number of pages in the document.
        page_count: usize,
    },
    /// Neither a document location nor document bytes were supplied.
    NoInput,
    /// `parse()` was called on a parser that already ran.
    AlreadyStarted,
    /// Any other error not covered by specific variants.
    Other(String),
}

impl PdfDataError {
    /// Shorthand for an [`InvalidOption`](PdfDataError::InvalidOption) error.
    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PdfDataError::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PdfDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfDataError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfDataError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfDataError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfDataError::InvalidPassword => write!(f, "the supplied password is incorrect"),
            PdfDataError::InvalidOption { name, reason } => {
                write!(f, "invalid option {name}: {reason}")
            }
            PdfDataError::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} out of range (document has {page_count} pages)")
            }
            PdfDataError::NoInput => write!(f, "no document url or data supplied"),
            PdfDataError::AlreadyStarted => write!(f, "parser has already been started"),
            PdfDataError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfDataError {}

impl From<std::io::Error> for PdfDataError {
    fn from(err: std::io::Error) -> Self {
        PdfDataError::IoError(err.to_string())
    }
}

impl From<regex::Error> for PdfDataError {
    fn from(err: regex::Error) -> Self {
        PdfDataError::invalid_option("heading", err.to_string())
    }
}

/// Machine-readable code for a non-fatal issue.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum DiagnosticCode {
    /// A fragment is not left-to-right; it is kept but not laid out.
    NonLtrText,
    /// A marked-content tag outside the standard structure types.
    UnknownTag,
    /// `EMC` without a matching `BMC`/`BDC`, or a section left open.
    UnbalancedMarkedContent,
    /// A referenced font was not found in page resources.
    MissingFont,
    /// Text decoding fell back to a default mapping.
    EncodingFallback,
    /// A requested page does not exist and was skipped.
    PageSkipped,
    /// Any other issue not covered by specific variants.
    Other(String),
}

impl DiagnosticCode {
    /// Returns the string tag for this code.
    pub fn as_str(&self) -> &str {
        match self {
            DiagnosticCode::NonLtrText => "NON_LTR_TEXT",
            DiagnosticCode::UnknownTag => "UNKNOWN_TAG",
            DiagnosticCode::UnbalancedMarkedContent => "UNBALANCED_MARKED_CONTENT",
            DiagnosticCode::MissingFont => "MISSING_FONT",
            DiagnosticCode::EncodingFallback => "ENCODING_FALLBACK",
            DiagnosticCode::PageSkipped => "PAGE_SKIPPED",
            DiagnosticCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal issue found while parsing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Machine-readable code.
    pub code: DiagnosticCode,
    /// Human-readable description.
    pub description: String,
    /// 1-based page number, if applicable.
    pub page: Option<usize>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
        }
    }

    /// Attach a page number (builder pattern).
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        Ok(())
    }
}
