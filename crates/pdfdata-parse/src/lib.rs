//! pdfdata-parse: content sources for pdfdata.
//!
//! This crate turns documents into per-page streams of text fragments and
//! marked-content events ([`PageContent`]). [`LopdfSource`] reads PDF files
//! with lopdf and interprets their content streams; [`MemorySource`] serves
//! pages built in code or loaded from a JSON dump.

pub mod error;
pub mod font;
pub mod interpreter;
pub mod lopdf_source;
pub mod memory;
pub mod source;
pub mod text_state;

pub use error::BackendError;
pub use font::{Glyph, PdfFont, ToUnicode};
pub use interpreter::{Interpretation, interpret_page};
pub use lopdf_source::LopdfSource;
pub use memory::{DEFAULT_PAGE_SIZE, MemoryPage, MemorySource};
pub use pdfdata_core;
pub use source::{ContentSource, PageContent, check_page_number};
pub use text_state::{TextParams, TextState};
