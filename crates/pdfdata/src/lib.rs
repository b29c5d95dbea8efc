//! pdfdata: extract tabular data from PDF documents.
//!
//! Tables in PDFs are usually just positioned text. This crate clusters
//! text fragments into cells and rows, finds the table between an
//! optional heading and stop heading, drops repeated header rows across
//! pages and filters rows by column count.
//!
//! # Example
//!
//! ```ignore
//! use pdfdata::{DataParser, ParserOptions};
//!
//! let options = ParserOptions::builder()
//!     .path("census.pdf")
//!     .heading("Table 3")
//!     .cells("4-6")
//!     .page_header(50.0)
//!     .build()?;
//! let mut parser = DataParser::new(options)?;
//! for row in parser.parse()? {
//!     println!("{}", row.join(" | "));
//! }
//! ```

pub mod control;
pub mod input;
pub mod parser;

pub use control::{ParseControl, ParserState};
pub use input::{BoxedSource, open_source};
pub use parser::{DataParser, DocumentInfo};

pub use pdfdata_core::{
    CellsRange, Diagnostic, DiagnosticCode, DocumentInput, DocumentMetadata, HeadingMatcher,
    ParserOptions, ParserOptionsBuilder, PdfDataError, RowSink, Trim, sink_fn,
};
pub use pdfdata_core;
pub use pdfdata_parse;
pub use pdfdata_parse::{ContentSource, LopdfSource, MemoryPage, MemorySource, PageContent};
