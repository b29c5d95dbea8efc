//! pdfdata-core: backend-independent table extraction.
//!
//! This crate turns a page's stream of positioned text fragments into
//! cells ([`Cell`]), groups them into rows with one of two page
//! strategies ([`PageParser`]), and assembles the rows of a table across
//! pages ([`TableAssembler`]). Decoding PDF files is left to a content
//! source such as `pdfdata-parse`.

pub mod cell;
pub mod checkpoint;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod metadata;
pub mod options;
pub mod page;
pub mod table;

pub use cell::{Alignment, Cell, CellOptions};
pub use checkpoint::{Checkpoint, Interrupted, NoCheckpoint};
pub use error::{Diagnostic, DiagnosticCode, PdfDataError};
pub use fragment::{ContentItem, DEFAULT_FONT_SIZE, Fragment, TextDirection};
pub use geometry::{BBox, Matrix};
pub use metadata::{DocumentMetadata, INFO_KEYS};
pub use options::{
    CellsRange, DEFAULT_LINE_HEIGHT, DocumentInput, HeadingMatcher, MAX_CELLS, ParserOptions,
    ParserOptionsBuilder, Trim,
};
pub use page::{PageCells, PageParser, Strategy};
pub use table::{FnSink, RowCell, RowSink, TableAssembler, compare_heading, rows_equal, sink_fn};
