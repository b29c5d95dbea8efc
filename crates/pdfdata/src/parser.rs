//! Parser controller.
//!
//! [`DataParser`] opens a document, walks the pages in scope in order,
//! runs the page strategy chosen for the document and feeds the cells to
//! the table assembler, honouring pause and cancel requests between pages,
//! at cell flushes and before each row is emitted.

use std::collections::BTreeSet;

use pdfdata_core::{
    Checkpoint, Diagnostic, DiagnosticCode, DocumentMetadata, PageParser, ParserOptions,
    PdfDataError, RowSink, Strategy, TableAssembler,
};
use pdfdata_parse::ContentSource;
use tracing::{debug, info, warn};

use crate::control::{ParseControl, ParserState};
use crate::input::{BoxedSource, open_source};

/// Document facts available before parsing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentInfo {
    pub page_count: usize,
    pub metadata: DocumentMetadata,
    /// The document declares tagged content; the marked-content strategy is used.
    pub marked: bool,
}

/// Extracts the rows of one table from one document.
///
/// A parser runs once. Rows are returned from [`parse`](Self::parse), or
/// delivered to the sink given to [`with_sink`](Self::with_sink) as they
/// are produced.
///
/// # Example
///
/// ```ignore
/// let options = ParserOptions::builder()
///     .path("results.pdf")
///     .heading("Votes by Party")
///     .cells("3-5")
///     .build()?;
/// let rows = DataParser::new(options)?.parse()?;
/// ```
pub struct DataParser {
    options: ParserOptions,
    source: Option<BoxedSource>,
    info: Option<DocumentInfo>,
    sink: Option<Box<dyn RowSink>>,
    control: ParseControl,
    diagnostics: Vec<Diagnostic>,
    started: bool,
}

impl std::fmt::Debug for DataParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataParser")
            .field("state", &self.state())
            .field("info", &self.info)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

impl DataParser {
    /// Create a parser for validated options.
    ///
    /// # Errors
    ///
    /// [`PdfDataError::InvalidOption`] when the options are inconsistent.
    pub fn new(options: ParserOptions) -> Result<Self, PdfDataError> {
        options.validate()?;
        Ok(Self {
            options,
            source: None,
            info: None,
            sink: None,
            control: ParseControl::new(),
            diagnostics: Vec::new(),
            started: false,
        })
    }

    /// Read pages from `source` instead of opening `options.input`.
    pub fn with_source(mut self, source: impl ContentSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self.info = None;
        self
    }

    /// Deliver rows to `sink` as they are produced.
    pub fn with_sink(mut self, sink: impl RowSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Handle for pausing, resuming or cancelling from another thread.
    pub fn control(&self) -> ParseControl {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn state(&self) -> ParserState {
        self.control.state()
    }

    /// Non-fatal issues collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Open the document (if not yet open) and describe it.
    ///
    /// # Errors
    ///
    /// [`PdfDataError::NoInput`] when neither a source nor an input is
    /// configured, otherwise any error from loading the document.
    pub fn open(&mut self) -> Result<DocumentInfo, PdfDataError> {
        if let Some(info) = &self.info {
            return Ok(info.clone());
        }
        if self.source.is_none() {
            let input = self.options.input.as_ref().ok_or(PdfDataError::NoInput)?;
            self.source = Some(open_source(input, self.options.password.as_deref())?);
        }
        let Some(source) = self.source.as_ref() else {
            return Err(PdfDataError::NoInput);
        };
        let info = DocumentInfo {
            page_count: source.page_count(),
            metadata: source.metadata().clone(),
            marked: source.is_marked(),
        };
        info!(pages = info.page_count, marked = info.marked, "document opened");
        self.info = Some(info.clone());
        Ok(info)
    }

    /// 1-based pages to process, ascending and without duplicates.
    fn pages_in_scope(&mut self, page_count: usize) -> Vec<usize> {
        let Some(requested) = &self.options.pages else {
            return (1..=page_count).collect();
        };
        let mut pages = BTreeSet::new();
        for &number in requested {
            if (1..=page_count).contains(&number) {
                pages.insert(number);
            } else {
                let description =
                    format!("page {number} is outside the document (1..={page_count})");
                warn!(page = number, "{description}");
                self.diagnostics.push(
                    Diagnostic::new(DiagnosticCode::PageSkipped, description).on_page(number),
                );
            }
        }
        pages.into_iter().collect()
    }

    /// Run the parse to completion, cancellation or the stop heading.
    ///
    /// Returns the rows produced, or an empty vector when a sink was
    /// configured. Cancellation is not an error: the rows produced before
    /// the cancel are returned.
    ///
    /// # Errors
    ///
    /// [`PdfDataError::AlreadyStarted`] on a second call, otherwise any
    /// error from opening the document or reading a page.
    pub fn parse(&mut self) -> Result<Vec<Vec<String>>, PdfDataError> {
        if self.started {
            return Err(PdfDataError::AlreadyStarted);
        }
        self.started = true;
        let mut rows = Vec::new();
        if self.control.is_cancelled() {
            self.source = None;
            return Ok(rows);
        }

        let info = match self.open() {
            Ok(info) => info,
            Err(e) => {
                self.source = None;
                self.control.set_state(ParserState::Finished);
                return Err(e);
            }
        };
        let pages = self.pages_in_scope(info.page_count);
        let Some(mut source) = self.source.take() else {
            return Err(PdfDataError::NoInput);
        };
        self.control.set_state(ParserState::Started);

        let strategy = Strategy::for_document(info.marked);
        debug!(?strategy, pages = pages.len(), "starting parse");
        let page_parser = PageParser::new(strategy, &self.options);
        let mut table = TableAssembler::new(&self.options);
        let sink: &mut dyn RowSink = match self.sink.as_mut() {
            Some(sink) => sink.as_mut(),
            None => &mut rows,
        };
        let mut emitted = 0;

        for number in pages {
            if self.control.check().is_err() {
                break;
            }
            let page = match source.page(number) {
                Ok(page) => page,
                Err(e) => {
                    self.control.set_state(ParserState::Finished);
                    return Err(e);
                }
            };
            self.diagnostics.extend(page.diagnostics);
            let Ok(cells) = page_parser.parse(number, &page.items, &self.control) else {
                break;
            };
            self.diagnostics.extend(cells.diagnostics);

            table.begin_page(page.height);
            for cell in cells.cells {
                table.insert_cell(cell);
            }
            match table.process_cells(sink, &self.control) {
                Ok(n) => emitted += n,
                Err(_) => break,
            }
            debug!(page = number, emitted, "page done");
            if table.table_done() {
                self.control.set_state(ParserState::TableDone);
                break;
            }
        }
        drop(source);

        if self.control.state() == ParserState::Started {
            self.control.set_state(ParserState::Finished);
        }
        info!(rows = emitted, state = ?self.control.state(), "parse finished");
        Ok(rows)
    }
}
