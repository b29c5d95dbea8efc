//! Page parsing: turning one page's content stream into cells.
//!
//! Two strategies are available. [`Strategy::Marked`] follows the
//! document's structure tags (paragraphs and spans); [`Strategy::Lined`]
//! relies on geometry and end-of-line flags only. Both produce cells in
//! emission order with a page-local row index.

mod lined;
mod marked;

use tracing::{debug, trace, warn};

use crate::cell::{Alignment, Cell, CellOptions};
use crate::checkpoint::{Checkpoint, Interrupted};
use crate::error::{Diagnostic, DiagnosticCode};
use crate::fragment::{ContentItem, Fragment, TextDirection};
use crate::geometry::BBox;
use crate::options::ParserOptions;

/// How fragments are grouped into cells and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Strategy {
    /// Structure-tag driven.
    Marked,
    /// Geometry driven.
    Lined,
}

impl Strategy {
    /// Marked when the document declares tagged content.
    pub fn for_document(marked: bool) -> Self {
        if marked {
            Strategy::Marked
        } else {
            Strategy::Lined
        }
    }
}

/// Cells of one page plus the issues found while building them.
#[derive(Debug, Clone, Default)]
pub struct PageCells {
    pub cells: Vec<Cell>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PageCells {
    /// Cell texts grouped by row index.
    pub fn rows(&self) -> Vec<Vec<&str>> {
        let mut rows: Vec<Vec<&str>> = Vec::new();
        for cell in &self.cells {
            while rows.len() <= cell.row() {
                rows.push(Vec::new());
            }
            rows[cell.row()].push(cell.text());
        }
        rows.retain(|row| !row.is_empty());
        rows
    }
}

/// Per-document page parser.
#[derive(Debug, Clone)]
pub struct PageParser {
    strategy: Strategy,
    cell_options: CellOptions,
    artifacts: bool,
}

impl PageParser {
    pub fn new(strategy: Strategy, options: &ParserOptions) -> Self {
        Self {
            strategy,
            cell_options: options.cell_options(),
            artifacts: options.artifacts,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Build the cells of one page.
    ///
    /// `checkpoint` is consulted before every cell flush.
    pub fn parse(
        &self,
        page_number: usize,
        items: &[ContentItem],
        checkpoint: &dyn Checkpoint,
    ) -> Result<PageCells, Interrupted> {
        debug!(page = page_number, strategy = ?self.strategy, items = items.len(), "parsing page");
        let mut builder = RowBuilder::new(self.cell_options, checkpoint, page_number);
        match self.strategy {
            Strategy::Marked => marked::parse(&mut builder, items, self.artifacts)?,
            Strategy::Lined => lined::parse(&mut builder, items, self.artifacts)?,
        }
        builder.finish()
    }
}

/// Shared cell/row bookkeeping for both strategies.
pub(crate) struct RowBuilder<'a> {
    options: CellOptions,
    checkpoint: &'a dyn Checkpoint,
    page: usize,
    current: Cell,
    row: usize,
    row_len: usize,
    cells: Vec<Cell>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RowBuilder<'a> {
    fn new(options: CellOptions, checkpoint: &'a dyn Checkpoint, page: usize) -> Self {
        Self {
            options,
            checkpoint,
            page,
            current: Cell::new(options),
            row: 0,
            row_len: 0,
            cells: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn is_adjacent(&self, fragment: &Fragment) -> bool {
        self.current.is_adjacent(fragment)
    }

    pub(crate) fn alignment(&self, fragment: &Fragment) -> Alignment {
        self.current.alignment(fragment)
    }

    pub(crate) fn add(&mut self, fragment: &Fragment) {
        self.current.add_item(fragment);
    }

    pub(crate) fn row_is_empty(&self) -> bool {
        self.row_len == 0
    }

    /// Move the open cell into the current row. Returns its box, or
    /// `None` when the cell was empty.
    pub(crate) fn flush_cell(&mut self) -> Result<Option<BBox>, Interrupted> {
        if self.current.is_empty() {
            return Ok(None);
        }
        self.checkpoint.check()?;
        let mut cell = std::mem::replace(&mut self.current, Cell::new(self.options));
        cell.set_row(self.row);
        trace!(page = self.page, row = self.row, text = cell.text(), "cell");
        let bbox = cell.bbox();
        self.cells.push(cell);
        self.row_len += 1;
        Ok(Some(bbox))
    }

    /// Close the current row if it holds any cell.
    pub(crate) fn end_row(&mut self) {
        if self.row_len > 0 {
            trace!(page = self.page, row = self.row, cells = self.row_len, "row");
            self.row += 1;
            self.row_len = 0;
        }
    }

    pub(crate) fn diagnose(&mut self, code: DiagnosticCode, description: String) {
        let diagnostic = Diagnostic::new(code, description).on_page(self.page);
        warn!(%diagnostic, "page diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Flag fragments that are not laid out left to right.
    pub(crate) fn check_direction(&mut self, fragment: &Fragment) {
        if fragment.direction != TextDirection::Ltr {
            self.diagnose(
                DiagnosticCode::NonLtrText,
                format!(
                    "{} text {:?} at ({:.1}, {:.1})",
                    fragment.direction.as_str(),
                    fragment.text,
                    fragment.x,
                    fragment.y
                ),
            );
        }
    }

    fn finish(mut self) -> Result<PageCells, Interrupted> {
        self.flush_cell()?;
        self.end_row();
        Ok(PageCells {
            cells: self.cells,
            diagnostics: self.diagnostics,
        })
    }
}

/// True when a fragment should be skipped as artifact content.
pub(crate) fn skip_artifact(fragment: &Fragment, in_artifact: bool, keep_artifacts: bool) -> bool {
    (in_artifact || fragment.artifact) && !keep_artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::NoCheckpoint;

    #[test]
    fn strategy_for_document() {
        assert_eq!(Strategy::for_document(true), Strategy::Marked);
        assert_eq!(Strategy::for_document(false), Strategy::Lined);
    }

    #[test]
    fn empty_page_has_no_cells() {
        let parser = PageParser::new(Strategy::Lined, &ParserOptions::default());
        let page = parser.parse(1, &[], &NoCheckpoint).unwrap();
        assert!(page.cells.is_empty());
        assert!(page.diagnostics.is_empty());
    }

    #[test]
    fn row_builder_skips_empty_cells_and_rows() {
        let checkpoint = NoCheckpoint;
        let mut builder = RowBuilder::new(CellOptions::default(), &checkpoint, 1);
        assert_eq!(builder.flush_cell().unwrap(), None);
        builder.end_row();
        builder.add(&Fragment::new("a", 0.0, 10.0, 6.0));
        assert!(builder.flush_cell().unwrap().is_some());
        builder.end_row();
        builder.end_row();
        builder.add(&Fragment::new("b", 0.0, 0.0, 6.0));
        let page = builder.finish().unwrap();
        assert_eq!(page.rows(), vec![vec!["a"], vec!["b"]]);
        assert_eq!(page.cells[1].row(), 1);
    }

    #[test]
    fn skip_artifact_rules() {
        let plain = Fragment::new("1", 0.0, 0.0, 6.0);
        let artifact = Fragment::new("1", 0.0, 0.0, 6.0).as_artifact();
        assert!(!skip_artifact(&plain, false, false));
        assert!(skip_artifact(&plain, true, false));
        assert!(skip_artifact(&artifact, false, false));
        assert!(!skip_artifact(&artifact, false, true));
    }
}
