//! Table assembly across pages.
//!
//! [`TableAssembler`] collects the cells of each page, groups them into
//! rows and runs every row through the table filters before handing it
//! to a [`RowSink`]. Its state (header row, heading and stop-heading
//! flags) spans the whole document.

use std::sync::mpsc;

use tracing::{debug, info, trace};

use crate::cell::Cell;
use crate::checkpoint::{Checkpoint, Interrupted};
use crate::options::{CellsRange, HeadingMatcher, ParserOptions, Trim};

/// Receiver of finished rows.
pub trait RowSink {
    fn emit(&mut self, row: Vec<String>);
}

impl RowSink for Vec<Vec<String>> {
    fn emit(&mut self, row: Vec<String>) {
        self.push(row);
    }
}

impl RowSink for mpsc::Sender<Vec<String>> {
    fn emit(&mut self, row: Vec<String>) {
        if self.send(row).is_err() {
            debug!("row receiver dropped");
        }
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn emit(&mut self, row: Vec<String>) {
        (**self).emit(row);
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn emit(&mut self, row: Vec<String>) {
        (**self).emit(row);
    }
}

/// [`RowSink`] backed by a closure, see [`sink_fn`].
#[derive(Debug, Clone)]
pub struct FnSink<F>(F);

/// Wrap a closure as a [`RowSink`].
pub fn sink_fn<F: FnMut(Vec<String>)>(f: F) -> FnSink<F> {
    FnSink(f)
}

impl<F: FnMut(Vec<String>)> RowSink for FnSink<F> {
    fn emit(&mut self, row: Vec<String>) {
        (self.0)(row);
    }
}

/// A cell as seen by the row filters: trimmed text and horizontal extent.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCell {
    pub text: String,
    pub x1: f64,
    pub x2: f64,
}

impl RowCell {
    fn center(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    fn overlap(&self, other: &RowCell) -> f64 {
        (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0)
    }
}

/// True when the row's cell texts, joined by spaces, match `heading`.
pub fn compare_heading(row: &[RowCell], heading: &HeadingMatcher) -> bool {
    let joined = row
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    heading.is_match(&joined)
}

/// True when both rows have the same cell texts.
pub fn rows_equal(row1: &[RowCell], row2: &[RowCell]) -> bool {
    row1.len() == row2.len() && row1.iter().zip(row2).all(|(a, b)| a.text == b.text)
}

/// Place each cell of `row` under the header column it overlaps most,
/// or the nearest one by centre, and fill the other columns with blanks.
fn reconstruct(row: &[RowCell], header: &[RowCell]) -> Vec<String> {
    let mut slots: Vec<Option<String>> = vec![None; header.len()];
    let mut overflow = Vec::new();

    for cell in row {
        let overlapping = header
            .iter()
            .enumerate()
            .map(|(i, h)| (i, cell.overlap(h)))
            .filter(|(_, overlap)| *overlap > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        let column = overlapping.or_else(|| {
            header
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    let da = (a.1.center() - cell.center()).abs();
                    let db = (b.1.center() - cell.center()).abs();
                    da.total_cmp(&db)
                })
                .map(|(i, _)| i)
        });
        let free = column.and_then(|col| {
            (col..slots.len())
                .find(|&i| slots[i].is_none())
                .or_else(|| (0..col).rev().find(|&i| slots[i].is_none()))
        });
        match free {
            Some(i) => slots[i] = Some(cell.text.clone()),
            None => overflow.push(cell.text.clone()),
        }
    }

    slots
        .into_iter()
        .map(Option::unwrap_or_default)
        .chain(overflow)
        .collect()
}

/// Cross-page table state machine.
#[derive(Debug)]
pub struct TableAssembler {
    cells_range: CellsRange,
    heading: Option<HeadingMatcher>,
    stop_heading: Option<HeadingMatcher>,
    has_header: bool,
    repeating_headers: bool,
    trim: Trim,
    order_xy: bool,
    missing_values: bool,
    page_header: f64,
    page_footer: f64,
    header_y: f64,
    footer_y: f64,
    cells: Vec<Cell>,
    header: Option<Vec<RowCell>>,
    heading_found: bool,
    table_found: bool,
    table_done: bool,
}

impl TableAssembler {
    pub fn new(options: &ParserOptions) -> Self {
        Self {
            cells_range: options.cells,
            heading: options.heading.clone(),
            stop_heading: options.stop_heading.clone(),
            has_header: options.has_header,
            repeating_headers: options.repeating_headers,
            trim: options.trim,
            order_xy: options.order_xy,
            missing_values: options.missing_values,
            page_header: options.page_header,
            page_footer: options.page_footer,
            header_y: f64::INFINITY,
            footer_y: f64::NEG_INFINITY,
            cells: Vec::new(),
            header: None,
            heading_found: options.heading.is_none(),
            table_found: false,
            table_done: false,
        }
    }

    /// Reset page storage and compute the exclusion bands for a page.
    pub fn begin_page(&mut self, height: f64) {
        self.cells.clear();
        self.header_y = height - self.page_header;
        self.footer_y = self.page_footer;
    }

    /// Store a cell in reading order, dropping blank cells and cells
    /// inside the header or footer band.
    pub fn insert_cell(&mut self, cell: Cell) {
        if cell.text().trim().is_empty() {
            return;
        }
        if self.page_header > 0.0 && cell.top_baseline() >= self.header_y {
            trace!(text = cell.text(), "cell in page header band");
            return;
        }
        if self.page_footer > 0.0 && cell.bbox().y1 < self.footer_y {
            trace!(text = cell.text(), "cell in page footer band");
            return;
        }
        if !self.order_xy {
            self.cells.push(cell);
            return;
        }
        let mut at = self.cells.len();
        while at > 0 && precedes(&cell, &self.cells[at - 1]) {
            at -= 1;
        }
        self.cells.insert(at, cell);
    }

    /// Cells stored for the current page.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Group the stored cells into rows and emit the accepted ones.
    /// Returns the number of rows emitted.
    ///
    /// `checkpoint` is consulted before every row reaches the sink; an
    /// interrupted page emits nothing further.
    pub fn process_cells(
        &mut self,
        sink: &mut dyn RowSink,
        checkpoint: &dyn Checkpoint,
    ) -> Result<usize, Interrupted> {
        let cells = std::mem::take(&mut self.cells);
        let mut emitted = 0;
        for row in self.group_rows(&cells) {
            if self.table_done {
                break;
            }
            if self.filters(&row) {
                checkpoint.check()?;
                self.output(row, sink);
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    fn group_rows(&self, cells: &[Cell]) -> Vec<Vec<RowCell>> {
        let mut rows: Vec<Vec<RowCell>> = Vec::new();
        let mut anchor: Option<&Cell> = None;
        for cell in cells {
            let same_row = anchor.is_some_and(|a| {
                if self.order_xy {
                    same_line(a, cell)
                } else {
                    a.row() == cell.row()
                }
            });
            let row_cell = RowCell {
                text: self.trim.apply(cell.text()).to_string(),
                x1: cell.bbox().x1,
                x2: cell.bbox().x2,
            };
            match rows.last_mut() {
                Some(row) if same_row => row.push(row_cell),
                _ => {
                    rows.push(vec![row_cell]);
                    anchor = Some(cell);
                }
            }
        }
        if self.order_xy {
            // Insertion order only approximates x order once baselines drift.
            for row in &mut rows {
                row.sort_by(|a, b| a.x1.total_cmp(&b.x1));
            }
        }
        rows
    }

    /// Decide whether a row belongs to the table output.
    pub fn filters(&mut self, row: &[RowCell]) -> bool {
        if self.table_done {
            return false;
        }

        if !self.heading_found {
            if let Some(heading) = &self.heading {
                if compare_heading(row, heading) {
                    debug!(heading = %heading, "table heading found");
                    self.heading_found = true;
                }
            }
            return false;
        }

        if let Some(stop) = &self.stop_heading {
            if compare_heading(row, stop) {
                info!(stop_heading = %stop, "table stop heading found");
                self.table_done = true;
                return false;
            }
        }

        let header_candidate = self.has_header && self.header.is_none();
        let in_range = if header_candidate {
            self.cells_range.accepts_heading(row.len())
        } else {
            self.cells_range.contains(row.len())
        };
        if !in_range {
            trace!(cells = row.len(), range = %self.cells_range, "row outside cell range");
            return false;
        }

        if header_candidate {
            debug!(cells = row.len(), "header row captured");
            self.header = Some(row.to_vec());
            self.table_found = true;
            return true;
        }

        if self.repeating_headers {
            if let Some(header) = &self.header {
                if rows_equal(row, header) {
                    trace!("repeated header row dropped");
                    return false;
                }
            }
        }

        self.table_found = true;
        true
    }

    /// Forward an accepted row to the sink, reconstructing blank cells
    /// against the header when enabled.
    pub fn output(&self, row: Vec<RowCell>, sink: &mut dyn RowSink) {
        let texts = match &self.header {
            Some(header) if self.missing_values && !rows_equal(&row, header) => {
                reconstruct(&row, header)
            }
            _ => row.into_iter().map(|c| c.text).collect(),
        };
        sink.emit(texts);
    }

    pub fn header_row(&self) -> Option<&[RowCell]> {
        self.header.as_deref()
    }

    pub fn heading_found(&self) -> bool {
        self.heading_found
    }

    pub fn table_found(&self) -> bool {
        self.table_found
    }

    /// The stop heading was seen; later rows are discarded.
    pub fn table_done(&self) -> bool {
        self.table_done
    }
}

fn line_tolerance(a: &Cell, b: &Cell) -> f64 {
    a.tolerance().max(b.tolerance())
}

fn same_line(a: &Cell, b: &Cell) -> bool {
    (a.top_baseline() - b.top_baseline()).abs() <= line_tolerance(a, b)
}

/// Reading order: higher lines first, then left to right.
fn precedes(a: &Cell, b: &Cell) -> bool {
    if same_line(a, b) {
        a.bbox().x1 < b.bbox().x1
    } else {
        a.top_baseline() > b.top_baseline()
    }
}
