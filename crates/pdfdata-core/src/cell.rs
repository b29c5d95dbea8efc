//! Cell accumulator.
//!
//! A [`Cell`] merges adjacent [`Fragment`]s into one logical table cell
//! and answers the geometric questions the page strategies ask when
//! deciding where cells and rows end.

use crate::fragment::Fragment;
use crate::geometry::BBox;

/// Settings that control how fragments merge into a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOptions {
    /// Font-size multiplier giving the expected line pitch.
    pub line_height: f64,
    /// Join wrapped lines with `'\n'` instead of a space.
    pub newlines: bool,
}

impl Default for CellOptions {
    fn default() -> Self {
        Self {
            line_height: 1.67,
            newlines: false,
        }
    }
}

/// How a fragment lines up with a cell (lined strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alignment {
    /// Baseline within tolerance of the cell's topmost baseline.
    pub top: bool,
    /// Left edge within tolerance of the cell's left edge.
    pub left: bool,
    /// Right edge within tolerance of the cell's right edge.
    pub right: bool,
    /// Fragment continues the cell on its line or the line directly below.
    pub adjacent: bool,
}

/// One or more fragments merged into a single table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    bbox: BBox,
    text: String,
    count: usize,
    top_baseline: f64,
    last_baseline: f64,
    font_size: f64,
    ended_line: bool,
    row: usize,
    options: CellOptions,
}

impl Cell {
    pub fn new(options: CellOptions) -> Self {
        Self {
            bbox: BBox::default(),
            text: String::new(),
            count: 0,
            top_baseline: 0.0,
            last_baseline: 0.0,
            font_size: 0.0,
            ended_line: false,
            row: 0,
            options,
        }
    }

    /// Union of all absorbed fragment extents.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of absorbed fragments.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Baseline of the cell's topmost line.
    pub fn top_baseline(&self) -> f64 {
        self.top_baseline
    }

    /// Baseline of the most recently absorbed fragment.
    pub fn last_baseline(&self) -> f64 {
        self.last_baseline
    }

    /// Largest font size among absorbed fragments.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Page-local row index assigned by the page parser.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    /// Vertical and horizontal slack: `font_size * (line_height - 1)`.
    pub fn tolerance(&self) -> f64 {
        self.font_size * (self.options.line_height - 1.0)
    }

    /// Expected distance between consecutive baselines.
    pub fn line_pitch(&self) -> f64 {
        self.font_size * self.options.line_height
    }

    /// Absorb a fragment, extending the bounding box and text.
    pub fn add_item(&mut self, fragment: &Fragment) {
        let extent = fragment.bbox();
        if self.count == 0 {
            self.bbox = extent;
            self.text.push_str(&fragment.text);
            self.top_baseline = fragment.y;
            self.last_baseline = fragment.y;
            self.font_size = fragment.font_size();
        } else {
            let new_line =
                self.ended_line || self.last_baseline - fragment.y > self.tolerance();
            if new_line {
                if self.options.newlines {
                    self.text.push('\n');
                } else if !self.text.ends_with(' ') && !fragment.text.starts_with(' ') {
                    self.text.push(' ');
                }
            }
            self.text.push_str(&fragment.text);
            self.bbox = self.bbox.union(&extent);
            self.top_baseline = self.top_baseline.max(fragment.y);
            self.last_baseline = fragment.y;
            self.font_size = self.font_size.max(fragment.font_size());
        }
        self.ended_line = fragment.has_eol;
        self.count += 1;
    }

    /// Marked-content adjacency: the fragment starts at the cell's right
    /// edge on the cell's current line.
    pub fn is_adjacent(&self, fragment: &Fragment) -> bool {
        if self.count == 0 {
            return false;
        }
        let tol = self.tolerance();
        (fragment.x - self.bbox.x2).abs() <= tol
            && (fragment.y - self.last_baseline).abs() <= tol
    }

    /// Lined-mode alignment flags for a fragment against this cell.
    pub fn alignment(&self, fragment: &Fragment) -> Alignment {
        if self.count == 0 {
            return Alignment::default();
        }
        let tol = self.tolerance();
        let gap = fragment.x - self.bbox.x2;
        let dy = self.last_baseline - fragment.y;
        Alignment {
            top: (fragment.y - self.top_baseline).abs() <= tol,
            left: (fragment.x - self.bbox.x1).abs() <= tol,
            right: (fragment.x2() - self.bbox.x2).abs() <= tol,
            adjacent: gap < tol
                && fragment.x >= self.bbox.x1 - tol
                && dy >= -tol
                && dy <= self.line_pitch() + tol,
        }
    }
}
