//! Parser configuration.
//!
//! [`ParserOptions`] is an immutable options struct with defaults,
//! assembled directly or through the validating [`ParserOptionsBuilder`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use regex::Regex;

use crate::cell::CellOptions;
use crate::error::PdfDataError;

/// Upper bound on the number of cells in a row.
pub const MAX_CELLS: usize = 256;

/// Default font-size multiplier for line pitch and tolerances.
pub const DEFAULT_LINE_HEIGHT: f64 = 1.67;

/// Text marker bounding a table: a literal substring or a regular expression.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "HeadingRepr", into = "HeadingRepr")
)]
pub enum HeadingMatcher {
    Literal(String),
    Pattern(Regex),
}

impl HeadingMatcher {
    pub fn literal(text: impl Into<String>) -> Self {
        HeadingMatcher::Literal(text.into())
    }

    /// Compile a regular expression matcher.
    pub fn pattern(pattern: &str) -> Result<Self, PdfDataError> {
        let regex = Regex::new(pattern)
            .map_err(|e| PdfDataError::invalid_option("heading", e.to_string()))?;
        Ok(HeadingMatcher::Pattern(regex))
    }

    /// True when `text` contains the literal or matches the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            HeadingMatcher::Literal(literal) => text.contains(literal.as_str()),
            HeadingMatcher::Pattern(regex) => regex.is_match(text),
        }
    }

    /// The literal text or the pattern source.
    pub fn as_str(&self) -> &str {
        match self {
            HeadingMatcher::Literal(literal) => literal,
            HeadingMatcher::Pattern(regex) => regex.as_str(),
        }
    }
}

impl PartialEq for HeadingMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeadingMatcher::Literal(a), HeadingMatcher::Literal(b)) => a == b,
            (HeadingMatcher::Pattern(a), HeadingMatcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl FromStr for HeadingMatcher {
    type Err = PdfDataError;

    /// `/…/` is parsed as a regular expression, anything else is a literal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() >= 2 && s.starts_with('/') && s.ends_with('/') {
            HeadingMatcher::pattern(&s[1..s.len() - 1])
        } else {
            Ok(HeadingMatcher::literal(s))
        }
    }
}

impl fmt::Display for HeadingMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingMatcher::Literal(literal) => f.write_str(literal),
            HeadingMatcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum HeadingRepr {
    Literal(String),
    Pattern(String),
}

#[cfg(feature = "serde")]
impl TryFrom<HeadingRepr> for HeadingMatcher {
    type Error = PdfDataError;

    fn try_from(repr: HeadingRepr) -> Result<Self, Self::Error> {
        match repr {
            HeadingRepr::Literal(text) => Ok(HeadingMatcher::Literal(text)),
            HeadingRepr::Pattern(pattern) => HeadingMatcher::pattern(&pattern),
        }
    }
}

#[cfg(feature = "serde")]
impl From<HeadingMatcher> for HeadingRepr {
    fn from(matcher: HeadingMatcher) -> Self {
        match matcher {
            HeadingMatcher::Literal(text) => HeadingRepr::Literal(text),
            HeadingMatcher::Pattern(regex) => HeadingRepr::Pattern(regex.as_str().to_string()),
        }
    }
}

/// Accepted number of cells per row.
///
/// `heading` is the minimum for the header candidate row; it defaults to
/// `min` and has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellsRange {
    pub min: usize,
    pub max: usize,
    pub heading: usize,
}

impl Default for CellsRange {
    fn default() -> Self {
        Self {
            min: 1,
            max: MAX_CELLS,
            heading: 1,
        }
    }
}

impl CellsRange {
    /// Create a validated range; `heading` starts out equal to `min`.
    pub fn new(min: usize, max: usize) -> Result<Self, PdfDataError> {
        if min == 0 {
            return Err(PdfDataError::invalid_option("cells", "minimum must be at least 1"));
        }
        if min > max {
            return Err(PdfDataError::invalid_option(
                "cells",
                format!("minimum {min} exceeds maximum {max}"),
            ));
        }
        Ok(Self {
            min,
            max,
            heading: min,
        })
    }

    /// At least `min` cells, up to [`MAX_CELLS`].
    pub fn at_least(min: usize) -> Result<Self, PdfDataError> {
        Self::new(min, MAX_CELLS.max(min))
    }

    /// Override the header-row minimum (builder pattern).
    pub fn with_heading(mut self, heading: usize) -> Self {
        self.heading = heading;
        self
    }

    /// True when a data row with `n` cells is accepted.
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }

    /// True when a header candidate row with `n` cells is accepted.
    pub fn accepts_heading(&self, n: usize) -> bool {
        n >= self.heading
    }
}

impl FromStr for CellsRange {
    type Err = PdfDataError;

    /// Parses `"N"` (at least N cells) or `"min-max"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim().parse::<usize>().map_err(|_| {
                PdfDataError::invalid_option("cells", format!("expected N or min-max, got {s:?}"))
            })
        };
        match s.split_once('-') {
            Some((min, max)) => Self::new(parse(min)?, parse(max)?),
            None => Self::at_least(parse(s)?),
        }
    }
}

impl fmt::Display for CellsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Whitespace trimming applied to cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Trim {
    None,
    #[default]
    Both,
    Start,
    End,
}

impl Trim {
    pub fn apply<'a>(&self, text: &'a str) -> &'a str {
        match self {
            Trim::None => text,
            Trim::Both => text.trim(),
            Trim::Start => text.trim_start(),
            Trim::End => text.trim_end(),
        }
    }
}

impl FromStr for Trim {
    type Err = PdfDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "0" => Ok(Trim::None),
            "both" | "true" | "1" => Ok(Trim::Both),
            "start" | "leading" | "2" => Ok(Trim::Start),
            "end" | "trailing" | "3" => Ok(Trim::End),
            other => Err(PdfDataError::invalid_option(
                "trim",
                format!("unknown mode {other:?}"),
            )),
        }
    }
}

/// Where the document comes from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DocumentInput {
    /// Local file.
    Path(PathBuf),
    /// `file://`, `http://` or `https://` URL, or a bare path.
    Url(String),
    /// Document bytes.
    Data(Vec<u8>),
}

/// Options for a parse.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ParserOptions {
    /// Document location or bytes.
    pub input: Option<DocumentInput>,
    /// Password for an encrypted document.
    pub password: Option<String>,
    /// 1-based page numbers to process; all pages when `None`.
    pub pages: Option<Vec<usize>>,
    /// Section heading that precedes the table.
    pub heading: Option<HeadingMatcher>,
    /// Section heading that follows the table.
    pub stop_heading: Option<HeadingMatcher>,
    /// Accepted cells per row.
    pub cells: CellsRange,
    /// Keep line breaks inside cell text.
    pub newlines: bool,
    /// Height of the excluded page-top band in points.
    pub page_header: f64,
    /// Height of the excluded page-bottom band in points.
    pub page_footer: f64,
    /// The first accepted row is the header.
    pub has_header: bool,
    /// Drop later rows equal to the header.
    pub repeating_headers: bool,
    pub trim: Trim,
    /// Keep artifact-tagged content.
    pub artifacts: bool,
    /// Font-size multiplier for line pitch and tolerances.
    pub line_height: f64,
    /// Order cells by coordinates instead of emission order.
    pub order_xy: bool,
    /// Reconstruct blank cells from the header's column layout.
    pub missing_values: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            input: None,
            password: None,
            pages: None,
            heading: None,
            stop_heading: None,
            cells: CellsRange::default(),
            newlines: false,
            page_header: 0.0,
            page_footer: 0.0,
            has_header: true,
            repeating_headers: true,
            trim: Trim::Both,
            artifacts: false,
            line_height: DEFAULT_LINE_HEIGHT,
            order_xy: true,
            missing_values: false,
        }
    }
}

impl ParserOptions {
    pub fn builder() -> ParserOptionsBuilder {
        ParserOptionsBuilder::default()
    }

    /// Check invariants that the public fields cannot enforce.
    pub fn validate(&self) -> Result<(), PdfDataError> {
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(PdfDataError::invalid_option(
                "line_height",
                format!("must be positive, got {}", self.line_height),
            ));
        }
        let bands = [
            ("page_header", self.page_header),
            ("page_footer", self.page_footer),
        ];
        for (name, value) in bands {
            if !value.is_finite() || value < 0.0 {
                return Err(PdfDataError::invalid_option(
                    name,
                    format!("must be zero or positive, got {value}"),
                ));
            }
        }
        if let Some(pages) = &self.pages {
            if pages.contains(&0) {
                return Err(PdfDataError::invalid_option("pages", "page numbers start at 1"));
            }
        }
        let cells = self.cells;
        if cells.min == 0 || cells.min > cells.max {
            return Err(PdfDataError::invalid_option(
                "cells",
                format!("invalid range {cells}"),
            ));
        }
        Ok(())
    }

    /// Settings used by [`Cell`](crate::cell::Cell).
    pub fn cell_options(&self) -> CellOptions {
        CellOptions {
            line_height: self.line_height,
            newlines: self.newlines,
        }
    }
}

/// Builder for [`ParserOptions`].
///
/// Setters never fail; the first invalid value is reported by
/// [`build`](ParserOptionsBuilder::build).
#[derive(Debug, Default)]
pub struct ParserOptionsBuilder {
    options: ParserOptions,
    error: Option<PdfDataError>,
}

impl ParserOptionsBuilder {
    fn record<T>(&mut self, result: Result<T, PdfDataError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    /// Document location: a file path or a `file://` / `http(s)://` URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.input = Some(DocumentInput::Url(url.into()));
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.input = Some(DocumentInput::Path(path.into()));
        self
    }

    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.options.input = Some(DocumentInput::Data(data.into()));
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.password = Some(password.into());
        self
    }

    pub fn pages(mut self, pages: impl IntoIterator<Item = usize>) -> Self {
        self.options.pages = Some(pages.into_iter().collect());
        self
    }

    /// Table start marker, matched as a substring.
    pub fn heading(mut self, heading: impl Into<String>) -> Self {
        self.options.heading = Some(HeadingMatcher::literal(heading));
        self
    }

    /// Table start marker, matched as a regular expression.
    pub fn heading_pattern(mut self, pattern: &str) -> Self {
        self.options.heading = self.record(HeadingMatcher::pattern(pattern));
        self
    }

    /// Table end marker, matched as a substring.
    pub fn stop_heading(mut self, heading: impl Into<String>) -> Self {
        self.options.stop_heading = Some(HeadingMatcher::literal(heading));
        self
    }

    /// Table end marker, matched as a regular expression.
    pub fn stop_heading_pattern(mut self, pattern: &str) -> Self {
        self.options.stop_heading = self.record(HeadingMatcher::pattern(pattern));
        self
    }

    /// Accepted cells per row as `"N"` or `"min-max"`.
    pub fn cells(mut self, cells: &str) -> Self {
        if let Some(range) = self.record(cells.parse::<CellsRange>()) {
            self.options.cells = range;
        }
        self
    }

    pub fn cells_range(mut self, range: CellsRange) -> Self {
        self.options.cells = range;
        self
    }

    pub fn newlines(mut self, newlines: bool) -> Self {
        self.options.newlines = newlines;
        self
    }

    pub fn page_header(mut self, points: f64) -> Self {
        self.options.page_header = points;
        self
    }

    pub fn page_footer(mut self, points: f64) -> Self {
        self.options.page_footer = points;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.options.has_header = has_header;
        self
    }

    pub fn repeating_headers(mut self, repeating: bool) -> Self {
        self.options.repeating_headers = repeating;
        self
    }

    pub fn trim(mut self, trim: Trim) -> Self {
        self.options.trim = trim;
        self
    }

    pub fn artifacts(mut self, artifacts: bool) -> Self {
        self.options.artifacts = artifacts;
        self
    }

    pub fn line_height(mut self, line_height: f64) -> Self {
        self.options.line_height = line_height;
        self
    }

    pub fn order_xy(mut self, order_xy: bool) -> Self {
        self.options.order_xy = order_xy;
        self
    }

    pub fn missing_values(mut self, missing_values: bool) -> Self {
        self.options.missing_values = missing_values;
        self
    }

    /// Validate and return the options.
    pub fn build(self) -> Result<ParserOptions, PdfDataError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.options.validate()?;
        Ok(self.options)
    }
}
