//! In-memory content source.
//!
//! [`MemorySource`] holds pages of content items built in code, or loaded
//! from a JSON dump with the `serde` feature. It is the source used when
//! fragments come from somewhere other than a PDF file.

use pdfdata_core::{ContentItem, DocumentMetadata, PdfDataError};

use crate::source::{ContentSource, PageContent, check_page_number};

/// Page size used when none is given (US Letter).
pub const DEFAULT_PAGE_SIZE: (f64, f64) = (612.0, 792.0);

/// One page of a [`MemorySource`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryPage {
    #[cfg_attr(feature = "serde", serde(default = "default_width"))]
    pub width: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_height"))]
    pub height: f64,
    pub items: Vec<ContentItem>,
}

#[cfg(feature = "serde")]
fn default_width() -> f64 {
    DEFAULT_PAGE_SIZE.0
}

#[cfg(feature = "serde")]
fn default_height() -> f64 {
    DEFAULT_PAGE_SIZE.1
}

impl MemoryPage {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            width: DEFAULT_PAGE_SIZE.0,
            height: DEFAULT_PAGE_SIZE.1,
            items,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Content source over pages held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemorySource {
    #[cfg_attr(feature = "serde", serde(default))]
    pub marked: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: DocumentMetadata,
    pub pages: Vec<MemoryPage>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the document as tagged content (builder pattern).
    pub fn marked(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append a page (builder pattern).
    pub fn page_items(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Load a JSON dump of the form
    /// `{"marked": …, "metadata": …, "pages": [{"width", "height", "items"}]}`.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, crate::BackendError> {
        serde_json::from_str(json).map_err(|e| crate::BackendError::Dump(e.to_string()))
    }

    /// Read a JSON dump from any reader.
    #[cfg(feature = "serde")]
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, crate::BackendError> {
        serde_json::from_reader(reader).map_err(|e| crate::BackendError::Dump(e.to_string()))
    }
}

impl ContentSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    fn is_marked(&self) -> bool {
        self.marked
    }

    fn page(&mut self, number: usize) -> Result<PageContent, PdfDataError> {
        check_page_number(number, self.pages.len())?;
        let page = &self.pages[number - 1];
        Ok(PageContent {
            number,
            width: page.width,
            height: page.height,
            items: page.items.clone(),
            diagnostics: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfdata_core::Fragment;

    #[test]
    fn pages_are_served_by_number() {
        let mut source = MemorySource::new()
            .marked(true)
            .page_items(MemoryPage::new(vec![Fragment::new("a", 0.0, 0.0, 5.0).into()]))
            .page_items(MemoryPage::new(Vec::new()).with_size(300.0, 400.0));
        assert_eq!(source.page_count(), 2);
        assert!(source.is_marked());
        assert!(source.metadata().is_empty());

        let first = source.page(1).unwrap();
        assert_eq!(first.number, 1);
        assert_eq!((first.width, first.height), DEFAULT_PAGE_SIZE);
        assert_eq!(first.items.len(), 1);

        let second = source.page(2).unwrap();
        assert_eq!((second.width, second.height), (300.0, 400.0));

        assert!(matches!(
            source.page(3),
            Err(PdfDataError::PageOutOfRange { page: 3, page_count: 2 })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_json_dump() {
        let json = r#"{
            "marked": true,
            "metadata": {"title": "Roster"},
            "pages": [
                {"items": [
                    {"type": "beginMarkedContentProps", "tag": "P", "id": 0},
                    {"type": "text", "text": "Name", "x": 0, "y": 100, "width": 24},
                    {"type": "endMarkedContent"}
                ]}
            ]
        }"#;
        let mut source = MemorySource::from_json(json).unwrap();
        assert!(source.is_marked());
        assert_eq!(source.metadata().title.as_deref(), Some("Roster"));
        let page = source.page(1).unwrap();
        assert_eq!(page.height, 792.0);
        assert_eq!(page.fragment_count(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bad_json_is_a_dump_error() {
        let err = MemorySource::from_json("{\"pages\": 3}").unwrap_err();
        assert!(matches!(err, crate::BackendError::Dump(_)));
    }
}
