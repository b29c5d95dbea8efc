//! Content source trait.
//!
//! Defines the [`ContentSource`] trait that supplies documents to the
//! table extractor as streams of positioned text fragments, one page at
//! a time.

use pdfdata_core::{ContentItem, Diagnostic, DocumentMetadata, PdfDataError};

/// One page's content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// 1-based page number.
    pub number: usize,
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    /// Fragments and marked-content events in content-stream order.
    pub items: Vec<ContentItem>,
    /// Non-fatal issues found while reading the page.
    pub diagnostics: Vec<Diagnostic>,
}

impl PageContent {
    /// Number of text fragments on the page.
    pub fn fragment_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ContentItem::Text(_)))
            .count()
    }
}

/// Trait abstracting where page fragments come from.
///
/// A source reports document-level facts up front and produces each page
/// on demand, so only one page needs to be held in memory at a time.
///
/// # Usage
///
/// ```ignore
/// let mut source = LopdfSource::open(&bytes)?;
/// for number in 1..=source.page_count() {
///     let page = source.page(number)?;
///     println!("{} items", page.items.len());
/// }
/// ```
pub trait ContentSource {
    /// Return the number of pages in the document.
    fn page_count(&self) -> usize;

    /// Document information dictionary.
    fn metadata(&self) -> &DocumentMetadata;

    /// Whether the document declares tagged (marked) content.
    fn is_marked(&self) -> bool;

    /// Load a page by 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`PdfDataError::PageOutOfRange`] for numbers outside
    /// `1..=page_count()`, or a parse error when the page is malformed.
    fn page(&mut self, number: usize) -> Result<PageContent, PdfDataError>;
}

impl<S: ContentSource + ?Sized> ContentSource for Box<S> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn metadata(&self) -> &DocumentMetadata {
        (**self).metadata()
    }

    fn is_marked(&self) -> bool {
        (**self).is_marked()
    }

    fn page(&mut self, number: usize) -> Result<PageContent, PdfDataError> {
        (**self).page(number)
    }
}

/// Check a 1-based page number against the page count.
pub fn check_page_number(number: usize, page_count: usize) -> Result<(), PdfDataError> {
    if number == 0 || number > page_count {
        return Err(PdfDataError::PageOutOfRange {
            page: number,
            page_count,
        });
    }
    Ok(())
}
