//! lopdf-based content source.
//!
//! Implements [`ContentSource`] over a [`lopdf::Document`]: pages are
//! interpreted on demand into fragments and marked-content events.

use std::path::Path;
use std::sync::LazyLock;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfdata_core::{BBox, DocumentMetadata, INFO_KEYS, Matrix, PdfDataError};
use tracing::{debug, info};

use crate::error::BackendError;
use crate::interpreter::{interpret_page, stream_bytes};
use crate::source::{ContentSource, PageContent, check_page_number};

static EMPTY_RESOURCES: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);

/// A PDF document opened with lopdf.
pub struct LopdfSource {
    doc: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    metadata: DocumentMetadata,
    marked: bool,
}

impl std::fmt::Debug for LopdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfSource")
            .field("page_count", &self.page_ids.len())
            .field("marked", &self.marked)
            .finish_non_exhaustive()
    }
}

fn load(bytes: &[u8]) -> Result<Document, BackendError> {
    Document::load_mem(bytes).map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))
}

impl LopdfSource {
    /// Open an unencrypted PDF from memory.
    ///
    /// # Errors
    ///
    /// [`PdfDataError::PasswordRequired`] when the document is encrypted,
    /// a parse error when the bytes are not a readable PDF.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let doc = load(bytes)?;
        if doc.is_encrypted() {
            return Err(BackendError::Core(PdfDataError::PasswordRequired));
        }
        Ok(Self::from_document(doc))
    }

    /// Open a PDF from memory, decrypting it with `password` if needed.
    /// The password is ignored for unencrypted documents.
    pub fn open_with_password(bytes: &[u8], password: &[u8]) -> Result<Self, BackendError> {
        let mut doc = load(bytes)?;
        if doc.is_encrypted() {
            doc.decrypt_raw(password).map_err(|e| {
                let msg = e.to_string();
                if msg.contains("incorrect") || msg.contains("password") {
                    BackendError::Core(PdfDataError::InvalidPassword)
                } else {
                    BackendError::Parse(format!("decryption failed: {e}"))
                }
            })?;
        }
        Ok(Self::from_document(doc))
    }

    /// Read and open a file.
    pub fn open_file(
        path: impl AsRef<Path>,
        password: Option<&[u8]>,
    ) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path.as_ref())?;
        match password {
            Some(password) => Self::open_with_password(&bytes, password),
            None => Self::open(&bytes),
        }
    }

    fn from_document(doc: Document) -> Self {
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        let metadata = read_metadata(&doc);
        let marked = catalog(&doc)
            .and_then(|c| c.get(b"MarkInfo").ok())
            .map(|o| resolve(&doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"Marked").ok())
            .and_then(|o| o.as_bool().ok())
            .unwrap_or(false);
        info!(pages = page_ids.len(), marked, "opened PDF document");
        Self {
            doc,
            page_ids,
            metadata,
            marked,
        }
    }

    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    fn load_page(&self, number: usize) -> Result<PageContent, BackendError> {
        let page_id = self.page_ids[number - 1];
        let media_box = media_box(&self.doc, page_id)?;
        let resources = page_resources(&self.doc, page_id)?;
        let page_dict = self
            .doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        let content = page_content(&self.doc, page_dict)?;

        let ctm = Matrix::translation(-media_box.x1, -media_box.y1);
        let out = interpret_page(&self.doc, number, &content, resources, ctm)?;
        debug!(page = number, items = out.items.len(), "loaded page");
        Ok(PageContent {
            number,
            width: media_box.width(),
            height: media_box.height(),
            items: out.items,
            diagnostics: out.diagnostics,
        })
    }
}

impl ContentSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    fn is_marked(&self) -> bool {
        self.marked
    }

    fn page(&mut self, number: usize) -> Result<PageContent, PdfDataError> {
        check_page_number(number, self.page_ids.len())?;
        Ok(self.load_page(number)?)
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn catalog(doc: &Document) -> Option<&Dictionary> {
    doc.trailer
        .get(b"Root")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
}

fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(f64::from(*f)),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Look up a page attribute, walking up `/Parent` links.
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current = page_id;
    loop {
        let dict = doc
            .get_object(current)
            .and_then(Object::as_dict)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                current = parent
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<BBox, BackendError> {
    let obj = inherited(doc, page_id, b"MediaBox")?
        .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
    let array = resolve(doc, obj)
        .as_array()
        .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element MediaBox, got {}",
            array.len()
        )));
    }
    let v = array
        .iter()
        .map(|o| object_to_f64(resolve(doc, o)))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(BBox::new(
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ))
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    match inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve(doc, obj)
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_RESOURCES),
    }
}

/// Concatenated content streams of a page.
fn page_content(doc: &Document, page: &Dictionary) -> Result<Vec<u8>, BackendError> {
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    let streams: Vec<&Object> = match resolve(doc, contents) {
        Object::Array(items) => items.iter().map(|o| resolve(doc, o)).collect(),
        other => vec![other],
    };
    let mut content = Vec::new();
    for obj in streams {
        let stream = obj
            .as_stream()
            .map_err(|e| BackendError::Parse(format!("/Contents is not a stream: {e}")))?;
        if !content.is_empty() {
            content.push(b'\n');
        }
        content.extend(stream_bytes(stream)?);
    }
    Ok(content)
}

/// Text string per PDF rules: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn read_metadata(doc: &Document) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::default();
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return metadata;
    };
    for key in INFO_KEYS {
        let value = match info.get(key.as_bytes()).map(|o| resolve(doc, o)) {
            Ok(Object::String(bytes, _)) => decode_text_string(bytes),
            Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            _ => continue,
        };
        metadata.set_entry(key, value);
    }
    metadata
}
