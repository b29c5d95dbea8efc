//! Document loading from a path, URL or bytes.

use std::path::Path;

use pdfdata_core::{DocumentInput, PdfDataError};
use pdfdata_parse::{ContentSource, LopdfSource};
use tracing::info;

/// Content source owned by a parser.
pub type BoxedSource = Box<dyn ContentSource>;

/// Open the document named by `input`.
///
/// # Errors
///
/// [`PdfDataError::IoError`] when the document cannot be read,
/// [`PdfDataError::PasswordRequired`] / [`PdfDataError::InvalidPassword`]
/// for encrypted documents, and [`PdfDataError::InvalidOption`] for URLs
/// with an unsupported scheme.
pub fn open_source(
    input: &DocumentInput,
    password: Option<&str>,
) -> Result<BoxedSource, PdfDataError> {
    let bytes = match input {
        DocumentInput::Data(bytes) => {
            return open_bytes(bytes, password);
        }
        DocumentInput::Path(path) => read_file(path)?,
        DocumentInput::Url(url) => read_url(url)?,
    };
    open_bytes(&bytes, password)
}

fn open_bytes(bytes: &[u8], password: Option<&str>) -> Result<BoxedSource, PdfDataError> {
    let source = match password {
        Some(password) => LopdfSource::open_with_password(bytes, password.as_bytes())?,
        None => LopdfSource::open(bytes)?,
    };
    Ok(Box::new(source))
}

fn read_file(path: &Path) -> Result<Vec<u8>, PdfDataError> {
    info!(path = %path.display(), "reading document");
    std::fs::read(path).map_err(|e| PdfDataError::IoError(format!("{}: {e}", path.display())))
}

fn read_url(url: &str) -> Result<Vec<u8>, PdfDataError> {
    if let Some(path) = url.strip_prefix("file://") {
        return read_file(Path::new(path));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return fetch(url);
    }
    if let Some((scheme, _)) = url.split_once("://") {
        return Err(PdfDataError::invalid_option(
            "url",
            format!("unsupported scheme `{scheme}`"),
        ));
    }
    read_file(Path::new(url))
}

#[cfg(feature = "http")]
fn fetch(url: &str) -> Result<Vec<u8>, PdfDataError> {
    info!(url, "fetching document");
    let response = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|e| PdfDataError::IoError(format!("{url}: {e}")))?;
    let bytes = response
        .bytes()
        .map_err(|e| PdfDataError::IoError(format!("{url}: {e}")))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "http"))]
fn fetch(url: &str) -> Result<Vec<u8>, PdfDataError> {
    Err(PdfDataError::invalid_option(
        "url",
        format!("{url}: http(s) input requires the `http` feature"),
    ))
}
