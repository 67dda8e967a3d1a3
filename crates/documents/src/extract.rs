//! Format-specific text extraction.
//!
//! One strategy per [`DocumentFormat`] variant. Parsing is CPU-bound, so
//! [`FormatExtractor::extract`] moves it onto the blocking pool.

use std::io::{Cursor, Read};

use docqa_core::error::BoxError;
use docqa_core::{DocumentFormat, PipelineError, RawDocument, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

/// Location of the main body part inside a `.docx` package.
const DOCX_BODY_PART: &str = "word/document.xml";

/// A PDF page that could not be turned into text.
#[derive(Debug, thiserror::Error)]
#[error("page {page}: {source}")]
pub struct PageExtractionError {
    pub page: u32,
    #[source]
    pub source: lopdf::Error,
}

/// Converts raw document bytes to plain text.
pub struct FormatExtractor;

impl FormatExtractor {
    /// Extract on the blocking pool, handing the document back with the text.
    pub async fn extract(document: RawDocument) -> Result<(RawDocument, String)> {
        let format = document.format;
        tokio::task::spawn_blocking(move || -> Result<(RawDocument, String)> {
            let text = Self::extract_blocking(&document)?;
            Ok((document, text))
        })
        .await
        .map_err(|e| PipelineError::Extraction {
            format,
            source: Box::new(e),
        })?
    }

    /// Extract on the current thread.
    ///
    /// An empty string is a valid result (a scanned PDF has no text layer).
    pub fn extract_blocking(document: &RawDocument) -> Result<String> {
        let format = document.format;
        let text = match format {
            DocumentFormat::Pdf => pdf_text(&document.bytes),
            DocumentFormat::Docx => docx_text(&document.bytes),
            DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&document.bytes).into_owned()),
            DocumentFormat::Unsupported => {
                return Err(PipelineError::UnsupportedFormat {
                    extension: "unknown".into(),
                });
            }
        }
        .map_err(|source| PipelineError::Extraction { format, source })?;

        debug!(%format, chars = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

/// Page texts in page order, joined by newlines. The first failing page aborts.
fn pdf_text(bytes: &[u8]) -> std::result::Result<String, BoxError> {
    let mut doc = lopdf::Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        // Owner-password-only files open with the empty user password.
        doc.decrypt("")
            .map_err(|e| format!("document is encrypted and needs a password: {e}"))?;
    }

    let mut pages = Vec::new();
    for page in doc.get_pages().into_keys() {
        let text = doc
            .extract_text(&[page])
            .map_err(|source| PageExtractionError { page, source })?;
        pages.push(text.trim_end_matches('\n').to_string());
    }

    Ok(pages.join("\n"))
}

/// Paragraph texts of `word/document.xml` in document order, joined by newlines.
fn docx_text(bytes: &[u8]) -> std::result::Result<String, BoxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY_PART)?.read_to_string(&mut xml)?;
    paragraphs_from_document_xml(&xml)
}

/// Paragraphs are emitted in the order they open. A paragraph nested in
/// another (text boxes inside `w:txbxContent`) gets its own line after the
/// one that contains it.
fn paragraphs_from_document_xml(xml: &str) -> std::result::Result<String, BoxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs: Vec<String> = Vec::new();
    // Indices into `paragraphs` of the currently open `w:p` elements.
    let mut open: Vec<usize> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:t" => in_text_run = false,
                _ => {}
            },
            Event::Empty(e) => match (e.name().as_ref(), open.last()) {
                (b"w:p", _) => paragraphs.push(String::new()),
                (b"w:tab", Some(&i)) => paragraphs[i].push('\t'),
                (b"w:br" | b"w:cr", Some(&i)) => paragraphs[i].push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text_run => {
                if let Some(&i) = open.last() {
                    paragraphs[i].push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_text_run => {
                if let Some(&i) = open.last() {
                    paragraphs[i].push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
