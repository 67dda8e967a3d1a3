//! Document sources and formats.
//!
//! A request carries exactly one [`DocumentSource`]. Once its bytes are in
//! hand they become a [`RawDocument`] tagged with a [`DocumentFormat`], which
//! decides the extraction strategy.

use serde::{Deserialize, Serialize};

/// File extensions accepted on the upload endpoint.
pub const UPLOAD_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

/// The formats the extractor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    /// Word documents. Legacy `.doc` is routed here as well.
    Docx,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    /// Map a file extension (with or without the leading dot) to a format.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Docx,
            "txt" | "text" | "md" => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    /// Format for an uploaded file. Only [`UPLOAD_EXTENSIONS`] are accepted.
    pub fn for_upload(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
            Self::from_extension(&ext)
        } else {
            Self::Unsupported
        }
    }

    /// Map a `Content-Type` header value. Generic binary types yield `None`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" | "application/x-pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/msword" => Some(Self::Docx),
            "text/plain" | "text/markdown" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Recognize a format from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Suffix used for the temporary artifact holding the bytes.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
            Self::PlainText => ".txt",
            Self::Unsupported => ".bin",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::PlainText => "plain text",
            Self::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Lowercased extension of a filename, including the dot (`"report.PDF"` → `".pdf"`).
///
/// Returns an empty string when there is none. A leading dot alone (`".env"`)
/// is a hidden file name, not an extension.
pub fn extension_of(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Where the document for a request comes from.
#[derive(Clone)]
pub enum DocumentSource {
    /// Fetched over HTTP(S).
    RemoteUrl(String),
    /// Sent by the caller as a multipart upload.
    Uploaded {
        bytes: Vec<u8>,
        filename: String,
        extension: String,
    },
}

impl DocumentSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::RemoteUrl(url.into())
    }

    /// Build an upload source, deriving the declared extension from the filename.
    pub fn upload(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let extension = extension_of(&filename);
        Self::Uploaded {
            bytes,
            filename,
            extension,
        }
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        match self {
            Self::RemoteUrl(url) => SourceDescriptor::Url(url.clone()),
            Self::Uploaded { filename, .. } => SourceDescriptor::Upload(filename.clone()),
        }
    }
}

impl std::fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
            Self::Uploaded {
                bytes,
                filename,
                extension,
            } => f
                .debug_struct("Uploaded")
                .field("bytes", &format_args!("<{} bytes>", bytes.len()))
                .field("filename", filename)
                .field("extension", extension)
                .finish(),
        }
    }
}

/// How a result refers back to its document.
///
/// Serialized flattened into result metadata as either
/// `"document_url": ...` or `"filename": ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceDescriptor {
    #[serde(rename = "document_url")]
    Url(String),
    #[serde(rename = "filename")]
    Upload(String),
}

impl std::fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Upload(name) => f.write_str(name),
        }
    }
}

/// Document bytes plus the format they were classified as.
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
