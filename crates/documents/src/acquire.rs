//! Obtaining document bytes for a request.
//!
//! Remote URLs are fetched with a bounded timeout and size cap; uploads are
//! taken as-is after their extension passes the allowlist. Either way the
//! bytes land in a [`TempArtifact`] that lives as long as the returned
//! [`AcquiredDocument`].

use std::path::PathBuf;
use std::time::Duration;

use docqa_config::DocumentsConfig;
use docqa_core::document::extension_of;
use docqa_core::{DocumentFormat, DocumentSource, PipelineError, RawDocument, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::artifact::TempArtifact;

/// Document bytes plus the artifact that keeps them on disk.
pub struct AcquiredDocument {
    pub artifact: TempArtifact,
    pub document: RawDocument,
}

impl std::fmt::Debug for AcquiredDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredDocument")
            .field("artifact", &self.artifact)
            .field("format", &self.document.format)
            .field("bytes", &self.document.len())
            .finish()
    }
}

impl AcquiredDocument {
    pub fn format(&self) -> DocumentFormat {
        self.document.format
    }

    pub fn size(&self) -> usize {
        self.document.len()
    }
}

/// Fetches or accepts document bytes.
pub struct SourceAcquirer {
    client: reqwest::Client,
    max_bytes: usize,
    temp_dir: Option<PathBuf>,
}

impl SourceAcquirer {
    pub fn from_config(config: &DocumentsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_bytes: config.max_document_bytes,
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Acquire the bytes for `source` and write them to a temporary artifact.
    ///
    /// Unsupported uploads are rejected before anything touches the disk.
    pub async fn acquire(&self, source: &DocumentSource) -> Result<AcquiredDocument> {
        let document = match source {
            DocumentSource::RemoteUrl(url) => self.download(url).await?,
            DocumentSource::Uploaded {
                bytes,
                filename,
                extension,
            } => self.accept_upload(bytes, filename, extension)?,
        };

        let temp_dir = self.temp_dir.clone();
        let format = document.format;
        let (artifact, bytes) = tokio::task::spawn_blocking(move || {
            TempArtifact::write(temp_dir.as_deref(), format, &document.bytes)
                .map(|artifact| (artifact, document.bytes))
        })
        .await
        .map_err(|e| PipelineError::Artifact(std::io::Error::other(e)))??;

        Ok(AcquiredDocument {
            artifact,
            document: RawDocument::new(bytes, format),
        })
    }

    fn accept_upload(&self, bytes: &[u8], filename: &str, extension: &str) -> Result<RawDocument> {
        let format = DocumentFormat::for_upload(extension);
        if !format.is_supported() {
            warn!(filename, extension, "Rejected upload with unsupported extension");
            return Err(PipelineError::UnsupportedFormat {
                extension: display_extension(extension),
            });
        }

        if bytes.len() > self.max_bytes {
            return Err(PipelineError::Validation(format!(
                "uploaded file is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }

        debug!(filename, %format, bytes = bytes.len(), "Accepted upload");
        Ok(RawDocument::new(bytes.to_vec(), format))
    }

    async fn download(&self, url: &str) -> Result<RawDocument> {
        let download_error = |reason: String| PipelineError::Download {
            url: url.to_string(),
            reason,
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| download_error(format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(download_error(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        info!(url, "Downloading document");

        let mut response = self.client.get(parsed.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                download_error("timed out".into())
            } else {
                download_error(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("server responded with {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(download_error(format!(
                    "document is {len} bytes, limit is {}",
                    self.max_bytes
                )));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_error(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(download_error(format!(
                    "document exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let format = detect_remote_format(parsed.path(), content_type.as_deref(), &bytes);
        debug!(url, %format, bytes = bytes.len(), "Downloaded document");
        Ok(RawDocument::new(bytes, format))
    }
}

/// Classify a downloaded document.
///
/// URL path extension first, then `Content-Type`, then magic bytes. Anything
/// still unrecognized is treated as PDF.
fn detect_remote_format(path: &str, content_type: Option<&str>, bytes: &[u8]) -> DocumentFormat {
    let by_extension = DocumentFormat::from_extension(&extension_of(path));
    if by_extension.is_supported() {
        return by_extension;
    }

    content_type
        .and_then(DocumentFormat::from_content_type)
        .or_else(|| DocumentFormat::sniff(bytes))
        .unwrap_or(DocumentFormat::Pdf)
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(none)".into()
    } else {
        extension.to_string()
    }
}
