//! Error types for the docqa domain.
//!
//! Uses `thiserror` for ergonomic error definitions. [`PipelineError`] is the
//! caller-facing taxonomy; [`ProviderError`] describes what went wrong talking
//! to a model service and is carried as the cause of
//! [`PipelineError::ModelInvocation`].

use thiserror::Error;

use crate::document::DocumentFormat;

/// Boxed cause attached to extraction failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every way a pipeline run can fail.
///
/// None of these are retried internally. The boundary layer maps them to a
/// status via [`PipelineError::status_class`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed question encoding, empty question list, bad request shape.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Source unreachable, non-success status, or oversized body.
    #[error("Error downloading document from {url}: {reason}")]
    Download { url: String, reason: String },

    /// Extension (or detected type) is not one we can extract.
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    /// Parser failure on a recognized format.
    #[error("Error processing {format} document: {source}")]
    Extraction {
        format: DocumentFormat,
        #[source]
        source: BoxError,
    },

    /// The model service call failed or returned unusable content.
    #[error("Error processing question {} with the language model: {source}", .question_index + 1)]
    ModelInvocation {
        question_index: usize,
        #[source]
        source: ProviderError,
    },

    /// The scoped temporary artifact could not be created or read.
    #[error("Temporary document storage failed: {0}")]
    Artifact(#[from] std::io::Error),
}

/// Coarse status class the boundary layer maps to an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The caller sent something we cannot work with (4xx).
    ClientError,
    /// Something on our side or upstream failed (5xx).
    ServerError,
}

impl PipelineError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            PipelineError::Validation(_)
            | PipelineError::Download { .. }
            | PipelineError::UnsupportedFormat { .. }
            | PipelineError::Extraction { .. } => StatusClass::ClientError,
            PipelineError::ModelInvocation { .. } | PipelineError::Artifact(_) => {
                StatusClass::ServerError
            }
        }
    }

    /// Short machine-readable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Download { .. } => "download",
            PipelineError::UnsupportedFormat { .. } => "unsupported_format",
            PipelineError::Extraction { .. } => "extraction",
            PipelineError::ModelInvocation { .. } => "model_invocation",
            PipelineError::Artifact(_) => "artifact",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no usable content: {0}")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
