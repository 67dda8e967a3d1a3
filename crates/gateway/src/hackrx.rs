//! Document question-answering endpoints.
//!
//! - `POST /hackrx/run`: JSON `{documents: <url>, questions: [...]}`
//! - `POST /hackrx/upload`: multipart `file` plus `questions` (a JSON-encoded list)
//!
//! Both hand off to [`Pipeline::run`](docqa_pipeline::Pipeline::run) and map
//! its errors onto HTTP statuses.

use axum::{
    Router,
    extract::{Json, Multipart, State, multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use docqa_core::{DocumentSource, PipelineError, ResultMetadata, StatusClass};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{ErrorResponse, SharedState};

pub(crate) fn hackrx_router() -> Router<SharedState> {
    Router::new()
        .route("/hackrx/run", post(run_handler))
        .route("/hackrx/upload", post(upload_handler))
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// URL of the document to fetch.
    pub documents: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answers: Vec<String>,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub answers: Vec<String>,
    pub metadata: ResultMetadata,
    pub filename: String,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// A pipeline failure on its way out as an HTTP response.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self(PipelineError::Validation(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.status_class() {
            StatusClass::ClientError => StatusCode::BAD_REQUEST,
            StatusClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(kind = self.0.kind(), error = %self.0, "Request failed");
        } else {
            warn!(kind = self.0.kind(), error = %self.0, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn run_handler(
    State(state): State<SharedState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    info!(
        document = %payload.documents,
        questions = payload.questions.len(),
        "hackrx/run request"
    );

    let result = state
        .pipeline
        .run(DocumentSource::url(payload.documents), &payload.questions)
        .await?;

    Ok(Json(QueryResponse {
        answers: result.answers,
        metadata: result.metadata,
    }))
}

async fn upload_handler(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut questions_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("questions") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                questions_raw = Some(text);
            }
            _ => {}
        }
    }

    let questions_raw =
        questions_raw.ok_or_else(|| ApiError::validation("missing form field 'questions'"))?;
    let questions: Vec<String> = serde_json::from_str(&questions_raw)
        .map_err(|_| ApiError::validation("Invalid JSON format for questions"))?;

    let (filename, bytes) = file.ok_or_else(|| ApiError::validation("missing form field 'file'"))?;

    info!(
        filename = %filename,
        bytes = bytes.len(),
        questions = questions.len(),
        "hackrx/upload request"
    );

    let result = state
        .pipeline
        .run(DocumentSource::upload(bytes, filename.clone()), &questions)
        .await?;

    Ok(Json(FileUploadResponse {
        answers: result.answers,
        metadata: result.metadata,
        filename,
    }))
}
