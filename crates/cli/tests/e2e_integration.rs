//! End-to-end integration tests for docqa.
//!
//! These drive the HTTP gateway with real documents served over a local
//! socket, and a local stand-in for the Gemini `generateContent` endpoint,
//! so every crate in the workspace takes part.

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::{Json, Router, routing::get, routing::post};
use docqa_config::{AppConfig, FailureMode};
use docqa_core::{Message, Provider, ProviderError, ProviderRequest, ProviderResponse, Usage};
use docqa_gateway::{GatewayState, build_router};
use docqa_pipeline::{FALLBACK_PHRASE, Pipeline};
use docqa_providers::GeminiProvider;
use http_body_util::BodyExt;
use tower::ServiceExt;

const TOKEN: &str = "e2e-token";

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted outcomes in sequence.
struct ScriptedProvider {
    outcomes: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
    call_count: AtomicUsize,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<&str, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: std::sync::Mutex::new(
                outcomes.into_iter().map(|o| o.map(String::from)).collect(),
            ),
            call_count: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        let outcomes = self.outcomes.lock().unwrap();
        let outcome = outcomes
            .get(call)
            .cloned()
            .unwrap_or_else(|| panic!("ScriptedProvider exhausted: call #{call}, have {}", outcomes.len()));
        outcome.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serves the test policy as a Word file and as plain text.
async fn spawn_document_host() -> String {
    let policy = docx(&[
        "National Parivar Mediclaim Plus Policy",
        "Grace period is 30 days.",
        "Waiting period for pre-existing diseases is 36 months.",
    ]);
    let app = Router::new()
        .route(
            "/policy.docx",
            get(move || {
                let policy = policy.clone();
                async move { policy }
            }),
        )
        .route(
            "/notes.txt",
            get(|| async { "Maternity expenses are covered after 24 months." }),
        );
    serve(app).await
}

/// Answers from the prompt text the way a well-behaved model would.
async fn spawn_fake_gemini() -> String {
    let app = Router::new().route(
        "/v1beta/models/{call}",
        post(|Json(body): Json<serde_json::Value>| async move {
            let prompt = body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let answer = if prompt.contains("Question: What is the grace period")
                && prompt.contains("Grace period is 30 days.")
            {
                "The grace period for premium payment is 30 days."
            } else if prompt.contains("Question: What is the waiting period")
                && prompt.contains("36 months")
            {
                "The waiting period for pre-existing diseases is 36 months."
            } else {
                FALLBACK_PHRASE
            };
            Json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": answer}]}, "finishReason": "STOP"}],
                "usageMetadata": {"promptTokenCount": 100, "candidatesTokenCount": 12, "totalTokenCount": 112}
            }))
        }),
    );
    format!("{}/v1beta", serve(app).await)
}

fn gateway(provider: Arc<dyn Provider>, temp: &tempfile::TempDir, mode: FailureMode) -> Router {
    let mut config = AppConfig::default();
    config.gateway.bearer_token = Some(TOKEN.into());
    config.documents.temp_dir = Some(temp.path().to_path_buf());
    config.pipeline.failure_mode = mode;

    let state = Arc::new(GatewayState {
        pipeline: Arc::new(Pipeline::from_config(&config, provider)),
        bearer_token: config.gateway.bearer_token.clone(),
    });
    build_router(state, &config.gateway)
}

fn run_request(url: &str, questions: &[&str]) -> Request<Body> {
    let body = serde_json::json!({"documents": url, "questions": questions});
    Request::builder()
        .method("POST")
        .uri("/hackrx/run")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(filename: &str, bytes: &[u8], questions: &str) -> Request<Body> {
    let boundary = "e2e-boundary";
    let mut body = Vec::new();
    write!(
        body,
        "--{boundary}\r\nContent-Disposition: form-data; name=\"questions\"\r\n\r\n{questions}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .unwrap();
    body.extend_from_slice(bytes);
    write!(body, "\r\n--{boundary}--\r\n").unwrap();

    Request::builder()
        .method("POST")
        .uri("/hackrx/upload")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn leftover_files(temp: &tempfile::TempDir) -> usize {
    std::fs::read_dir(temp.path()).unwrap().count()
}

// ── E2E: full stack with the Gemini wire format ──────────────────────────

#[tokio::test]
async fn e2e_url_to_answers_through_gemini() {
    let docs = spawn_document_host().await;
    let gemini = spawn_fake_gemini().await;
    let temp = tempfile::tempdir().unwrap();

    let provider = Arc::new(GeminiProvider::new("e2e-key").with_base_url(gemini));
    let app = gateway(provider, &temp, FailureMode::FailFast);

    let response = app
        .oneshot(run_request(
            &format!("{docs}/policy.docx"),
            &[
                "What is the grace period for premium payment?",
                "What is the waiting period for pre-existing diseases?",
                "Does the policy cover cosmetic surgery?",
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let answers = json["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 3);
    assert!(answers[0].as_str().unwrap().contains("30 days"));
    assert!(answers[1].as_str().unwrap().contains("36 months"));
    assert_eq!(answers[2], FALLBACK_PHRASE);

    assert_eq!(json["metadata"]["document_url"], format!("{docs}/policy.docx"));
    assert_eq!(json["metadata"]["total_questions"], 3);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_plain_text_url_answers() {
    let docs = spawn_document_host().await;
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Ok("After 24 months.")]);
    let app = gateway(provider.clone(), &temp, FailureMode::FailFast);

    let response = app
        .oneshot(run_request(
            &format!("{docs}/notes.txt"),
            &["When are maternity expenses covered?"],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["answers"][0], "After 24 months.");
    assert_eq!(
        json["metadata"]["model_info"]["text_length"],
        "Maternity expenses are covered after 24 months.".len()
    );
}

// ── E2E: reference scenarios ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_grounded_answer_from_upload() {
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Ok("The grace period is 30 days.")]);
    let app = gateway(provider.clone(), &temp, FailureMode::FailFast);

    let response = app
        .oneshot(upload_request(
            "policy.docx",
            &docx(&["Grace period is 30 days."]),
            r#"["What is the grace period for premium payment?"]"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["answers"][0].as_str().unwrap().contains("30 days"));
    assert_eq!(json["filename"], "policy.docx");
    assert_eq!(provider.calls(), 1);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_empty_questions_rejected_on_both_endpoints() {
    let docs = spawn_document_host().await;
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![]);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(run_request(&format!("{docs}/policy.docx"), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(upload_request("policy.docx", &docx(&["text"]), "[]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(provider.calls(), 0);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_executable_upload_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![]);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(upload_request("installer.exe", b"MZ\x90\x00\x03", r#"["Q"]"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Unsupported file type: .exe");
    assert_eq!(provider.calls(), 0);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_malformed_question_encoding_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![]);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(upload_request(
            "policy.docx",
            &docx(&["text"]),
            "What is covered?",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.calls(), 0);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_model_failure_on_second_question_fails_request() {
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok("first answer"),
        Err(ProviderError::Timeout("no answer within 300s".into())),
        Ok("third answer"),
    ]);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(upload_request(
            "policy.docx",
            &docx(&["text"]),
            r#"["Q1", "Q2", "Q3"]"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(json.get("answers").is_none());
    assert!(!json.to_string().contains("first answer"));
    assert_eq!(provider.calls(), 2);
    assert_eq!(leftover_files(&temp), 0);
}

#[tokio::test]
async fn e2e_per_question_mode_returns_partial_result() {
    let temp = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![
        Ok("first answer"),
        Err(ProviderError::Timeout("no answer within 300s".into())),
        Ok("third answer"),
    ]);

    let response = gateway(provider.clone(), &temp, FailureMode::PerQuestion)
        .oneshot(upload_request(
            "policy.docx",
            &docx(&["text"]),
            r#"["Q1", "Q2", "Q3"]"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["answers"][0], "first answer");
    assert_eq!(json["answers"][1], "Error: Request timed out: no answer within 300s");
    assert_eq!(json["answers"][2], "third answer");
    assert_eq!(json["metadata"]["failed_questions"], 1);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn e2e_unreachable_document_is_client_error() {
    let temp = tempfile::tempdir().unwrap();
    let docs = spawn_document_host().await;
    let provider = ScriptedProvider::new(vec![]);

    let response = gateway(provider.clone(), &temp, FailureMode::FailFast)
        .oneshot(run_request(&format!("{docs}/missing.pdf"), &["Q"]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.calls(), 0);
    assert_eq!(leftover_files(&temp), 0);
}
