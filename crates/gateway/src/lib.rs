//! HTTP gateway for docqa.
//!
//! Exposes the document question-answering pipeline over HTTP:
//! `GET /health`, `POST /hackrx/run` and `POST /hackrx/upload`.
//!
//! Built on Axum. The `/hackrx/*` routes sit behind a bearer-token check.

pub mod hackrx;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use docqa_config::{AppConfig, GatewayConfig};
use docqa_pipeline::Pipeline;

pub use hackrx::{ApiError, FileUploadResponse, QueryRequest, QueryResponse};

const SERVICE_NAME: &str = "docqa document query service";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    /// `None` disables the bearer check (local development only).
    pub bearer_token: Option<String>,
}

pub type SharedState = Arc<GatewayState>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Bearer token authentication on `/hackrx/*`
/// - CORS from `gateway.cors_origins`
/// - Request body size limit from `gateway.max_body_bytes`
/// - HTTP trace logging
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    let protected = hackrx::hackrx_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(cors_layer(&gateway.cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Refuses to start without a model API key and a bearer token.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate_for_serving()?;

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = docqa_providers::build_from_config(&config);
    let provider = router
        .default()
        .ok_or("No default provider configured; set an API key")?;

    let pipeline = Pipeline::from_config(&config, provider);
    info!(
        provider = %config.default_provider,
        model = %pipeline.model(),
        failure_mode = ?pipeline.failure_mode(),
        "Pipeline ready"
    );

    let state = Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
        bearer_token: config.gateway.bearer_token.clone(),
    });
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Could not install Ctrl-C handler; shutdown signal disabled");
        std::future::pending::<()>().await;
    }
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Authentication middleware for `/hackrx/*`.
///
/// No `Authorization: Bearer` header → 403. A token that does not match
/// `gateway.bearer_token` → 401 with `WWW-Authenticate: Bearer`.
async fn auth_middleware(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(expected) = state.bearer_token.as_deref() else {
        return next.run(req).await;
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if token == expected => next.run(req).await,
        Some(_) => {
            warn!(path = %req.uri().path(), "Rejected request with invalid bearer token");
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorResponse {
                    error: "Invalid authentication credentials".into(),
                }),
            )
                .into_response()
        }
        None => {
            warn!(path = %req.uri().path(), "Rejected request without bearer token");
            (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Not authenticated".into(),
                }),
            )
                .into_response()
        }
    }
}
