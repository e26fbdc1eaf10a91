// HTTP Service Facade
// Thin request/response boundary over the detection engine: route setup,
// request validation, and error translation. No detection logic lives here.

use crate::error::DetectError;
use crate::models::{
    DetectRequest, DetectResponse, HealthResponse, TokenizeReport, TokenizeRequest,
};
use crate::services::detection::{DetectionEngine, DetectionOptions};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No text provided")]
    EmptyText,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Error processing text: {0}")]
    Processing(String),
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        if err.is_configuration() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::Processing(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::EmptyText => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Processing(_) => {
                error!("detection request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Build the service router. CORS mirrors the original boundary: any origin,
/// any method, any header.
pub fn router(engine: Arc<DetectionEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/detect", post(detect))
        .route("/api/tokenize", post(tokenize))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine)
}

fn options_from(request: &DetectRequest) -> Result<DetectionOptions, ApiError> {
    if request.window_size <= 0 {
        return Err(ApiError::InvalidRequest(
            "window size must be greater than zero".into(),
        ));
    }
    if request.overlap < 0 {
        return Err(ApiError::InvalidRequest("overlap must not be negative".into()));
    }
    Ok(DetectionOptions {
        window_size: request.window_size as usize,
        overlap: request.overlap as usize,
        temperature: request.temperature,
    })
}

async fn detect(
    State(engine): State<Arc<DetectionEngine>>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }
    let options = options_from(&request)?;

    let request_id = Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        chars = request.text.chars().count(),
        temperature = options.temperature,
        "detect.request"
    );

    // Inference is CPU-bound; keep it off the async runtime.
    let text = request.text;
    let report = tokio::task::spawn_blocking(move || engine.detect(&text, &options))
        .await
        .map_err(|e| ApiError::Processing(e.to_string()))??;

    Ok(Json(DetectResponse {
        report,
        request_id,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn tokenize(
    State(engine): State<Arc<DetectionEngine>>,
    Json(request): Json<TokenizeRequest>,
) -> Result<Json<TokenizeReport>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }

    let text = request.text;
    let report = tokio::task::spawn_blocking(move || engine.tokenize(&text))
        .await
        .map_err(|e| ApiError::Processing(e.to_string()))??;

    Ok(Json(report))
}

async fn health() -> Json<HealthResponse> {
    // The process refuses to start without a loaded model, so reaching this
    // handler implies the model is available.
    Json(HealthResponse { status: "ok".to_string(), model_loaded: true })
}
