//! HTTP surface for the bill analysis service.
//!
//! - `POST /api/ai/analyse/` – Multipart upload (field `file`) of a JPEG, PNG, or PDF bill of at
//!   most 5 MiB. Text is extracted (OCR for images, text layer for PDFs) and summarized by the
//!   configured language model. Returns `{"message": "Analysis successful.", "summary": str}`.
//!   Validation problems return `400 {"file": [str]}`, an unsupported format during extraction
//!   returns `400 {"error": str}`, and extraction or generation failures return
//!   `500 {"error": str}`.
//! - `GET /health` – Liveness check.
//!
//! Signup, login, and the admin interface are served elsewhere.

use crate::analysis::{AnalysisApi, AnalysisError};
use crate::extraction::ExtractionError;
use crate::upload::{self, MAX_UPLOAD_BYTES, UPLOAD_FIELD, UploadedFile, ValidationError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Instrument, field};
use uuid::Uuid;

/// Path of the analysis endpoint.
pub const ANALYSE_PATH: &str = "/api/ai/analyse/";

/// Build the HTTP router exposing the analysis API surface.
///
/// `allowed_origins` restricts cross-origin browser access; an empty slice allows any origin.
pub fn create_router<S>(service: Arc<S>, allowed_origins: &[String]) -> Router
where
    S: AnalysisApi + 'static,
{
    Router::new()
        .route(
            ANALYSE_PATH,
            post(analyse_file::<S>).layer(DefaultBodyLimit::disable()),
        )
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Success response for `POST /api/ai/analyse/`.
#[derive(Serialize)]
struct AnalyseResponse {
    message: &'static str,
    summary: String,
}

/// Validate an uploaded bill, extract its text, and return the generated financial summary.
async fn analyse_file<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyseResponse>, AppError>
where
    S: AnalysisApi,
{
    let span = tracing::info_span!(
        "analyse",
        request_id = %Uuid::new_v4(),
        file_name = field::Empty,
        media_type = field::Empty,
        size = field::Empty,
    );

    run_analysis(service, multipart).instrument(span).await
}

async fn run_analysis<S>(
    service: Arc<S>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyseResponse>, AppError>
where
    S: AnalysisApi,
{
    let file = read_upload(multipart).await?;
    let span = tracing::Span::current();
    span.record("file_name", file.file_name.as_str());
    span.record("media_type", file.content_type.as_str());
    span.record("size", file.size());

    let file = upload::validate(file)?;
    tracing::debug!("Upload validated");

    let summary = service.analyse(file).await?;
    tracing::info!(summary_chars = summary.len(), "Analysis completed");
    Ok(Json(AnalyseResponse {
        message: "Analysis successful.",
        summary,
    }))
}

/// Pull the `file` part out of the form, reading at most one chunk past the size limit.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedFile, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request is not a multipart form");
        ValidationError::file(upload::MSG_NO_FILE)
    })?;

    while let Some(mut part) = multipart.next_field().await.map_err(AppError::unexpected)? {
        if part.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = part.file_name().map(str::to_string) else {
            return Err(ValidationError::file(upload::MSG_NOT_A_FILE).into());
        };
        let content_type = part.content_type().unwrap_or_default().to_string();

        let mut content = Vec::new();
        while let Some(chunk) = part.chunk().await.map_err(AppError::unexpected)? {
            content.extend_from_slice(&chunk);
            if content.len() > MAX_UPLOAD_BYTES {
                tracing::debug!(received = content.len(), "Upload exceeds size limit; stop reading");
                break;
            }
        }

        return Ok(UploadedFile {
            file_name,
            content_type,
            content,
        });
    }

    Err(ValidationError::file(upload::MSG_NO_FILE).into())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

enum AppError {
    Validation(ValidationError),
    Analysis(AnalysisError),
    Unexpected(String),
}

impl AppError {
    fn unexpected(error: impl std::fmt::Display) -> Self {
        Self::Unexpected(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(error) => {
                tracing::warn!(field = error.field, message = %error.message, "Upload rejected");
                let mut body = serde_json::Map::new();
                body.insert(error.field.to_string(), json!([error.message]));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Analysis(
                error @ AnalysisError::Extraction(ExtractionError::UnsupportedFormat { .. }),
            ) => {
                tracing::warn!(%error, "Unsupported format during extraction");
                let body = json!({ "error": error.to_string() });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Analysis(error) => {
                tracing::error!(%error, "Analysis failed");
                let body = json!({ "error": error.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            Self::Unexpected(message) => {
                tracing::error!(%message, "Unexpected failure while handling upload");
                let body = json!({ "error": format!("An unexpected error occurred: {message}") });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(inner: ValidationError) -> Self {
        Self::Validation(inner)
    }
}

impl From<AnalysisError> for AppError {
    fn from(inner: AnalysisError) -> Self {
        Self::Analysis(inner)
    }
}
