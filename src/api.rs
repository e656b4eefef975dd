//! HTTP surface for docingest.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /extract` – Multipart upload of one file; classifies it, extracts
//!   its text (direct or via the OCR job path), and returns
//!   `{"success": true, "text": ...}`.
//! - `POST /extract-url` – Download a document by URL and run the identical
//!   pipeline.
//! - `GET /metrics` – Observe extraction counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery.
//!
//! Failures are normalized into `{"success": false, "error": ...}` with a
//! status code derived from the error kind; no partial text is ever returned.

use crate::extract::{ExtractError, ExtractionApi, UploadRequest};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the extraction API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ExtractionApi + 'static,
{
    Router::new()
        .route("/extract", post(extract_file::<S>))
        .route("/extract-url", post(extract_url::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        // Payload size is not capped here; only the PDF routing threshold
        // cares about size.
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

/// Success response for both extraction endpoints.
#[derive(Serialize)]
struct ExtractResponse {
    /// Always `true` on this shape; failures use the error shape.
    success: bool,
    /// Normalized plain text, non-empty by contract.
    text: String,
}

/// Extract text from an uploaded file.
///
/// Accepts a multipart form with a single `file` part carrying the bytes,
/// the declared content type, and the original file name.
async fn extract_file<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError>
where
    S: ExtractionApi,
{
    let mut upload: Option<UploadRequest> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("Malformed multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("Failed to read upload: {err}")))?
            .to_vec();
        upload = Some(UploadRequest {
            content,
            media_type,
            file_name,
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::bad_request("No file uploaded".to_string()))?;
    let outcome = service.extract(upload).await?;
    Ok(Json(ExtractResponse {
        success: true,
        text: outcome.text,
    }))
}

/// Request body for the `POST /extract-url` endpoint.
#[derive(Deserialize)]
struct ExtractUrlRequest {
    /// Location of the document to download and extract.
    url: String,
}

/// Download a document by URL and extract its text.
async fn extract_url<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ExtractUrlRequest>,
) -> Result<Json<ExtractResponse>, AppError>
where
    S: ExtractionApi,
{
    if request.url.trim().is_empty() {
        return Err(AppError::bad_request("No URL provided".to_string()));
    }
    let outcome = service.extract_url(request.url.trim()).await?;
    Ok(Json(ExtractResponse {
        success: true,
        text: outcome.text,
    }))
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    documents_extracted: u64,
    ocr_jobs_run: u64,
    ocr_fallbacks: u64,
}

/// Return a concise metrics snapshot with extraction counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: ExtractionApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        documents_extracted: snapshot.documents_extracted,
        ocr_jobs_run: snapshot.ocr_jobs_run,
        ocr_fallbacks: snapshot.ocr_fallbacks,
    })
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "extract",
                method: "POST",
                path: "/extract",
                description: "Upload one file as multipart form data (field `file`) and receive its normalized plain text. Response returns { \"success\": true, \"text\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "extract_url",
                method: "POST",
                path: "/extract-url",
                description: "Download a document by URL and extract its text through the same pipeline.",
                request_example: Some(json!({
                    "url": "https://example.org/paper.pdf"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return extraction counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ExtractError> for AppError {
    fn from(inner: ExtractError) -> Self {
        let status = match &inner {
            ExtractError::UnsupportedFileType(_)
            | ExtractError::Decoding(_)
            | ExtractError::UnsupportedDocFormat(_)
            | ExtractError::NoTextExtracted => StatusCode::BAD_REQUEST,
            ExtractError::Fetch(_) | ExtractError::OcrJob(_) => StatusCode::BAD_GATEWAY,
            ExtractError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: inner.to_string(),
        }
    }
}
