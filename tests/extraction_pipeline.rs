//! End-to-end pipeline tests against stateful stub backends.
//!
//! The staging store and the OCR job service are modeled as small axum apps
//! so the tests can script poll progressions (in-progress, then terminal) and
//! count every external call the pipeline makes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use docingest::classify::RoutingDecision;
use docingest::extract::{ExtractError, ExtractionService, UploadRequest};
use docingest::ocr::{OcrClient, OcrJobDriver, OcrJobError};
use docingest::staging::StagingClient;

const HELLO_PDF: &[u8] = include_bytes!("fixtures/hello.pdf");
const BLANK_PDF: &[u8] = include_bytes!("fixtures/blank.pdf");

/// Scripted backend shared by the staging-store and OCR-service stubs.
#[derive(Default)]
struct StubBackend {
    puts: AtomicUsize,
    deletes: AtomicUsize,
    submits: AtomicUsize,
    status_polls: AtomicUsize,
    page_fetches: AtomicUsize,
    detects: AtomicUsize,
    /// Responses for tokenless status polls, consumed front to back.
    poll_script: Mutex<VecDeque<Value>>,
    /// Responses for continuation fetches, keyed by token.
    pages: Mutex<HashMap<String, Value>>,
    /// Response for synchronous image detection.
    detect_response: Mutex<Value>,
}

impl StubBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn script_polls(&self, responses: Vec<Value>) {
        *self.poll_script.lock().await = responses.into();
    }

    async fn script_page(&self, token: &str, response: Value) {
        self.pages.lock().await.insert(token.to_string(), response);
    }

    async fn script_detect(&self, response: Value) {
        *self.detect_response.lock().await = response;
    }

    fn external_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
            + self.submits.load(Ordering::SeqCst)
            + self.status_polls.load(Ordering::SeqCst)
            + self.page_fetches.load(Ordering::SeqCst)
            + self.detects.load(Ordering::SeqCst)
    }
}

async fn put_object(State(state): State<Arc<StubBackend>>) -> StatusCode {
    state.puts.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn delete_object(State(state): State<Arc<StubBackend>>) -> StatusCode {
    state.deletes.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn submit_job(State(state): State<Arc<StubBackend>>) -> Json<Value> {
    state.submits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "job_id": "job-test" }))
}

async fn poll_job(
    State(state): State<Arc<StubBackend>>,
    Path(_job_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if let Some(token) = params.get("next_token") {
        state.page_fetches.fetch_add(1, Ordering::SeqCst);
        let pages = state.pages.lock().await;
        return pages
            .get(token)
            .cloned()
            .map(Json)
            .ok_or(StatusCode::NOT_FOUND);
    }

    state.status_polls.fetch_add(1, Ordering::SeqCst);
    let mut script = state.poll_script.lock().await;
    match script.pop_front() {
        Some(response) => Ok(Json(response)),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn detect_text(State(state): State<Arc<StubBackend>>) -> Json<Value> {
    state.detects.fetch_add(1, Ordering::SeqCst);
    Json(state.detect_response.lock().await.clone())
}

/// Start the stub backend and build a service wired against it.
async fn start_pipeline(
    backend: Arc<StubBackend>,
    pdf_ocr_threshold: usize,
) -> ExtractionService {
    let app = Router::new()
        .route("/staging/*key", put(put_object).delete(delete_object))
        .route("/text-detection/jobs", post(submit_job))
        .route("/text-detection/jobs/:job_id", get(poll_job))
        .route("/text-detection/detect", post(detect_text))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let base_url = format!("http://{}", listener.local_addr().expect("stub addr"));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend");
    });

    let driver = OcrJobDriver::new(
        StagingClient::with_endpoint(&base_url, "staging".into(), None).expect("staging client"),
        OcrClient::with_endpoint(&base_url, None).expect("ocr client"),
        Duration::from_millis(10),
        Duration::from_secs(5),
    );
    ExtractionService::from_parts(driver, pdf_ocr_threshold, CancellationToken::new())
}

fn pdf_upload(content: &[u8]) -> UploadRequest {
    UploadRequest {
        content: content.to_vec(),
        media_type: "application/pdf".into(),
        file_name: "document.pdf".into(),
    }
}

#[tokio::test]
async fn text_layer_pdf_never_touches_the_ocr_path() {
    let backend = StubBackend::new();
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let outcome = service.extract(pdf_upload(HELLO_PDF)).await.expect("text");

    assert!(outcome.text.contains("Hello World"));
    assert_eq!(outcome.route, RoutingDecision::TextPdf);
    assert!(!outcome.used_ocr_fallback);
    assert_eq!(backend.external_calls(), 0);
}

#[tokio::test]
async fn empty_text_layer_falls_back_to_ocr_exactly_once() {
    let backend = StubBackend::new();
    backend
        .script_polls(vec![json!({
            "status": "succeeded",
            "lines": ["Recovered line"]
        })])
        .await;
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let outcome = service.extract(pdf_upload(BLANK_PDF)).await.expect("text");

    assert_eq!(outcome.text, "Recovered line");
    assert!(outcome.used_ocr_fallback);
    assert_eq!(backend.submits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.puts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);

    let metrics = service.metrics_snapshot();
    assert_eq!(metrics.ocr_fallbacks, 1);
    assert_eq!(metrics.ocr_jobs_run, 1);
}

#[tokio::test]
async fn scanned_pdf_polls_until_terminal_status() {
    let backend = StubBackend::new();
    backend
        .script_polls(vec![
            json!({ "status": "in_progress" }),
            json!({ "status": "succeeded", "lines": ["Page one text"] }),
        ])
        .await;
    // Threshold below the fixture size forces the scanned-PDF route.
    let service = start_pipeline(backend.clone(), 16).await;

    let outcome = service.extract(pdf_upload(BLANK_PDF)).await.expect("text");

    assert_eq!(outcome.text, "Page one text");
    assert_eq!(outcome.route, RoutingDecision::ScannedPdf);
    assert!(!outcome.used_ocr_fallback);
    assert_eq!(backend.status_polls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn paginated_results_preserve_line_order() {
    let backend = StubBackend::new();
    backend
        .script_polls(vec![json!({
            "status": "succeeded",
            "lines": ["line 1", "line 2"],
            "next_token": "t2"
        })])
        .await;
    backend
        .script_page(
            "t2",
            json!({
                "status": "succeeded",
                "lines": ["line 3", "line 4"],
                "next_token": "t3"
            }),
        )
        .await;
    backend
        .script_page(
            "t3",
            json!({ "status": "succeeded", "lines": ["line 5"] }),
        )
        .await;
    let service = start_pipeline(backend.clone(), 16).await;

    let outcome = service.extract(pdf_upload(BLANK_PDF)).await.expect("text");

    // Three pages over two continuation fetches, in order, no gaps or repeats.
    assert_eq!(outcome.text, "line 1\nline 2\nline 3\nline 4\nline 5");
    assert_eq!(backend.page_fetches.load(Ordering::SeqCst), 2);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_job_surfaces_error_and_cleans_up() {
    let backend = StubBackend::new();
    backend
        .script_polls(vec![json!({
            "status": "failed",
            "status_message": "document unreadable"
        })])
        .await;
    let service = start_pipeline(backend.clone(), 16).await;

    let result = service.extract(pdf_upload(BLANK_PDF)).await;

    assert!(matches!(
        result,
        Err(ExtractError::OcrJob(OcrJobError::JobFailed { .. }))
    ));
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_ocr_output_after_fallback_is_fatal() {
    let backend = StubBackend::new();
    backend
        .script_polls(vec![json!({ "status": "succeeded", "lines": [] })])
        .await;
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let result = service.extract(pdf_upload(BLANK_PDF)).await;

    // A second empty result never triggers another fallback.
    assert!(matches!(result, Err(ExtractError::NoTextExtracted)));
    assert_eq!(backend.submits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unsupported_uploads_make_no_backend_calls() {
    let backend = StubBackend::new();
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let result = service
        .extract(UploadRequest {
            content: vec![0u8; 64],
            media_type: "application/zip".into(),
            file_name: "archive.zip".into(),
        })
        .await;

    assert!(matches!(result, Err(ExtractError::UnsupportedFileType(_))));
    assert_eq!(backend.external_calls(), 0);
}

#[tokio::test]
async fn plain_text_scenario_round_trips_verbatim() {
    let backend = StubBackend::new();
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let outcome = service
        .extract(UploadRequest {
            content: b"hello world".to_vec(),
            media_type: "text/plain".into(),
            file_name: "note.txt".into(),
        })
        .await
        .expect("text");

    assert_eq!(outcome.text, "hello world");
    assert_eq!(backend.external_calls(), 0);
}

#[tokio::test]
async fn images_use_synchronous_detection_without_staging() {
    let backend = StubBackend::new();
    backend
        .script_detect(json!({ "lines": ["sign text", "small print"] }))
        .await;
    let service = start_pipeline(backend.clone(), 4 * 1024 * 1024).await;

    let outcome = service
        .extract(UploadRequest {
            content: vec![0x89, 0x50, 0x4e, 0x47],
            media_type: "image/png".into(),
            file_name: "sign.png".into(),
        })
        .await
        .expect("text");

    assert_eq!(outcome.text, "sign text\nsmall print");
    assert_eq!(backend.detects.load(Ordering::SeqCst), 1);
    assert_eq!(backend.puts.load(Ordering::SeqCst), 0);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 0);
}
