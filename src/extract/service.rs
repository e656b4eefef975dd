//! Extraction orchestrator coordinating classification, direct extraction,
//! and the asynchronous OCR path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::classify::{RoutingDecision, classify};
use crate::config::get_config;
use crate::extract::direct;
use crate::extract::types::{ExtractError, ExtractionOutcome, UploadRequest};
use crate::metrics::{ExtractionMetrics, MetricsSnapshot};
use crate::ocr::{OcrClient, OcrJobDriver};
use crate::staging::StagingClient;

/// Coordinates the full extraction pipeline: routing, direct extraction,
/// OCR fallback, and result validation.
///
/// The service owns long-lived handles to the staging store, the OCR service,
/// and the metrics registry. Construct it once near process start and share
/// it through an `Arc`; requests never share mutable state beyond these
/// handles.
pub struct ExtractionService {
    driver: OcrJobDriver,
    fetch_client: reqwest::Client,
    pdf_ocr_threshold: usize,
    metrics: Arc<ExtractionMetrics>,
    shutdown: CancellationToken,
}

/// Abstraction over the extraction pipeline used by external surfaces.
#[async_trait]
pub trait ExtractionApi: Send + Sync {
    /// Classify a file payload, extract its text, and validate the result.
    async fn extract(&self, upload: UploadRequest) -> Result<ExtractionOutcome, ExtractError>;

    /// Download a document by URL and run it through the same pipeline.
    async fn extract_url(&self, url: &str) -> Result<ExtractionOutcome, ExtractError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ExtractionService {
    /// Build a new extraction service from the environment configuration.
    ///
    /// The cancellation token is observed during OCR waits: on shutdown the
    /// driver still deletes staged objects before returning.
    pub fn new(shutdown: CancellationToken) -> Result<Self, ExtractError> {
        let config = get_config();
        let staging = StagingClient::new().map_err(crate::ocr::OcrJobError::from)?;
        let ocr = OcrClient::new()?;
        let driver = OcrJobDriver::new(
            staging,
            ocr,
            Duration::from_millis(config.ocr_poll_interval_ms),
            Duration::from_secs(config.ocr_job_timeout_secs),
        );
        Ok(Self::from_parts(
            driver,
            config.pdf_ocr_threshold_bytes,
            shutdown,
        ))
    }

    /// Assemble a service from explicit components.
    pub fn from_parts(
        driver: OcrJobDriver,
        pdf_ocr_threshold: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            driver,
            fetch_client: reqwest::Client::new(),
            pdf_ocr_threshold,
            metrics: Arc::new(ExtractionMetrics::new()),
            shutdown,
        }
    }

    /// Classify one upload, run the selected extractor, and validate the text.
    pub async fn extract(
        &self,
        upload: UploadRequest,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let route = classify(
            &upload.media_type,
            &upload.file_name,
            upload.content.len(),
            self.pdf_ocr_threshold,
        );
        tracing::info!(
            route = route.as_str(),
            media_type = %upload.media_type,
            file = %upload.file_name,
            bytes = upload.content.len(),
            "Routing upload"
        );

        let mut used_ocr_fallback = false;
        let text = match route {
            RoutingDecision::TextPdf => {
                let text = direct::extract_pdf_text(&upload.content).await?;
                if text.trim().is_empty() {
                    // Image-based PDF despite its small size; one fallback, never a loop.
                    used_ocr_fallback = true;
                    self.metrics.record_ocr_fallback();
                    tracing::info!(file = %upload.file_name, "Empty PDF text layer; falling back to OCR");
                    self.run_ocr_job(&upload).await?
                } else {
                    text
                }
            }
            RoutingDecision::ScannedPdf => self.run_ocr_job(&upload).await?,
            RoutingDecision::WordDoc => direct::extract_docx_text(&upload.content).await?,
            RoutingDecision::PlainText => direct::decode_plain_text(&upload.content)?,
            RoutingDecision::Image => self.driver.detect_image_text(&upload.content).await?,
            RoutingDecision::Unsupported => {
                return Err(ExtractError::UnsupportedFileType(upload.media_type));
            }
        };

        if text.trim().is_empty() {
            return Err(ExtractError::NoTextExtracted);
        }

        self.metrics.record_document();
        tracing::info!(
            route = route.as_str(),
            chars = text.len(),
            used_ocr_fallback,
            "Extraction completed"
        );
        Ok(ExtractionOutcome {
            text,
            route,
            used_ocr_fallback,
        })
    }

    /// Fetch a document by URL and extract it with the same pipeline.
    pub async fn extract_url(&self, url: &str) -> Result<ExtractionOutcome, ExtractError> {
        let response = self
            .fetch_client
            .get(url)
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await
            .map_err(|err| ExtractError::Fetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractError::Fetch(format!(
                "unexpected status {} from {url}",
                response.status()
            )));
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_default();
        let file_name = file_name_from_url(url);
        let content = response
            .bytes()
            .await
            .map_err(|err| ExtractError::Fetch(err.to_string()))?
            .to_vec();

        self.extract(UploadRequest {
            content,
            media_type,
            file_name,
        })
        .await
    }

    /// Return the current extraction metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn run_ocr_job(&self, upload: &UploadRequest) -> Result<String, ExtractError> {
        self.metrics.record_ocr_job();
        let text = self
            .driver
            .extract_text(&upload.content, &upload.file_name, &self.shutdown)
            .await?;
        Ok(text)
    }
}

#[async_trait]
impl ExtractionApi for ExtractionService {
    async fn extract(&self, upload: UploadRequest) -> Result<ExtractionOutcome, ExtractError> {
        ExtractionService::extract(self, upload).await
    }

    async fn extract_url(&self, url: &str) -> Result<ExtractionOutcome, ExtractError> {
        ExtractionService::extract_url(self, url).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ExtractionService::metrics_snapshot(self)
    }
}

/// Derive a file name from the last URL path segment.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| format!("file-{}", Uuid::new_v4()))
}
