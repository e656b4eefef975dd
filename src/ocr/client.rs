//! HTTP client wrapper for the asynchronous text-detection service.

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::get_config;
use crate::staging::{StagedObject, StagingError};

/// Errors produced while driving an OCR job to completion.
#[derive(Debug, Error)]
pub enum OcrJobError {
    /// Staging the input bytes failed before a job could be submitted.
    #[error("Failed to stage OCR input: {0}")]
    Staging(#[from] StagingError),
    /// Base URL failed to parse or normalize.
    #[error("Invalid OCR service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Service responded with an unexpected status code.
    #[error("Unexpected OCR service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The job reached the terminal failed state.
    #[error("OCR job failed: {message}")]
    JobFailed {
        /// Diagnostic reported by the service, if any.
        message: String,
    },
    /// The job did not reach a terminal state within the configured bound.
    #[error("OCR job timed out after {waited_secs}s")]
    Timeout {
        /// Seconds spent waiting before giving up.
        waited_secs: u64,
    },
    /// The wait was cancelled by process shutdown.
    #[error("OCR job wait cancelled")]
    Cancelled,
}

/// Terminal and non-terminal states reported for a text-detection job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The service is still processing the staged document.
    InProgress,
    /// Detection finished; result pages are available.
    Succeeded,
    /// Detection failed; no text is available.
    Failed,
}

/// One page of a job's results as returned by a status poll.
#[derive(Debug, Deserialize)]
pub struct JobStatusPage {
    /// Current job state.
    pub status: JobStatus,
    /// Detected text lines on this page, in source order.
    #[serde(default)]
    pub lines: Vec<String>,
    /// Cursor for the next page, when more results remain.
    #[serde(default)]
    pub next_token: Option<String>,
    /// Diagnostic attached to failed jobs.
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    lines: Vec<String>,
}

/// Lightweight HTTP client for the text-detection service.
pub struct OcrClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OcrClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, OcrJobError> {
        let config = get_config();
        Self::with_endpoint(&config.ocr_service_url, config.ocr_api_key.clone())
    }

    /// Construct a client against an explicit endpoint.
    pub fn with_endpoint(base_url: &str, api_key: Option<String>) -> Result<Self, OcrJobError> {
        let client = Client::builder().user_agent("docingest/0.1").build()?;
        let base_url = normalize_base_url(base_url).map_err(OcrJobError::InvalidUrl)?;
        tracing::debug!(url = %base_url, "Initialized OCR service client");

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Submit an asynchronous text-detection job referencing a staged object.
    pub async fn submit_job(&self, staged: &StagedObject) -> Result<String, OcrJobError> {
        let response = self
            .request(Method::POST, "text-detection/jobs")
            .json(&serde_json::json!({
                "bucket": staged.bucket,
                "key": staged.key,
            }))
            .send()
            .await?;

        let response = self.ensure_success(response).await?;
        let payload: SubmitResponse = response.json().await?;
        tracing::debug!(job_id = %payload.job_id, key = %staged.key, "Submitted OCR job");
        Ok(payload.job_id)
    }

    /// Fetch the current status of a job, optionally continuing a paginated result.
    pub async fn poll_job(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<JobStatusPage, OcrJobError> {
        let mut request = self.request(Method::GET, &format!("text-detection/jobs/{job_id}"));
        if let Some(token) = next_token {
            request = request.query(&[("next_token", token)]);
        }

        let response = self.ensure_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Run synchronous text detection on inline bytes, used for images.
    ///
    /// Images never leave through the staging store; the service reads the
    /// payload directly and responds in one round trip.
    pub async fn detect_text(&self, content: &[u8]) -> Result<Vec<String>, OcrJobError> {
        let response = self
            .request(Method::POST, "text-detection/detect")
            .header("content-type", "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await?;

        let response = self.ensure_success(response).await?;
        let payload: DetectResponse = response.json().await?;
        Ok(payload.lines)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("x-api-key", api_key);
        }
        req
    }

    async fn ensure_success(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OcrJobError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = OcrJobError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "OCR service request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
