//! Lifecycle driver for asynchronous OCR jobs.
//!
//! Within one request the order is fixed: stage, submit, poll, fetch result
//! pages, delete the staged object. Deletion happens on every exit path once
//! bytes have been staged, including job failure, timeout, and cancellation.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::ocr::client::{JobStatus, JobStatusPage, OcrClient, OcrJobError};
use crate::staging::{StagedObject, StagingClient};

/// Drives one OCR job per call: staging, submission, bounded polling,
/// result pagination, and staged-object cleanup.
pub struct OcrJobDriver {
    staging: StagingClient,
    ocr: OcrClient,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl OcrJobDriver {
    /// Assemble a driver from its clients and timing parameters.
    pub fn new(
        staging: StagingClient,
        ocr: OcrClient,
        poll_interval: Duration,
        job_timeout: Duration,
    ) -> Self {
        Self {
            staging,
            ocr,
            poll_interval,
            job_timeout,
        }
    }

    /// Extract text from document bytes through the asynchronous job path.
    ///
    /// Stages the bytes under a unique key, submits a detection job, waits for
    /// a terminal status, and assembles the paginated line results. The staged
    /// object is deleted best-effort regardless of the outcome.
    pub async fn extract_text(
        &self,
        content: &[u8],
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<String, OcrJobError> {
        let staged = self.staging.put_object(content, file_name).await?;
        let result = self.run_job(&staged, cancel).await;
        self.staging.delete_object(&staged).await;
        result
    }

    /// Extract text from an image through the synchronous detect endpoint.
    ///
    /// Functionally equivalent to the job path, minus the staging step: the
    /// bytes never leave the request.
    pub async fn detect_image_text(&self, content: &[u8]) -> Result<String, OcrJobError> {
        let lines = self.ocr.detect_text(content).await?;
        Ok(lines.join("\n"))
    }

    async fn run_job(
        &self,
        staged: &StagedObject,
        cancel: &CancellationToken,
    ) -> Result<String, OcrJobError> {
        let job_id = self.ocr.submit_job(staged).await?;
        let deadline = Instant::now() + self.job_timeout;

        let terminal = self.await_terminal_status(&job_id, deadline, cancel).await?;
        if terminal.status == JobStatus::Failed {
            let message = terminal
                .status_message
                .unwrap_or_else(|| "no diagnostic provided".to_string());
            tracing::warn!(job_id = %job_id, message = %message, "OCR job failed");
            return Err(OcrJobError::JobFailed { message });
        }

        // The terminal poll response carries the first result page.
        let mut lines = terminal.lines;
        let mut token = terminal.next_token;
        let mut pages = 1u32;
        while let Some(next) = token {
            let page = self.ocr.poll_job(&job_id, Some(&next)).await?;
            lines.extend(page.lines);
            token = page.next_token;
            pages += 1;
        }

        tracing::debug!(job_id = %job_id, pages, lines = lines.len(), "OCR job assembled");
        Ok(lines.join("\n"))
    }

    async fn await_terminal_status(
        &self,
        job_id: &str,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<JobStatusPage, OcrJobError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(job_id = %job_id, "OCR wait cancelled");
                    return Err(OcrJobError::Cancelled);
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let page = self.ocr.poll_job(job_id, None).await?;
            if page.status != JobStatus::InProgress {
                return Ok(page);
            }
            if Instant::now() >= deadline {
                tracing::warn!(job_id = %job_id, "OCR job exceeded wait bound");
                return Err(OcrJobError::Timeout {
                    waited_secs: self.job_timeout.as_secs(),
                });
            }
            tracing::trace!(job_id = %job_id, "OCR job still in progress");
        }
    }
}
