//! HTTP adapter for the object store used to stage OCR inputs.
//!
//! The OCR job service reads staged bytes by reference, so the driver writes
//! each upload under a unique key before submitting a job and removes it once
//! the job reaches a terminal state. Deletion is best-effort: a leftover
//! object must never mask the primary extraction result.

use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use uuid::Uuid;

use crate::config::get_config;

/// Errors returned while interacting with the staging store.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid staging store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("Staging request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Store responded with an unexpected status code.
    #[error("Unexpected staging store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Bytes temporarily held in the object store for the span of one OCR job.
///
/// Owned exclusively by the OCR job driver; deleted on every exit path.
#[derive(Debug, Clone)]
pub struct StagedObject {
    /// Bucket holding the staged bytes.
    pub bucket: String,
    /// Unique object key within the bucket.
    pub key: String,
}

/// Lightweight HTTP client for staging-store put/delete operations.
pub struct StagingClient {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl StagingClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, StagingError> {
        let config = get_config();
        Self::with_endpoint(
            &config.staging_store_url,
            config.staging_bucket.clone(),
            config.staging_api_key.clone(),
        )
    }

    /// Construct a client against an explicit endpoint and bucket.
    pub fn with_endpoint(
        base_url: &str,
        bucket: String,
        api_key: Option<String>,
    ) -> Result<Self, StagingError> {
        let client = Client::builder().user_agent("docingest/0.1").build()?;
        let base_url = normalize_base_url(base_url).map_err(StagingError::InvalidUrl)?;
        tracing::debug!(url = %base_url, bucket = %bucket, "Initialized staging store client");

        Ok(Self {
            client,
            base_url,
            bucket,
            api_key,
        })
    }

    /// Write bytes under a freshly generated unique key and return the handle.
    ///
    /// Keys follow `uploads/{uuid}.{ext}`; the UUID makes cross-request
    /// collisions negligible, so no locking is needed on the shared bucket.
    pub async fn put_object(
        &self,
        content: &[u8],
        file_name: &str,
    ) -> Result<StagedObject, StagingError> {
        let key = generate_object_key(file_name);
        let response = self
            .request(Method::PUT, &self.bucket, &key)
            .body(content.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StagingError::UnexpectedStatus { status, body };
            tracing::error!(key = %key, error = %error, "Failed to stage object");
            return Err(error);
        }

        tracing::debug!(bucket = %self.bucket, key = %key, bytes = content.len(), "Staged object");
        Ok(StagedObject {
            bucket: self.bucket.clone(),
            key,
        })
    }

    /// Delete a staged object, best-effort.
    ///
    /// Failures are logged and swallowed so they never mask the extraction
    /// outcome the caller is about to return.
    pub async fn delete_object(&self, staged: &StagedObject) {
        let result = self
            .request(Method::DELETE, &staged.bucket, &staged.key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(key = %staged.key, "Deleted staged object");
            }
            Ok(response) => {
                tracing::warn!(
                    key = %staged.key,
                    status = %response.status(),
                    "Failed to delete staged object"
                );
            }
            Err(err) => {
                tracing::warn!(key = %staged.key, error = %err, "Failed to delete staged object");
            }
        }
    }

    fn request(&self, method: Method, bucket: &str, key: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{bucket}/{key}", self.base_url.trim_end_matches('/'));
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("x-api-key", api_key);
        }
        req
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

/// Generate a unique staging key preserving the upload's extension.
fn generate_object_key(file_name: &str) -> String {
    let id = Uuid::new_v4();
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => {
            format!("uploads/{id}.{}", ext.to_ascii_lowercase())
        }
        _ => format!("uploads/{id}"),
    }
}
