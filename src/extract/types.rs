//! Core data types and error definitions for the extraction pipeline.

use thiserror::Error;

use crate::classify::RoutingDecision;
use crate::ocr::OcrJobError;

/// One file payload submitted for extraction.
///
/// Immutable once received; consumed by a single orchestrator call and never
/// persisted by this pipeline.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Raw byte content of the file.
    pub content: Vec<u8>,
    /// Media type declared by the submitting client.
    pub media_type: String,
    /// Original file name, used for extension-based routing and staging keys.
    pub file_name: String,
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Normalized plain text, guaranteed non-empty.
    pub text: String,
    /// Routing decision that produced the text.
    pub route: RoutingDecision,
    /// Whether an empty PDF text layer triggered the OCR fallback.
    pub used_ocr_fallback: bool,
}

/// Errors emitted by the extraction pipeline.
///
/// All failures are normalized into this taxonomy at the orchestrator
/// boundary; nothing crosses the system boundary unwrapped.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The classifier matched no known format; terminal, no extraction attempted.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// Plain-text bytes were not valid UTF-8.
    #[error("Invalid text encoding: {0}")]
    Decoding(String),
    /// Document bytes did not form a recognized container for their route.
    #[error("Unrecognized document format: {0}")]
    UnsupportedDocFormat(String),
    /// Downloading a document by URL failed.
    #[error("Failed to fetch document: {0}")]
    Fetch(String),
    /// The staging store or OCR job service reported a failure.
    #[error("OCR extraction failed: {0}")]
    OcrJob(#[from] OcrJobError),
    /// Every extraction step succeeded mechanically but produced no usable text.
    #[error("No text extracted")]
    NoTextExtracted,
    /// A blocking extraction task failed to complete.
    #[error("Internal extraction failure: {0}")]
    Internal(String),
}
