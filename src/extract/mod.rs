//! Extraction pipeline: direct extractors and the orchestrator.

pub mod direct;
pub mod service;
pub mod types;

pub use service::{ExtractionApi, ExtractionService};
pub use types::{ExtractError, ExtractionOutcome, UploadRequest};
