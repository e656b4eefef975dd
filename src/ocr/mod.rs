//! Asynchronous OCR job integration.
//!
//! `client` speaks the text-detection service's HTTP API; `driver` owns the
//! job lifecycle: staging, submission, polling, pagination, and cleanup.

pub mod client;
pub mod driver;

pub use client::{JobStatus, OcrClient, OcrJobError};
pub use driver::OcrJobDriver;
