#![deny(missing_docs)]

//! Core library for the docingest text-extraction service.

/// HTTP routing and REST handlers.
pub mod api;
/// Format classification for uploaded documents.
pub mod classify;
/// Environment-driven configuration management.
pub mod config;
/// Extraction pipeline: direct extractors and the orchestrator.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Extraction metrics helpers.
pub mod metrics;
/// Asynchronous OCR job client and driver.
pub mod ocr;
/// Object-store staging adapter for OCR inputs.
pub mod staging;
