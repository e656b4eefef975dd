use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing extraction activity.
#[derive(Default)]
pub struct ExtractionMetrics {
    documents_extracted: AtomicU64,
    ocr_jobs_run: AtomicU64,
    ocr_fallbacks: AtomicU64,
}

impl ExtractionMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document whose extraction produced usable text.
    pub fn record_document(&self) {
        self.documents_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an asynchronous OCR job attempt, whatever its outcome.
    pub fn record_ocr_job(&self) {
        self.ocr_jobs_run.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a text-layer PDF that fell back to the OCR path.
    pub fn record_ocr_fallback(&self) {
        self.ocr_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            ocr_jobs_run: self.ocr_jobs_run.load(Ordering::Relaxed),
            ocr_fallbacks: self.ocr_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of extraction counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents successfully extracted since startup.
    pub documents_extracted: u64,
    /// Number of asynchronous OCR job attempts since startup.
    pub ocr_jobs_run: u64,
    /// Number of text-layer PDFs that required the OCR fallback.
    pub ocr_fallbacks: u64,
}
