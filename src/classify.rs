//! Format classification for uploaded documents.
//!
//! The classifier is the single source of routing truth: it inspects the
//! declared media type, the file name, and the byte length, and produces one
//! routing decision per upload. It is pure and deterministic so the
//! orchestrator's fallback logic and the tests can rely on it.

/// Routing decision derived from upload metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// PDF below the size threshold; try the embedded text layer first.
    TextPdf,
    /// PDF at or above the size threshold; presumed scanned, routed to OCR.
    ScannedPdf,
    /// Word document, selected by file extension.
    WordDoc,
    /// Plain UTF-8 text.
    PlainText,
    /// Raster image routed to text recognition.
    Image,
    /// No known format matched; terminal.
    Unsupported,
}

impl RoutingDecision {
    /// Short label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextPdf => "text-pdf",
            Self::ScannedPdf => "scanned-pdf",
            Self::WordDoc => "word-doc",
            Self::PlainText => "plain-text",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Classify an upload by declared media type, file name, and byte length.
///
/// Rules apply in priority order: PDF media type wins over a Word extension,
/// and the Word extension check deliberately ignores the declared media type
/// because clients report Word MIME types inconsistently.
pub fn classify(
    media_type: &str,
    file_name: &str,
    byte_len: usize,
    pdf_ocr_threshold: usize,
) -> RoutingDecision {
    if media_type.contains("pdf") {
        return if byte_len < pdf_ocr_threshold {
            RoutingDecision::TextPdf
        } else {
            RoutingDecision::ScannedPdf
        };
    }
    if has_word_extension(file_name) {
        return RoutingDecision::WordDoc;
    }
    if media_type == "text/plain" {
        return RoutingDecision::PlainText;
    }
    if media_type.starts_with("image/") {
        return RoutingDecision::Image;
    }
    RoutingDecision::Unsupported
}

fn has_word_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".doc") || lower.ends_with(".docx")
}
