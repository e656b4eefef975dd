//! Synchronous in-process extractors for plain text, Word documents, and PDF
//! text layers.
//!
//! These converters make no external service calls. The PDF extractor treats
//! empty output as a routing signal rather than an error: the orchestrator
//! decides whether to fall back to OCR.

use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableChild, TableRowChild};

use crate::extract::types::ExtractError;

/// Decode plain-text bytes as UTF-8, verbatim.
pub fn decode_plain_text(content: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(content.to_vec()).map_err(|err| ExtractError::Decoding(err.to_string()))
}

/// Extract the embedded text layer of a PDF.
///
/// Returns whatever the text layer yields, including an empty string for
/// image-based PDFs; callers interpret emptiness. Parse failures mean the
/// bytes are not a readable PDF.
pub async fn extract_pdf_text(content: &[u8]) -> Result<String, ExtractError> {
    let bytes = content.to_vec();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|err| ExtractError::Internal(err.to_string()))?
        .map_err(|err| {
            ExtractError::UnsupportedDocFormat(format!("not a readable PDF: {err}"))
        })?;
    Ok(text)
}

/// Extract the body text of a Word document, discarding formatting.
///
/// Paragraphs and table cells are emitted in document order, newline-joined.
pub async fn extract_docx_text(content: &[u8]) -> Result<String, ExtractError> {
    let bytes = content.to_vec();
    tokio::task::spawn_blocking(move || extract_docx_sync(&bytes))
        .await
        .map_err(|err| ExtractError::Internal(err.to_string()))?
}

fn extract_docx_sync(content: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(content).map_err(|err| {
        ExtractError::UnsupportedDocFormat(format!("not a readable Word document: {err}"))
    })?;

    let mut parts: Vec<String> = Vec::new();
    for child in docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                push_non_blank(&mut parts, paragraph_text(&paragraph));
            }
            DocumentChild::Table(table) => {
                for row in &table.rows {
                    let TableChild::TableRow(row) = row;
                    for cell in &row.cells {
                        let TableRowChild::TableCell(cell) = cell;
                        for content in &cell.children {
                            if let docx_rs::TableCellContent::Paragraph(paragraph) = content {
                                push_non_blank(&mut parts, paragraph_text(paragraph));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(parts.join("\n"))
}

fn push_non_blank(parts: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        parts.push(text);
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => append_run_text(&mut text, run),
            ParagraphChild::Hyperlink(link) => {
                for child in &link.children {
                    if let ParagraphChild::Run(run) = child {
                        append_run_text(&mut text, run);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn append_run_text(text: &mut String, run: &docx_rs::Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}
