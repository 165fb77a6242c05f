use std::path::Path;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
    #[error("PDF contains no extractable text (image-only scan?)")]
    NoText,
    #[error("No statement table recognized in the extracted text")]
    NoTable,
}

/// Pulls the text layer out of a PDF. Layout is whatever `pdf-extract`
/// reconstructs: lines in reading order, columns approximated with spaces;
/// the parsing heuristics downstream are built for exactly that shape.
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<String, PdfError> {
    let path = path.as_ref();
    let text =
        pdf_extract::extract_text(path).map_err(|e| PdfError::Extraction(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(PdfError::NoText);
    }

    info!(path = %path.display(), chars = text.len(), "pdf text extracted");
    Ok(text)
}
