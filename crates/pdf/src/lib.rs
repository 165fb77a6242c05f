pub mod extract;
pub mod text;
pub mod types;

pub use extract::parse_text;
pub use text::PdfError;
pub use types::{ExtractedRow, ExtractedStatement, Layout};

use std::path::Path;

/// Extracts and parses a statement from a text-based PDF. Image-only scans
/// fail with [`PdfError::NoText`]; there is no OCR fallback.
pub fn extract_statement<P: AsRef<Path>>(path: P) -> Result<ExtractedStatement, PdfError> {
    let text = text::extract_file(path)?;
    extract::parse_text(&text)
}
