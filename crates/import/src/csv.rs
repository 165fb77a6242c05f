use std::io::Read;

use thiserror::Error;
use tracing::debug;

use bilancio_core::Statement;

use crate::table::{detect_header, has_voce_header, map_row};

/// How many leading rows may precede the header (title, company, date).
const HEADER_SCAN_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("No data rows")]
    NoDataRows,
}

/// Imports a VOCE/IMPORTO/SEZIONE statement export. The delimiter is sniffed
/// from the content: Italian exports favour `;` (comma is the decimal sign),
/// but `,` and tab separated files show up too.
pub fn import_csv<R: Read>(mut data: R) -> Result<Statement, CsvError> {
    let mut buf = Vec::new();
    data.read_to_end(&mut buf)?;
    let content = String::from_utf8_lossy(&buf);

    let delimiter = sniff_delimiter(&content);
    debug!(delimiter = ?(delimiter as char), "csv delimiter sniffed");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    let (header_idx, map) = detect_header(&rows, HEADER_SCAN_LIMIT).ok_or_else(|| {
        if has_voce_header(&rows, HEADER_SCAN_LIMIT) {
            CsvError::MissingColumn("IMPORTO".to_string())
        } else {
            CsvError::MissingColumn("VOCE".to_string())
        }
    })?;

    let voices: Vec<_> = rows[header_idx + 1..]
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| map_row(cells, &map, header_idx + 2 + i))
        .collect();

    if voices.is_empty() {
        return Err(CsvError::NoDataRows);
    }

    Ok(Statement::new(voices))
}

/// Picks the separator with the most occurrences in the first non-empty
/// line; ties go to `;`.
fn sniff_delimiter(content: &str) -> u8 {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    // max_by_key keeps the last max, so list the preferred delimiter last.
    [b'\t', b',', b';']
        .into_iter()
        .max_by_key(|&d| first_line.bytes().filter(|&b| b == d).count())
        .unwrap_or(b';')
}
