use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::debug;

use bilancio_core::Statement;

use crate::table::{detect_header, has_voce_header, map_row};

const HEADER_SCAN_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Workbook has no usable worksheet")]
    NoWorksheet,
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("No data rows")]
    NoDataRows,
}

/// Imports the first worksheet that carries a VOCE/IMPORTO table. Exports
/// commonly put the statement on sheet one, but some gestionali add a cover
/// sheet first.
pub fn import_sheet<P: AsRef<Path>>(path: P) -> Result<Statement, SheetError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;

    let mut saw_voce_header = false;
    for name in workbook.sheet_names().to_vec() {
        let range = workbook.worksheet_range(&name)?;
        if range.is_empty() {
            continue;
        }

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|cells| cells.iter().map(cell_to_string).collect())
            .collect();

        saw_voce_header |= has_voce_header(&rows, HEADER_SCAN_LIMIT);
        let Some((header_idx, map)) = detect_header(&rows, HEADER_SCAN_LIMIT) else {
            continue;
        };
        debug!(sheet = %name, header_row = header_idx, "statement table found");

        let voices: Vec<_> = rows[header_idx + 1..]
            .iter()
            .enumerate()
            .filter_map(|(i, cells)| map_row(cells, &map, header_idx + 2 + i))
            .collect();

        if voices.is_empty() {
            return Err(SheetError::NoDataRows);
        }
        return Ok(Statement::new(voices));
    }

    if saw_voce_header {
        Err(SheetError::MissingColumn("IMPORTO".to_string()))
    } else {
        Err(SheetError::NoWorksheet)
    }
}

/// Cells go through the same string pipeline as CSV fields so the Italian
/// amount parser stays the single source of numeric truth.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f:.2}")
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}
