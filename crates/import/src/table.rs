use tracing::warn;

use bilancio_core::{Money, Section, Voice};

use crate::util::normalize;

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    pub voce: usize,
    pub importo: usize,
    pub sezione: Option<usize>,
}

const VOCE_HEADERS: &[&str] = &["voce", "descrizione", "conto", "voce di bilancio"];
const IMPORTO_HEADERS: &[&str] = &["importo", "saldo", "valore"];
const SEZIONE_HEADERS: &[&str] = &["sezione", "sez.", "sez"];

fn find_column(cells: &[String], names: &[&str]) -> Option<usize> {
    cells.iter().position(|c| {
        let h = normalize(c);
        names.iter().any(|n| h == *n || h.starts_with(&format!("{n} ")))
    })
}

/// Scans the first rows of a sheet for the header row. Exports often put the
/// company name and the closing date above the actual table.
pub(crate) fn detect_header(rows: &[Vec<String>], scan_limit: usize) -> Option<(usize, ColumnMap)> {
    rows.iter().take(scan_limit).enumerate().find_map(|(idx, cells)| {
        let voce = find_column(cells, VOCE_HEADERS)?;
        let importo = find_column(cells, IMPORTO_HEADERS)?;
        let sezione = find_column(cells, SEZIONE_HEADERS);
        Some((idx, ColumnMap { voce, importo, sezione }))
    })
}

/// True when some scanned row carries a voce-like header. Used to tell
/// "missing IMPORTO" apart from "not a statement at all".
pub(crate) fn has_voce_header(rows: &[Vec<String>], scan_limit: usize) -> bool {
    rows.iter()
        .take(scan_limit)
        .any(|cells| find_column(cells, VOCE_HEADERS).is_some())
}

/// Maps one data row to a statement line. Unusable rows are skipped with a
/// warning rather than failing the whole import.
pub(crate) fn map_row(cells: &[String], map: &ColumnMap, row_number: usize) -> Option<Voice> {
    let voce = cells.get(map.voce).map(|s| s.trim()).unwrap_or_default();
    if voce.is_empty() {
        return None;
    }

    let raw_amount = cells.get(map.importo).map(|s| s.trim()).unwrap_or_default();
    let amount = match raw_amount.parse::<Money>() {
        Ok(m) => m,
        Err(_) => {
            warn!(row = row_number, voce, raw_amount, "skipping row with unparseable importo");
            return None;
        }
    };

    let section = map.sezione.and_then(|col| {
        let raw = cells.get(col).map(|s| s.trim()).unwrap_or_default();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<Section>() {
            Ok(s) => Some(s),
            Err(_) => {
                warn!(row = row_number, voce, raw, "unknown sezione label, leaving row unsectioned");
                None
            }
        }
    });

    Some(Voice::new(voce, amount, section))
}
