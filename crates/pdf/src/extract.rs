use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use bilancio_core::{FiscalYear, Money, Section};

use crate::text::PdfError;
use crate::types::{ExtractedRow, ExtractedStatement, Layout};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_dare, r"(?i)\bdare\b");
re!(re_avere, r"(?i)\bavere\b");
re!(re_saldo, r"(?i)\bsaldo\b");
re!(re_totale, r"(?i)^\s*totale\b");
re!(re_page_marker, r"(?i)^\s*pag(?:ina)?\.?\s*\d+");
re!(re_esercizio, r"(?i)\besercizio\s+(\d{4})\b");
re!(re_chiusura, r"(?i)\bal\s+\d{1,2}[/.-]\d{1,2}[/.-](\d{4})\b");
// Fields are runs of tokens separated by single spaces; 2+ spaces (the
// reconstructed column gaps) split them.
re!(re_field, r"\S+(?: \S+)*");
// Fallback for single-space layouts: everything up to a trailing amount.
re!(re_line_amount, r"^(.+?)\s+((?:€\s*)?\(?-?[\d.,]+\)?-?)\s*$");

// ── Public parsing API ────────────────────────────────────────────────────────

/// Runs the layout heuristics over extracted PDF text. Tries the
/// verification-balance table first (a DARE/AVERE header anywhere in the
/// document), then falls back to the two-column statement shape.
pub fn parse_text(text: &str) -> Result<ExtractedStatement, PdfError> {
    let lines: Vec<&str> = text.lines().collect();
    let company = find_company(&lines);
    let fiscal_year = find_fiscal_year(text);

    let header = lines
        .iter()
        .position(|l| re_dare().is_match(l) && re_avere().is_match(l));

    let (layout, rows) = match header {
        Some(idx) => (
            Layout::VerificationBalance,
            parse_verification_balance(&lines[idx..]),
        ),
        None => (Layout::TwoColumn, parse_two_column(&lines)),
    };

    if rows.is_empty() {
        return Err(PdfError::NoTable);
    }

    let confidence = rows.iter().map(|r| r.confidence).sum::<f32>() / rows.len() as f32;
    debug!(?layout, rows = rows.len(), confidence, "statement text parsed");

    Ok(ExtractedStatement {
        company,
        fiscal_year,
        layout,
        rows,
        confidence,
    })
}

// ── Verification balance (DARE/AVERE/SALDO) ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Col {
    Dare,
    Avere,
    Saldo,
}

/// `lines[0]` is the header row. Column positions are estimated from the
/// header labels' character offsets; row cells are matched to the nearest
/// label when the counts disagree.
fn parse_verification_balance(lines: &[&str]) -> Vec<ExtractedRow> {
    let header = lines[0];
    let mut cols: Vec<(Col, usize)> = Vec::new();
    for (re, col) in [
        (re_dare(), Col::Dare),
        (re_avere(), Col::Avere),
        (re_saldo(), Col::Saldo),
    ] {
        if let Some(m) = re.find(header) {
            cols.push((col, (m.start() + m.end()) / 2));
        }
    }
    cols.sort_by_key(|&(_, center)| center);

    let mut rows = Vec::new();
    for line in &lines[1..] {
        if skip_line(line) {
            continue;
        }
        // Page breaks repeat the header.
        if re_dare().is_match(line) && re_avere().is_match(line) {
            continue;
        }

        let fields = split_fields(line);
        let numeric_tail = fields
            .iter()
            .rev()
            .take_while(|(_, tok)| is_amount(tok))
            .count();
        if numeric_tail == 0 {
            continue;
        }

        // More numbers than columns: the leading extras (account codes set
        // off by wide gaps) belong to the voce.
        let keep = numeric_tail.min(cols.len());
        let split_at = fields.len() - keep;
        let voce = fields[..split_at]
            .iter()
            .map(|(_, tok)| *tok)
            .collect::<Vec<_>>()
            .join(" ");
        if voce.is_empty() {
            continue;
        }

        let mut dare = None;
        let mut avere = None;
        let mut saldo_col = None;
        if keep == cols.len() {
            // One cell per column, in order.
            for (&(col, _), &(_, tok)) in cols.iter().zip(&fields[split_at..]) {
                assign(col, tok, &mut dare, &mut avere, &mut saldo_col);
            }
        } else {
            // Sparse row: match each cell to the nearest header label.
            for &(start, tok) in &fields[split_at..] {
                let center = start + tok.len() / 2;
                if let Some(&(col, _)) = cols
                    .iter()
                    .min_by_key(|&&(_, c)| c.abs_diff(center))
                {
                    assign(col, tok, &mut dare, &mut avere, &mut saldo_col);
                }
            }
        }

        let derived = dare.unwrap_or(Money::zero()) - avere.unwrap_or(Money::zero());
        let (saldo, confidence) = match (dare, avere, saldo_col) {
            (Some(_), Some(_), Some(s)) => {
                if derived == s {
                    (s, 0.95)
                } else {
                    // Inconsistent row: the printed saldo wins.
                    (s, 0.6)
                }
            }
            (_, _, Some(s)) => (s, 0.75),
            (Some(_), Some(_), None) => (derived, 0.8),
            _ => (derived, 0.6),
        };

        rows.push(ExtractedRow {
            voce,
            dare,
            avere,
            saldo,
            section: None,
            confidence,
        });
    }
    rows
}

fn assign(
    col: Col,
    tok: &str,
    dare: &mut Option<Money>,
    avere: &mut Option<Money>,
    saldo: &mut Option<Money>,
) {
    let value = tok.parse::<Money>().ok();
    match col {
        Col::Dare => *dare = value,
        Col::Avere => *avere = value,
        Col::Saldo => *saldo = value,
    }
}

// ── Two-column statement ─────────────────────────────────────────────────────

/// Description + amount lines, with section headers switching the current
/// section. Rows seen before any header stay unsectioned for downstream
/// inference.
fn parse_two_column(lines: &[&str]) -> Vec<ExtractedRow> {
    let mut rows = Vec::new();
    let mut section: Option<Section> = None;

    for line in lines {
        let trimmed = line.trim();
        if skip_line(trimmed) {
            continue;
        }
        if let Ok(s) = trimmed.parse::<Section>() {
            section = Some(s);
            continue;
        }

        let fields = split_fields(line);
        let parsed = if fields.len() >= 2 && is_amount(fields[fields.len() - 1].1) {
            let (desc, tail) = fields.split_at(fields.len() - 1);
            let voce = desc
                .iter()
                .map(|(_, tok)| *tok)
                .collect::<Vec<_>>()
                .join(" ");
            tail[0].1.parse::<Money>().ok().map(|amount| (voce, amount))
        } else {
            // Single-space layout: regex fallback.
            re_line_amount().captures(trimmed).and_then(|c| {
                let tok = c.get(2)?.as_str();
                if !is_amount(tok) {
                    return None;
                }
                let amount = tok.parse::<Money>().ok()?;
                Some((c.get(1)?.as_str().trim().to_string(), amount))
            })
        };

        let Some((voce, amount)) = parsed else {
            continue;
        };
        if voce.is_empty() {
            continue;
        }

        rows.push(ExtractedRow {
            voce,
            dare: None,
            avere: None,
            saldo: amount,
            section,
            confidence: if section.is_some() { 0.85 } else { 0.5 },
        });
    }
    rows
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn skip_line(line: &str) -> bool {
    line.trim().is_empty()
        || re_totale().is_match(line)
        || re_page_marker().is_match(line)
        || re_esercizio().is_match(line)
        || re_chiusura().is_match(line)
}

fn split_fields(line: &str) -> Vec<(usize, &str)> {
    re_field()
        .find_iter(line)
        .map(|m| (m.start(), m.as_str()))
        .collect()
}

fn is_amount(tok: &str) -> bool {
    tok.chars().any(|c| c.is_ascii_digit()) && tok.parse::<Money>().is_ok()
}

fn find_company(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(8)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .find(|l| {
            let lower = l.to_lowercase();
            l.chars().any(|c| c.is_alphabetic())
                && !l.chars().any(|c| c.is_ascii_digit())
                && l.parse::<Section>().is_err()
                && !lower.contains("bilancio")
                && !re_dare().is_match(l)
                && !re_avere().is_match(l)
                && (3..=60).contains(&l.chars().count())
        })
        .map(|l| l.to_string())
}

fn find_fiscal_year(text: &str) -> Option<FiscalYear> {
    let year = re_esercizio()
        .captures(text)
        .or_else(|| re_chiusura().captures(text))
        .and_then(|c| c.get(1)?.as_str().parse::<u16>().ok())?;
    (1900..2100).contains(&year).then(|| FiscalYear::new(year))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const VERIFICA: &str = "\
Rossi S.r.l.
Bilancio di verifica al 31/12/2023

Conto                                DARE         AVERE         SALDO
Cassa contanti                    1.200,00          0,00      1.200,00
Depositi bancari                 12.500,00          0,00     12.500,00
Crediti v/clienti                 8.300,50          0,00      8.300,50
Debiti verso fornitori                0,00      6.100,00     -6.100,00
Capitale sociale                      0,00     10.000,00    -10.000,00
Ricavi delle vendite                  0,00     95.000,00    -95.000,00
Costi per servizi                24.000,00          0,00     24.000,00
TOTALE                           46.000,50    111.100,00    -65.099,50
";

    #[test]
    fn verification_balance_layout_detected() {
        let s = parse_text(VERIFICA).unwrap();
        assert_eq!(s.layout, Layout::VerificationBalance);
        assert_eq!(s.rows.len(), 7); // TOTALE skipped
    }

    #[test]
    fn verification_balance_signed_saldi() {
        let s = parse_text(VERIFICA).unwrap();
        assert_eq!(s.rows[0].voce, "Cassa contanti");
        assert_eq!(s.rows[0].saldo.cents(), 120000);
        assert_eq!(s.rows[3].voce, "Debiti verso fornitori");
        assert_eq!(s.rows[3].saldo.cents(), -610000);
        assert_eq!(s.rows[3].avere.unwrap().cents(), 610000);
    }

    #[test]
    fn verification_balance_consistent_rows_high_confidence() {
        let s = parse_text(VERIFICA).unwrap();
        assert!(s.confidence > 0.9, "confidence was {}", s.confidence);
        assert!(!s.needs_review());
    }

    #[test]
    fn verification_metadata_recovered() {
        let s = parse_text(VERIFICA).unwrap();
        assert_eq!(s.company.as_deref(), Some("Rossi S.r.l."));
        assert_eq!(s.fiscal_year, Some(FiscalYear::new(2023)));
    }

    #[test]
    fn verification_without_saldo_column_derives_balance() {
        let text = "\
Conto                                DARE         AVERE
Cassa                             1.200,00          0,00
Debiti verso fornitori                0,00      6.100,00
";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows[0].saldo.cents(), 120000);
        assert_eq!(s.rows[1].saldo.cents(), -610000);
    }

    #[test]
    fn verification_inconsistent_saldo_flagged() {
        let text = "\
Conto              DARE      AVERE      SALDO
Voce strana       10,00       0,00      99,00
";
        let s = parse_text(text).unwrap();
        // Printed saldo wins, at reduced confidence.
        assert_eq!(s.rows[0].saldo.cents(), 9900);
        assert!(s.rows[0].confidence < 0.7);
    }

    #[test]
    fn verification_trailing_minus_saldo() {
        let text = "\
Conto                     DARE       AVERE        SALDO
Debiti tributari          0,00    2.000,00     2.000,00-
";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows[0].saldo.cents(), -200000);
    }

    #[test]
    fn verification_account_codes_stay_in_voce() {
        let text = "\
Conto                             DARE       AVERE        SALDO
1501  Banca Intesa c/c        5.000,00        0,00     5.000,00
";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows[0].voce, "1501 Banca Intesa c/c");
        assert_eq!(s.rows[0].saldo.cents(), 500000);
    }

    #[test]
    fn verification_repeated_header_skipped() {
        let text = "\
Conto              DARE      AVERE      SALDO
Cassa             10,00       0,00      10,00
Conto              DARE      AVERE      SALDO
Banca             20,00       0,00      20,00
";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows.len(), 2);
    }

    const DUE_COLONNE: &str = "\
Bianchi S.n.c.
Bilancio al 31/12/2022

STATO PATRIMONIALE ATTIVO
Depositi bancari                12.500,00
Crediti v/clienti                8.300,50
Rimanenze                        4.000,00
TOTALE ATTIVO                   24.800,50

STATO PATRIMONIALE PASSIVO
Debiti verso fornitori           6.100,00
Capitale sociale                10.000,00

CONTO ECONOMICO
Ricavi delle vendite            95.000,00
Costi per servizi               24.000,00
";

    #[test]
    fn two_column_layout_with_sections() {
        let s = parse_text(DUE_COLONNE).unwrap();
        assert_eq!(s.layout, Layout::TwoColumn);
        assert_eq!(s.rows.len(), 7); // TOTALE skipped
        assert_eq!(s.rows[0].section, Some(Section::Attivita));
        assert_eq!(s.rows[3].section, Some(Section::Passivita));
        assert_eq!(s.rows[5].section, Some(Section::ContoEconomico));
        assert_eq!(s.rows[5].voce, "Ricavi delle vendite");
        assert_eq!(s.rows[5].saldo.cents(), 9500000);
    }

    #[test]
    fn two_column_metadata() {
        let s = parse_text(DUE_COLONNE).unwrap();
        assert_eq!(s.company.as_deref(), Some("Bianchi S.n.c."));
        assert_eq!(s.fiscal_year, Some(FiscalYear::new(2022)));
    }

    #[test]
    fn two_column_single_space_fallback() {
        let text = "ATTIVITA'\nCassa 1.200,00\nBanca 3.400,00\n";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows.len(), 2);
        assert_eq!(s.rows[0].voce, "Cassa");
        assert_eq!(s.rows[0].saldo.cents(), 120000);
    }

    #[test]
    fn two_column_rows_before_any_header_low_confidence() {
        let text = "Cassa                 1.200,00\n";
        let s = parse_text(text).unwrap();
        assert!(s.rows[0].section.is_none());
        assert!(s.rows[0].confidence < 0.7);
        assert!(s.needs_review());
    }

    #[test]
    fn prose_only_text_is_no_table() {
        let err = parse_text("Relazione sulla gestione\nandamento positivo\n").unwrap_err();
        assert!(matches!(err, PdfError::NoTable));
    }

    #[test]
    fn esercizio_line_is_metadata_not_a_row() {
        let text = "Esercizio  2023\nATTIVITA'\nCassa   1.000,00\n";
        let s = parse_text(text).unwrap();
        assert_eq!(s.rows.len(), 1);
        assert_eq!(s.fiscal_year, Some(FiscalYear::new(2023)));
    }
}
