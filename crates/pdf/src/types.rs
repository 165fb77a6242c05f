use serde::{Deserialize, Serialize};

use bilancio_core::{FiscalYear, Money, Section, Statement, Voice};

/// Which layout heuristic recognized the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Ledger export with DARE / AVERE (/ SALDO) columns.
    VerificationBalance,
    /// Plain statement: description column plus one amount column, with
    /// section header lines in between.
    TwoColumn,
}

/// One extracted line with the raw column values it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRow {
    pub voce: String,
    pub dare: Option<Money>,
    pub avere: Option<Money>,
    /// Signed balance: dare-side positive, avere-side negative.
    pub saldo: Money,
    pub section: Option<Section>,
    /// Confidence in this row's extraction (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedStatement {
    pub company: Option<String>,
    pub fiscal_year: Option<FiscalYear>,
    pub layout: Layout,
    pub rows: Vec<ExtractedRow>,
    /// Aggregate confidence across all rows (0.0–1.0).
    pub confidence: f32,
}

impl ExtractedStatement {
    /// Whether the extraction is good enough to use without a human pass.
    pub fn needs_review(&self) -> bool {
        self.confidence < 0.7
    }

    /// Hands the rows over to the classification pipeline. Signed saldi are
    /// kept as-is: section inference downstream needs the sign.
    pub fn into_statement(self) -> Statement {
        let rows = self
            .rows
            .into_iter()
            .map(|r| Voice::new(r.voce, r.saldo, r.section))
            .collect();
        Statement {
            rows,
            company: self.company,
            fiscal_year: self.fiscal_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(voce: &str, saldo: i64, confidence: f32) -> ExtractedRow {
        ExtractedRow {
            voce: voce.to_string(),
            dare: None,
            avere: None,
            saldo: Money::from_cents(saldo),
            section: None,
            confidence,
        }
    }

    #[test]
    fn needs_review_threshold() {
        let mut s = ExtractedStatement {
            company: None,
            fiscal_year: None,
            layout: Layout::TwoColumn,
            rows: vec![],
            confidence: 0.5,
        };
        assert!(s.needs_review());
        s.confidence = 0.9;
        assert!(!s.needs_review());
    }

    #[test]
    fn into_statement_keeps_sign_and_metadata() {
        let s = ExtractedStatement {
            company: Some("Rossi S.r.l.".to_string()),
            fiscal_year: Some(FiscalYear::new(2023)),
            layout: Layout::VerificationBalance,
            rows: vec![row("Cassa", 50000, 0.9), row("Fornitori", -30000, 0.9)],
            confidence: 0.9,
        };
        let stmt = s.into_statement();
        assert_eq!(stmt.company.as_deref(), Some("Rossi S.r.l."));
        assert_eq!(stmt.fiscal_year, Some(FiscalYear::new(2023)));
        assert_eq!(stmt.rows[1].amount.cents(), -30000);
    }
}
