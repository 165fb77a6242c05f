use serde::Serialize;
use tracing::debug;

use bilancio_core::{Category, FiscalYear, Money, Section, Statement, Voice};
use bilancio_import::Classifier;

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRow {
    pub voce: String,
    pub amount: Money,
    pub section: Option<Section>,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedStatement {
    pub rows: Vec<ClassifiedRow>,
    pub company: Option<String>,
    pub fiscal_year: Option<FiscalYear>,
}

impl ClassifiedStatement {
    pub fn category_total(&self, category: Category) -> Money {
        self.rows
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.amount)
            .sum()
    }

    pub fn section_total(&self, section: Section) -> Money {
        self.rows
            .iter()
            .filter(|r| r.section == Some(section))
            .map(|r| r.amount)
            .sum()
    }

    /// Rows no keyword matched, kept as the review list for the rule file.
    pub fn unclassified(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows
            .iter()
            .filter(|r| r.category == Category::Unclassified)
    }
}

pub fn classify(statement: &Statement, classifier: &Classifier) -> ClassifiedStatement {
    let rows: Vec<_> = statement
        .rows
        .iter()
        .map(|v| classify_row(v, classifier))
        .collect();

    let unmatched = rows
        .iter()
        .filter(|r| r.category == Category::Unclassified)
        .count();
    debug!(rows = rows.len(), unmatched, "statement classified");

    ClassifiedStatement {
        rows,
        company: statement.company.clone(),
        fiscal_year: statement.fiscal_year,
    }
}

fn classify_row(voice: &Voice, classifier: &Classifier) -> ClassifiedRow {
    let category = classifier.classify(&voice.voce, voice.section);

    let section = voice.section.or_else(|| category.implied_section()).or_else(|| {
        // Signed-saldo fallback for verification-balance rows: a dare balance
        // is an asset, an avere balance a liability. Costs and revenues can
        // only be recognized by keyword, sign alone cannot separate them.
        if voice.amount.is_zero() {
            None
        } else if voice.amount.is_negative() {
            Some(Section::Passivita)
        } else {
            Some(Section::Attivita)
        }
    });

    // Sources without a SEZIONE column deliver signed saldi; once the side is
    // decided the amount is reported positive, as section files do.
    let amount = if voice.section.is_none() {
        voice.amount.abs()
    } else {
        voice.amount
    };

    ClassifiedRow {
        voce: voice.voce.clone(),
        amount,
        section,
        category,
    }
}
