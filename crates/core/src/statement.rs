use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;
use super::period::FiscalYear;

/// Source statement section, as labeled in the SEZIONE column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Attivita,
    Passivita,
    ContoEconomico,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Attivita => write!(f, "ATTIVITA'"),
            Section::Passivita => write!(f, "PASSIVITA'"),
            Section::ContoEconomico => write!(f, "CONTO ECONOMICO"),
        }
    }
}

impl std::str::FromStr for Section {
    type Err = StatementError;

    /// Accepts the spellings that show up in real exports: with or without
    /// the trailing apostrophe, accented or plain, and the conto economico
    /// sub-headers COSTI / RICAVI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
            .replace('à', "a")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match key.as_str() {
            "attivita" | "attivo" | "stato patrimoniale attivo" => Ok(Section::Attivita),
            "passivita" | "passivo" | "stato patrimoniale passivo" => Ok(Section::Passivita),
            "conto economico" | "costi" | "ricavi" | "ce" => Ok(Section::ContoEconomico),
            _ => Err(StatementError::UnknownSection(s.trim().to_string())),
        }
    }
}

/// One statement line: description, amount, and the section it was filed
/// under. `section` is `None` when the source carries no SEZIONE column
/// (verification-balance PDFs) and must be inferred downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voce: String,
    pub amount: Money,
    pub section: Option<Section>,
}

impl Voice {
    pub fn new(voce: impl Into<String>, amount: Money, section: Option<Section>) -> Self {
        Voice {
            voce: voce.into(),
            amount,
            section,
        }
    }
}

/// A parsed statement: ordered rows plus whatever metadata the source header
/// gave up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    pub rows: Vec<Voice>,
    pub company: Option<String>,
    pub fiscal_year: Option<FiscalYear>,
}

impl Statement {
    pub fn new(rows: Vec<Voice>) -> Self {
        Statement {
            rows,
            company: None,
            fiscal_year: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn section_total(&self, section: Section) -> Money {
        self.rows
            .iter()
            .filter(|r| r.section == Some(section))
            .map(|r| r.amount)
            .sum()
    }

    /// Rows still lacking a section after ingestion.
    pub fn unsectioned(&self) -> impl Iterator<Item = &Voice> {
        self.rows.iter().filter(|r| r.section.is_none())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("Unknown section label: '{0}'")]
    UnknownSection(String),
    #[error("Statement has no rows")]
    Empty,
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}
