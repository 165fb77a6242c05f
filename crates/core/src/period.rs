use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The statement's fiscal year (esercizio). Italian SMB statements close on
/// the calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalYear(pub u16);

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Esercizio {}", self.0)
    }
}

impl FiscalYear {
    pub fn new(year: u16) -> Self {
        FiscalYear(year)
    }

    pub fn year(self) -> u16 {
        self.0
    }

    pub fn start_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 as i32, 1, 1).unwrap()
    }

    /// December 31 of the esercizio (inclusive closing date).
    pub fn end_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 as i32, 12, 31).unwrap()
    }
}
