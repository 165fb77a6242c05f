use serde::Serialize;

use bilancio_core::{Category, Money, Section};

use crate::classify::ClassifiedStatement;

#[derive(Debug, Clone, Serialize)]
pub struct BucketRow {
    pub voce: String,
    pub amount: Money,
}

/// One side of the reclassified view, with the rows that make it up so the
/// assignment stays auditable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bucket {
    pub total: Money,
    pub rows: Vec<BucketRow>,
}

impl Bucket {
    fn push(&mut self, voce: &str, amount: Money) {
        self.total = self.total + amount;
        self.rows.push(BucketRow {
            voce: voce.to_string(),
            amount,
        });
    }
}

/// Riclassificazione of the balance sheet: current vs non-current on both
/// sides, equity split out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reclassified {
    pub attivo_corrente: Bucket,
    pub attivo_immobilizzato: Bucket,
    pub passivo_corrente: Bucket,
    pub passivo_consolidato: Bucket,
    pub patrimonio_netto: Bucket,
}

impl Reclassified {
    pub fn from_classified(cs: &ClassifiedStatement) -> Self {
        let mut r = Reclassified::default();
        for row in &cs.rows {
            match row.section {
                Some(Section::Attivita) => {
                    if row.category.is_attivo_corrente() {
                        r.attivo_corrente.push(&row.voce, row.amount);
                    } else {
                        // Non-current by default, matching the keyword tables:
                        // what is not recognisably current is tied up.
                        r.attivo_immobilizzato.push(&row.voce, row.amount);
                    }
                }
                Some(Section::Passivita) => {
                    if row.category.is_passivo_corrente() {
                        r.passivo_corrente.push(&row.voce, row.amount);
                    } else if row.category == Category::PatrimonioNetto {
                        r.patrimonio_netto.push(&row.voce, row.amount);
                    } else {
                        r.passivo_consolidato.push(&row.voce, row.amount);
                    }
                }
                Some(Section::ContoEconomico) | None => {}
            }
        }
        r
    }

    pub fn totale_attivo(&self) -> Money {
        self.attivo_corrente.total + self.attivo_immobilizzato.total
    }

    /// Total of the PASSIVITA' section as sources of funds: debts plus equity.
    pub fn totale_passivo(&self) -> Money {
        self.passivo_corrente.total + self.passivo_consolidato.total + self.patrimonio_netto.total
    }
}
