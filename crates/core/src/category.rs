use serde::{Deserialize, Serialize};
use std::fmt;

use super::statement::Section;

/// Reclassification bucket a statement line lands in after keyword
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    // Stato patrimoniale, attivo
    LiquiditaImmediate,
    CreditiBreve,
    Rimanenze,
    RateiRiscontiAttivi,
    Immobilizzazioni,
    // Stato patrimoniale, passivo
    DebitiBreve,
    RateiRiscontiPassivi,
    PassivoConsolidato,
    PatrimonioNetto,
    // Conto economico
    Ricavi,
    CostiMaterie,
    CostiServizi,
    CostiGodimento,
    CostiPersonale,
    Ammortamenti,
    OneriFinanziari,
    AltriCosti,
    // No keyword matched
    Unclassified,
}

impl Category {
    /// Section this category belongs to, when it determines one.
    pub fn implied_section(self) -> Option<Section> {
        use Category::*;
        match self {
            LiquiditaImmediate | CreditiBreve | Rimanenze | RateiRiscontiAttivi
            | Immobilizzazioni => Some(Section::Attivita),
            DebitiBreve | RateiRiscontiPassivi | PassivoConsolidato | PatrimonioNetto => {
                Some(Section::Passivita)
            }
            Ricavi | CostiMaterie | CostiServizi | CostiGodimento | CostiPersonale
            | Ammortamenti | OneriFinanziari | AltriCosti => Some(Section::ContoEconomico),
            Unclassified => None,
        }
    }

    pub fn is_attivo_corrente(self) -> bool {
        matches!(
            self,
            Category::LiquiditaImmediate
                | Category::CreditiBreve
                | Category::Rimanenze
                | Category::RateiRiscontiAttivi
        )
    }

    pub fn is_passivo_corrente(self) -> bool {
        matches!(self, Category::DebitiBreve | Category::RateiRiscontiPassivi)
    }

    pub fn is_costo(self) -> bool {
        matches!(
            self,
            Category::CostiMaterie
                | Category::CostiServizi
                | Category::CostiGodimento
                | Category::CostiPersonale
                | Category::Ammortamenti
                | Category::OneriFinanziari
                | Category::AltriCosti
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::LiquiditaImmediate => "Liquidità immediate",
            Category::CreditiBreve => "Crediti a breve",
            Category::Rimanenze => "Rimanenze",
            Category::RateiRiscontiAttivi => "Ratei e risconti attivi",
            Category::Immobilizzazioni => "Immobilizzazioni",
            Category::DebitiBreve => "Debiti a breve",
            Category::RateiRiscontiPassivi => "Ratei e risconti passivi",
            Category::PassivoConsolidato => "Passività consolidate",
            Category::PatrimonioNetto => "Patrimonio netto",
            Category::Ricavi => "Ricavi",
            Category::CostiMaterie => "Costi per materie",
            Category::CostiServizi => "Costi per servizi",
            Category::CostiGodimento => "Godimento beni di terzi",
            Category::CostiPersonale => "Costi per il personale",
            Category::Ammortamenti => "Ammortamenti",
            Category::OneriFinanziari => "Oneri finanziari",
            Category::AltriCosti => "Altri costi",
            Category::Unclassified => "Non classificata",
        };
        write!(f, "{label}")
    }
}
