use serde::Serialize;

use bilancio_core::{Category, Money};

use crate::classify::ClassifiedStatement;
use crate::reclass::Reclassified;

/// Value-added reclassification of the income statement.
#[derive(Debug, Clone, Serialize)]
pub struct ValueAdded {
    pub valore_produzione: Money,
    pub costi_materie: Money,
    pub costi_servizi: Money,
    pub costi_godimento: Money,
    pub costi_personale: Money,
    pub ammortamenti: Money,
    pub oneri_finanziari: Money,
    pub altri_costi: Money,
    pub valore_aggiunto: Money,
    pub ebitda: Money,
    pub ebit: Money,
    pub risultato_ante_imposte: Money,
}

impl ValueAdded {
    pub fn from_classified(cs: &ClassifiedStatement) -> Self {
        let valore_produzione = cs.category_total(Category::Ricavi);
        let costi_materie = cs.category_total(Category::CostiMaterie);
        let costi_servizi = cs.category_total(Category::CostiServizi);
        let costi_godimento = cs.category_total(Category::CostiGodimento);
        let costi_personale = cs.category_total(Category::CostiPersonale);
        let ammortamenti = cs.category_total(Category::Ammortamenti);
        let oneri_finanziari = cs.category_total(Category::OneriFinanziari);
        let altri_costi = cs.category_total(Category::AltriCosti);

        let valore_aggiunto =
            valore_produzione - (costi_materie + costi_servizi + costi_godimento + altri_costi);
        let ebitda = valore_aggiunto - costi_personale;
        let ebit = ebitda - ammortamenti;
        let risultato_ante_imposte = ebit - oneri_finanziari;

        ValueAdded {
            valore_produzione,
            costi_materie,
            costi_servizi,
            costi_godimento,
            costi_personale,
            ammortamenti,
            oneri_finanziari,
            altri_costi,
            valore_aggiunto,
            ebitda,
            ebit,
            risultato_ante_imposte,
        }
    }
}

/// The ratio set: liquidity margins, leverage, profitability. Every ratio is
/// 0 when its denominator is zero; dormant companies file statements too.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    // Stato patrimoniale
    pub totale_attivo: Money,
    pub totale_passivo: Money,
    pub attivo_corrente: Money,
    pub passivo_corrente: Money,
    pub liquidita_immediate: Money,
    pub rimanenze: Money,
    pub patrimonio_netto: Money,
    // Liquidity
    pub ccn: Money,
    pub margine_tesoreria: Money,
    pub current_ratio: f64,
    pub quick_ratio: f64,
    // Leverage
    pub autonomia: f64,
    pub leverage: f64,
    pub debt_equity: f64,
    // Profitability
    pub ebitda_margin: f64,
    pub ros: f64,
    pub roi: f64,
}

impl Kpis {
    pub fn compute(cs: &ClassifiedStatement, r: &Reclassified, va: &ValueAdded) -> Self {
        let totale_attivo = r.totale_attivo();
        let totale_passivo = r.totale_passivo();
        let attivo_corrente = r.attivo_corrente.total;
        let passivo_corrente = r.passivo_corrente.total;
        let patrimonio_netto = r.patrimonio_netto.total;
        let liquidita_immediate = cs.category_total(Category::LiquiditaImmediate);
        let rimanenze = cs.category_total(Category::Rimanenze);

        let ccn = attivo_corrente - passivo_corrente;
        let margine_tesoreria = attivo_corrente - rimanenze - passivo_corrente;
        let current_ratio = attivo_corrente.ratio_to(passivo_corrente);
        let quick_ratio = (attivo_corrente - rimanenze).ratio_to(passivo_corrente);

        let autonomia = patrimonio_netto.ratio_to(totale_attivo);
        let leverage = totale_attivo.ratio_to(patrimonio_netto);
        let debt_equity = (totale_passivo - patrimonio_netto).ratio_to(patrimonio_netto);

        let ebitda_margin = va.ebitda.ratio_to(va.valore_produzione);
        let ros = va.ebit.ratio_to(va.valore_produzione);
        let roi = va.ebit.ratio_to(totale_attivo);

        Kpis {
            totale_attivo,
            totale_passivo,
            attivo_corrente,
            passivo_corrente,
            liquidita_immediate,
            rimanenze,
            patrimonio_netto,
            ccn,
            margine_tesoreria,
            current_ratio,
            quick_ratio,
            autonomia,
            leverage,
            debt_equity,
            ebitda_margin,
            ros,
            roi,
        }
    }
}
