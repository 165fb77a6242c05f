use serde::Serialize;
use std::fmt;

use bilancio_core::Money;

use crate::Analysis;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportValue {
    Amount(Money),
    Ratio(f64),
    Percent(f64),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Amount(m) => write!(f, "{m}"),
            ReportValue::Ratio(r) => write!(f, "{r:.2}"),
            ReportValue::Percent(p) => write!(f, "{:.2}%", p * 100.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub value: ReportValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportGroup {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

/// The KPI summary in presentation order: balance sheet aggregates, income
/// statement chain, then ratios and margins.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub company: Option<String>,
    pub fiscal_year: Option<String>,
    pub groups: Vec<ReportGroup>,
}

fn row(label: &str, value: ReportValue) -> ReportRow {
    ReportRow {
        label: label.to_string(),
        value,
    }
}

pub fn build_report(a: &Analysis) -> Report {
    let k = &a.kpis;
    let va = &a.value_added;

    let stato_patrimoniale = ReportGroup {
        title: "Stato Patrimoniale".to_string(),
        rows: vec![
            row("Totale Attività", ReportValue::Amount(k.totale_attivo)),
            row("Totale Passività", ReportValue::Amount(k.totale_passivo)),
            row("Attivo Corrente", ReportValue::Amount(k.attivo_corrente)),
            row("Passivo Corrente", ReportValue::Amount(k.passivo_corrente)),
            row("Liquidità Immediate", ReportValue::Amount(k.liquidita_immediate)),
            row("Rimanenze", ReportValue::Amount(k.rimanenze)),
            row("Patrimonio Netto", ReportValue::Amount(k.patrimonio_netto)),
        ],
    };

    let conto_economico = ReportGroup {
        title: "Conto Economico".to_string(),
        rows: vec![
            row(
                "Valore della Produzione (Ricavi)",
                ReportValue::Amount(va.valore_produzione),
            ),
            row("Valore Aggiunto", ReportValue::Amount(va.valore_aggiunto)),
            row(
                "EBITDA (Margine Operativo Lordo)",
                ReportValue::Amount(va.ebitda),
            ),
            row("EBIT (Margine Operativo Netto)", ReportValue::Amount(va.ebit)),
            row(
                "Risultato Ante Imposte",
                ReportValue::Amount(va.risultato_ante_imposte),
            ),
        ],
    };

    let indici = ReportGroup {
        title: "Indici e Margini".to_string(),
        rows: vec![
            row("Capitale Circolante Netto (CCN)", ReportValue::Amount(k.ccn)),
            row("Margine di Tesoreria", ReportValue::Amount(k.margine_tesoreria)),
            row("Current Ratio", ReportValue::Ratio(k.current_ratio)),
            row("Quick Ratio (Acid Test)", ReportValue::Ratio(k.quick_ratio)),
            row("EBITDA Margin", ReportValue::Percent(k.ebitda_margin)),
            row("ROS", ReportValue::Percent(k.ros)),
            row("ROI", ReportValue::Percent(k.roi)),
            row("Indice di Autonomia", ReportValue::Percent(k.autonomia)),
            row("Leverage", ReportValue::Ratio(k.leverage)),
            row("Debt/Equity", ReportValue::Ratio(k.debt_equity)),
        ],
    };

    Report {
        company: a.classified.company.clone(),
        fiscal_year: a.classified.fiscal_year.map(|fy| fy.to_string()),
        groups: vec![stato_patrimoniale, conto_economico, indici],
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(company) = &self.company {
            writeln!(f, "{company}")?;
        }
        if let Some(fy) = &self.fiscal_year {
            writeln!(f, "{fy}")?;
        }
        for group in &self.groups {
            writeln!(f, "\n{}", group.title)?;
            writeln!(f, "{}", "─".repeat(48))?;
            for r in &group.rows {
                writeln!(f, "{:<34} {:>13}", r.label, r.value.to_string())?;
            }
        }
        Ok(())
    }
}
