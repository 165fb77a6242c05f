use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;

use bilancio_analysis::build_report;
use bilancio_core::Statement;
use bilancio_import::{import_csv, import_sheet, Classifier};

pub fn analyze(file: &Path, rules: Option<&Path>, json: bool) -> Result<()> {
    let classifier = load_classifier(rules)?;
    let statement = load_statement(file)?;
    let analysis = bilancio_analysis::analyze(&statement, &classifier);
    let report = build_report(&analysis);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

pub fn inspect(file: &Path, rules: Option<&Path>, json: bool) -> Result<()> {
    let classifier = load_classifier(rules)?;
    let statement = load_statement(file)?;
    let classified = bilancio_analysis::classify::classify(&statement, &classifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    for row in &classified.rows {
        let section = row
            .section
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<42} {:>14}  {:<16} {}",
            truncate(&row.voce, 42),
            row.amount.to_string(),
            section,
            row.category
        );
    }

    let unmatched = classified.unclassified().count();
    if unmatched > 0 {
        println!("\n{unmatched} voci non classificate (estendere il file --rules)");
    }
    Ok(())
}

fn load_classifier(rules: Option<&Path>) -> Result<Classifier> {
    match rules {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading rules file {}", path.display()))?;
            Ok(Classifier::from_toml(&content)?)
        }
        None => Ok(Classifier::with_defaults()),
    }
}

fn load_statement(file: &Path) -> Result<Statement> {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let statement = match ext.as_str() {
        "csv" => {
            let f = fs::File::open(file)
                .with_context(|| format!("opening {}", file.display()))?;
            import_csv(f)?
        }
        "xlsx" | "xls" | "xlsm" | "ods" => import_sheet(file)?,
        "pdf" => {
            let extracted = bilancio_pdf::extract_statement(file)?;
            review_warning(&extracted);
            extracted.into_statement()
        }
        // Pre-extracted PDF text goes through the same layout heuristics.
        "txt" => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let extracted = bilancio_pdf::parse_text(&text)?;
            review_warning(&extracted);
            extracted.into_statement()
        }
        other => bail!("unsupported file type '{other}' (expected csv, xlsx, xls, ods, pdf or txt)"),
    };
    Ok(statement)
}

fn review_warning(extracted: &bilancio_pdf::ExtractedStatement) {
    if extracted.needs_review() {
        warn!(
            confidence = extracted.confidence,
            "low-confidence extraction, check the rows with `bilancio inspect`"
        );
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
