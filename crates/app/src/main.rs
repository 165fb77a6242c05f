use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "bilancio",
    version,
    about = "Analisi di bilancio per piccole imprese: ingest CSV/spreadsheet/PDF, classify, compute KPIs"
)]
struct Cli {
    /// Emit machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Classification rules TOML, layered over the built-in keyword table.
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a statement file and print the KPI report.
    Analyze { file: PathBuf },
    /// Print every parsed row with its section and category, for review.
    Inspect { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs always go to stderr so stdout stays pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    match cli.command {
        Commands::Analyze { file } => commands::analyze(&file, cli.rules.as_deref(), cli.json),
        Commands::Inspect { file } => commands::inspect(&file, cli.rules.as_deref(), cli.json),
    }
}
