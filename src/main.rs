//! partner-recon - Batch price/stock reconciliation CLI for partner catalogs.

use anyhow::{Context, Result};
use clap::Parser;
use partner_recon::config::Config;
use partner_recon::partner::PartnerClient;
use partner_recon::recon::Reconciler;
use partner_recon::sheet;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "partner-recon",
    version,
    about = "Batch price/stock reconciliation CLI for partner catalog feeds",
    long_about = "Reconciles a locally-held CSV price/stock export against live data from a partner's HTTP catalog API, logging a finding for every discrepancy."
)]
struct Cli {
    /// CSV export to reconcile (overrides the configured path)
    #[arg(env = "RECON_CSV_PATH")]
    file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(file) = cli.file {
        config.csv_path = file;
    }

    config.validate()?;

    let raw = std::fs::read_to_string(&config.csv_path)
        .with_context(|| format!("Failed to read {}", config.csv_path.display()))?;
    let rows = sheet::parse_rows(&raw, &config.headers)?;

    info!("loaded {} rows from {}", rows.len(), config.csv_path.display());

    let mut partner = PartnerClient::new(&config)?;
    let recon = Reconciler::new(config.columns.clone(), rows);
    recon.run(&mut partner).await?;

    Ok(())
}
