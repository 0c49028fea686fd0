//! Batch VIX calculation over CSV inputs.
//!
//! ```text
//! vix_batch --options options.csv --rates par_yields.csv --output vix.csv \
//!           [--config vix.toml] [--market-vix vix_close.csv]
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vix_lib::{default_configs, io, run_batch, VixConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Cboe,
    LegacyFridays,
}

/// Calculate the CBOE VIX for every quote date in an option file
#[derive(Parser, Debug)]
#[command(name = "vix_batch", version, about)]
struct Cli {
    /// End-of-day option CSV (one row per root, expiry and strike)
    #[arg(long)]
    options: PathBuf,

    /// Treasury par-yield CSV
    #[arg(long)]
    rates: PathBuf,

    /// Where to write the calculated records
    #[arg(long)]
    output: PathBuf,

    /// TOML configuration file; overrides --preset
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "standard")]
    preset: Preset,

    /// Published closing values (`date,vix`) to compare against
    #[arg(long)]
    market_vix: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<VixConfig> {
    match &cli.config {
        Some(path) => VixConfig::from_file(path),
        None => Ok(match cli.preset {
            Preset::Standard => default_configs::standard(),
            Preset::Cboe => default_configs::cboe(),
            Preset::LegacyFridays => default_configs::legacy_fridays(),
        }),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let snapshots = io::load_snapshots(&cli.options)?;
    let rates = io::load_rate_book(&cli.rates, config.rates.max_gap_days)?;

    let report = run_batch(snapshots.values(), &rates, config);
    io::write_results(&cli.output, &report.results)?;
    info!(
        path = %cli.output.display(),
        rows = report.results.len(),
        "results written"
    );

    for skipped in &report.skipped {
        warn!(quote_date = %skipped.quote_date, reason = %skipped.error, "skipped");
    }

    if let Some(path) = &cli.market_vix {
        let market = io::load_market_vix(path)?;
        match report.compare_with(&market) {
            Some(summary) => info!(
                dates = summary.count,
                mean_abs_diff = summary.mean_abs_diff,
                max_abs_diff = summary.max_abs_diff,
                max_diff_date = %summary.max_diff_date,
                pct_within_001 = summary.pct_within_001,
                pct_within_01 = summary.pct_within_01,
                "comparison with published values"
            ),
            None => warn!("no overlapping dates with published values"),
        }
    }

    Ok(())
}
