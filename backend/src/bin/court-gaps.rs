//! Court Gap Finder binary
//!
//! Runs one fetch/compute/write cycle and exits.
//!
//! # Usage
//!
//! ```bash
//! # iCal feeds configured in court-gaps.toml
//! court-gaps --config court-gaps.toml
//!
//! # A scraped grid dump instead of iCal feeds
//! court-gaps --source grid --grid-dump grid.json --output site/gaps.json
//! ```
//!
//! # Environment Variables
//!
//! - `COURT_GAPS_CONFIG`: config file path
//! - `COURT_GAPS_TIMEZONE`: overrides `timezone`
//! - `COURT_GAPS_OUTPUT`: overrides `report.output_path`
//! - `RUST_LOG`: log filter (default: info)

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use court_gaps::config::AppConfig;
use court_gaps::io::{render_summary, write_report};
use court_gaps::services::{Horizon, Pipeline};
use court_gaps::sources::{GridDumpSource, IcalFeedSource, RawEntrySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Ical,
    Grid,
}

#[derive(Debug, Parser)]
#[command(name = "court-gaps", version, about = "Find free court time over the next seven days")]
struct Cli {
    /// Config file (default: COURT_GAPS_CONFIG, then ./court-gaps.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where raw entries come from
    #[arg(long, value_enum, default_value = "ical")]
    source: SourceKind,

    /// Scraped grid dump, required with `--source grid`
    #[arg(long, value_name = "PATH", env = "COURT_GAPS_GRID_DUMP")]
    grid_dump: Option<PathBuf>,

    /// Report path, overriding the config
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// First horizon date instead of today in the configured timezone
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Skip the console summary
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let output_path = cli.output.clone().unwrap_or_else(|| config.output_path.clone());

    let now = Utc::now();
    let horizon = match cli.today {
        Some(date) => Horizon::starting(date),
        None => Horizon::today_in(config.timezone, now),
    };
    info!(
        "Starting run for {} court(s), {} to {} ({})",
        config.courts.len(),
        horizon.start(),
        horizon.end(),
        config.timezone
    );

    let source: Box<dyn RawEntrySource> = match cli.source {
        SourceKind::Ical => Box::new(
            IcalFeedSource::from_config(&config).context("Failed to set up iCal source")?,
        ),
        SourceKind::Grid => {
            let Some(path) = cli.grid_dump.clone() else {
                bail!("--source grid needs --grid-dump PATH");
            };
            Box::new(GridDumpSource::new(path, config.court_set()))
        }
    };

    let outcome = source.fetch(&horizon).await;
    info!(
        "Source '{}' finished with {} ({} raw entries)",
        source.name(),
        outcome.health.label(),
        outcome.entries.len()
    );

    let report = Pipeline::new(&config)
        .run(outcome, horizon, now)
        .context("Run failed; previous report left untouched")?;
    write_report(&report, &output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if !cli.quiet {
        print!("{}", render_summary(&report));
    }

    Ok(())
}
