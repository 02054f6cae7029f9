//! quakewatch CLI
//!
//! Runs the pipeline once, or repeatedly with one long-lived pipeline, and
//! inspects the stored event history.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use quakewatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{Pipeline, RunOutcome},
    storage::EventStore,
};

/// quakewatch - Seismic Event Watcher
#[derive(Parser, Debug)]
#[command(
    name = "quakewatch",
    version,
    about = "Announces new earthquakes for one country"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the test-mode event store
    #[arg(long, global = true)]
    test: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the feed once and announce a new event
    Run {
        /// Override the configured locality
        #[arg(short, long)]
        locality: Option<String>,

        /// Read the feed payload from a file instead of fetching
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Run repeatedly, keeping novelty state between runs
    Watch {
        /// Override the configured locality
        #[arg(short, long)]
        locality: Option<String>,

        /// Seconds between runs
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },

    /// List stored events, newest first
    History {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Print one stored event as JSON
    Show {
        /// Event code
        code: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn report(outcome: &RunOutcome) {
    match &outcome.record {
        Some(record) => log::info!("Run finished: {:?} ({})", outcome.status, record.code),
        None => log::info!("Run finished: {:?}", outcome.status),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { locality, payload } => {
            let locality = locality.unwrap_or_else(|| config.filter.locality.clone());
            let mut pipeline = Pipeline::from_config(&config, cli.test)?;

            let outcome = match payload {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path).await?;
                    log::info!("Using payload from {}", path.display());
                    pipeline.run_payload(&locality, &raw).await?
                }
                None => pipeline.run(&locality).await?,
            };
            report(&outcome);
        }

        Command::Watch {
            locality,
            interval_secs,
        } => {
            if interval_secs == 0 {
                return Err(AppError::validation("--interval-secs must be > 0"));
            }
            let locality = locality.unwrap_or_else(|| config.filter.locality.clone());
            let mut pipeline = Pipeline::from_config(&config, cli.test)?;
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

            log::info!(
                "Watching {} every {}s ({} source(s))",
                locality,
                interval_secs,
                config.feed.urls.len()
            );

            loop {
                ticker.tick().await;
                match pipeline.run(&locality).await {
                    Ok(outcome) => report(&outcome),
                    Err(e) if e.is_transient() => log::warn!("Run failed, retrying next tick: {}", e),
                    Err(e) => return Err(e),
                }
            }
        }

        Command::History { limit } => {
            let store = EventStore::open_with(&config.storage, cli.test)?;
            let events = store.recent(limit)?;
            if events.is_empty() {
                log::info!("No events stored yet.");
            }
            for event in events {
                println!(
                    "{}  {}  M{:.1} {:<4} {}",
                    event.occurred_at_utc.format("%Y-%m-%d %H:%M:%S"),
                    event.code,
                    event.magnitude,
                    event.magnitude_type,
                    event.place
                );
            }
        }

        Command::Show { code } => {
            let store = EventStore::open_with(&config.storage, cli.test)?;
            match store.find_by_code(&code)? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => {
                    return Err(AppError::validation(format!("No stored event {code}")));
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            println!("{}", config.redacted().to_toml()?);
        }
    }

    Ok(())
}
