use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use futures::future::try_join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listings_sync::{
    config::Config,
    sources::{ListingsEngine, ListingsProvider},
};

#[derive(Parser)]
#[command(name = "listings-sync")]
#[command(version)]
#[command(about = "Synchronize electronic program guide listings from Schedules Direct")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path, defaults to $LISTINGS_SYNC_CONFIG or listings-sync.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch merged program records for one or more channels
    Programs {
        /// Station id, may be repeated
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,

        /// Window start (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Window end (RFC 3339), defaults to 24 hours after start
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// List the channels of the configured lineup
    Channels,

    /// List lineups available for a country and postal code
    Lineups {
        /// ISO country code, defaults to account.country
        #[arg(long)]
        country: Option<String>,

        /// Postal code, defaults to account.postal_code
        #[arg(long)]
        postal_code: Option<String>,
    },

    /// Check the configured credentials
    Validate {
        /// Also ensure the configured lineup is attached to the account
        #[arg(long)]
        listings: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("listings_sync={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting listings-sync v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::load_from_file(path)?
        }
        None => Config::load()?,
    };

    let engine = ListingsEngine::new(&config).context("Failed to create listings engine")?;
    let provider_info = config.account.provider_info();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding requests");
            signal_cancel.cancel();
        }
    });

    match cli.command {
        Command::Programs {
            channels,
            start,
            end,
        } => {
            let start = start.unwrap_or_else(Utc::now);
            let end = end.unwrap_or(start + Duration::hours(24));
            if end < start {
                anyhow::bail!("--end must not be before --start");
            }

            let per_channel = try_join_all(
                channels
                    .iter()
                    .map(|channel| engine.get_programs(&provider_info, channel, start, end, &cancel)),
            )
            .await?;
            let programs: Vec<_> = per_channel.into_iter().flatten().collect();
            info!("Fetched {} programs across {} channels", programs.len(), channels.len());
            print_json(&programs)?;
        }
        Command::Channels => {
            let channels = engine.get_channels(&provider_info, &cancel).await?;
            print_json(&channels)?;
        }
        Command::Lineups {
            country,
            postal_code,
        } => {
            let country = country.unwrap_or_else(|| config.account.country.clone());
            let postal_code = postal_code.unwrap_or_else(|| config.account.postal_code.clone());
            let lineups = engine
                .get_lineups(&provider_info, &country, &postal_code, &cancel)
                .await?;
            print_json(&lineups)?;
        }
        Command::Validate { listings } => {
            engine
                .validate(&provider_info, true, listings, &cancel)
                .await?;
            info!("{} account validated", engine.name());
        }
    }

    Ok(())
}
