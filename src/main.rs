//! indent-router CLI
//!
//! Plans routes for due indents stored in a local SQLite database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use indent_router::config::Config;
use indent_router::geocode::GeoResolver;
use indent_router::nominatim::NominatimClient;
use indent_router::orchestrator::RouteOrchestrator;
use indent_router::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(name = "indent-router", version, about = "Route planning for transport indents")]
struct Cli {
    /// SQLite database holding indents and trip summaries.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan every due indent and print the results as JSON.
    Optimize {
        /// Maximum indents to plan in this pass.
        #[arg(long)]
        batch_size: Option<usize>,

        /// IANA time zone for arrival times.
        #[arg(long)]
        time_zone: Option<String>,

        /// Pretty-print the JSON report.
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve a single address and print its coordinate.
    Geocode { address: String },

    /// Create the database tables.
    InitDb,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,indent_router=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    match cli.command {
        Command::Optimize {
            batch_size,
            time_zone,
            pretty,
        } => {
            if let Some(batch_size) = batch_size {
                config.orchestrator.batch_size = batch_size;
            }
            if let Some(time_zone) = time_zone {
                config.orchestrator.time_zone = time_zone;
            }
            optimize(&config, pretty)
        }
        Command::Geocode { address } => geocode(&config, &address),
        Command::InitDb => {
            SqliteStore::open(&config.database_path).with_context(|| {
                format!("failed to open database {}", config.database_path.display())
            })?;
            info!(path = %config.database_path.display(), "database ready");
            Ok(())
        }
    }
}

fn optimize(config: &Config, pretty: bool) -> Result<()> {
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("failed to open database {}", config.database_path.display()))?;
    let client = NominatimClient::new(config.nominatim.clone()).context("failed to build geocoding client")?;
    let resolver = GeoResolver::new(client, config.retry.clone());
    let orchestrator = RouteOrchestrator::new(resolver, &store, &store, config.orchestrator.clone())
        .context("invalid routing options")?;

    let report = orchestrator.run_batch().context("failed to fetch due indents")?;
    info!(
        planned = report.results.len(),
        failed = report.failures.len(),
        "batch finished"
    );

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn geocode(config: &Config, address: &str) -> Result<()> {
    let client = NominatimClient::new(config.nominatim.clone()).context("failed to build geocoding client")?;
    let resolver = GeoResolver::new(client, config.retry.clone());

    match resolver.resolve(address) {
        Some(coord) => println!("{:.6},{:.6}", coord.lat(), coord.lon()),
        None => anyhow::bail!("could not resolve {address:?}"),
    }
    Ok(())
}
