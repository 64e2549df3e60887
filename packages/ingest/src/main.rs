#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the indicator refresh pipeline.

use clap::{Parser, Subcommand};
use indicator_map_database::{SnapshotStore, db_path_from_env, json_path_from_env};
use indicator_map_ingest::{INTER_COUNTRY_DELAY_SECS, RefreshOptions, refresh_all, refresh_country};
use indicator_map_source::{adapters, registry};
use indicator_map_source_models::ProviderSettings;

#[derive(Parser)]
#[command(name = "indicator_map_ingest", about = "Country indicator refresh pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the default test subset, or wider scopes via flags
    RefreshAll {
        /// Process every registered country instead of the test subset
        #[arg(long)]
        full: bool,
        /// Maximum number of countries to process
        #[arg(long)]
        limit: Option<usize>,
        /// Comma-separated ISO3 codes to process (overrides --full)
        #[arg(long)]
        countries: Option<String>,
        /// Refresh even countries that are not yet due
        #[arg(long)]
        force: bool,
        /// Seconds to wait between countries
        #[arg(long, default_value_t = INTER_COUNTRY_DELAY_SECS)]
        delay_secs: u64,
    },
    /// Refresh a single country
    Refresh {
        /// ISO3 country code (e.g. "EGY")
        iso3: String,
    },
    /// List all registered countries
    Countries,
    /// List stored countries that are due for refresh
    Stale,
    /// Rewrite the bulk JSON export from the database
    Export,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Countries => {
            let countries = registry::all_countries();
            println!("{:<6} {:<36} REGION", "ISO3", "NAME");
            println!("{}", "-".repeat(60));
            for country in &countries {
                println!("{:<6} {:<36} {}", country.iso3, country.name, country.region);
            }
        }
        Commands::Refresh { iso3 } => {
            let country = registry::find_country(&iso3)
                .ok_or_else(|| format!("Unknown country: {iso3}"))?;
            let store = open_store().await;
            let settings = ProviderSettings::from_env();
            let client = http_client()?;
            let adapters = adapters::all_adapters(&client, &settings);
            refresh_country(&store, &adapters, &country).await?;
        }
        Commands::RefreshAll {
            full,
            limit,
            countries,
            force,
            delay_secs,
        } => {
            let store = open_store().await;
            let settings = ProviderSettings::from_env();
            let client = http_client()?;
            let adapters = adapters::all_adapters(&client, &settings);
            let options = RefreshOptions {
                full,
                limit,
                countries: countries
                    .map(|s| s.split(',').map(|c| c.trim().to_string()).collect()),
                force,
                delay_secs,
            };
            refresh_all(&store, &adapters, &options).await?;
        }
        Commands::Stale => {
            let store = open_store().await;
            let mut due = Vec::new();
            let (summaries, _) = store.list().await?;
            for summary in summaries {
                if store.needs_refresh(&summary.iso3).await? {
                    due.push(summary);
                }
            }
            if due.is_empty() {
                println!("All stored snapshots are fresh.");
            } else {
                println!("{:<6} {:<12} LAST UPDATED", "ISO3", "COMPLETE");
                println!("{}", "-".repeat(50));
                for summary in &due {
                    println!(
                        "{:<6} {:<12} {}",
                        summary.iso3,
                        format!("{:.1}%", summary.completeness),
                        summary.last_updated
                    );
                }
            }
        }
        Commands::Export => {
            let store = open_store().await;
            store.export_json().await?;
            log::info!("JSON export written to {}", json_path_from_env().display());
        }
    }

    Ok(())
}

async fn open_store() -> SnapshotStore {
    SnapshotStore::connect(&db_path_from_env(), &json_path_from_env()).await
}

fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent("indicator-map/1.0")
        .timeout(std::time::Duration::from_secs(60))
        .build()
}
