//! # nearby
//!
//! CLI client for the nearby proximity sync loop.
//!
//! ## Commands
//!
//! - `init`: Initialize the local participant identity
//! - `link`: Configure the shared location store
//! - `run`: Start the periodic upload/fetch/alert loop
//! - `status`: Show local configuration
//!
//! ## Example
//!
//! ```bash
//! # Create an identity
//! nearby init --name "Alice"
//!
//! # Point at the shared store
//! nearby link --url https://store.example.com/rest/v1 --api-key <key>
//!
//! # Sync from a fixed position, alerting on peers within 100 m
//! nearby run --lat 37.7749 --lon -122.4194
//!
//! # Check configuration
//! nearby status
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{init, link, run, status};

/// CLI client for the nearby proximity sync loop.
#[derive(Parser, Debug)]
#[command(name = "nearby")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for identity and store configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the local participant identity
    Init {
        /// Display name
        #[arg(long, short)]
        name: String,
    },

    /// Configure the shared location store
    Link {
        /// Base URL of the store's REST root
        #[arg(long)]
        url: String,

        /// API key for the store
        #[arg(long)]
        api_key: String,
    },

    /// Start the periodic upload/fetch/alert loop
    Run {
        /// Latitude of the fixed position, in signed degrees
        #[arg(long)]
        lat: f64,

        /// Longitude of the fixed position, in signed degrees
        #[arg(long)]
        lon: f64,

        /// Alert radius in meters
        #[arg(long, default_value = "100")]
        radius: f64,

        /// Seconds between sync cycles
        #[arg(long, default_value = "10")]
        interval: u64,
    },

    /// Show local configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;
    config::set_dir_permissions_0700(&data_dir).await?;

    match cli.command {
        Commands::Init { name } => {
            init::run(&data_dir, &name).await?;
        }
        Commands::Link { url, api_key } => {
            link::run(&data_dir, &url, &api_key).await?;
        }
        Commands::Run {
            lat,
            lon,
            radius,
            interval,
        } => {
            run::run(&data_dir, lat, lon, radius, interval).await?;
        }
        Commands::Status => {
            status::run(&data_dir).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for the nearby CLI.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "nearby", "nearby")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
