//! CLI command implementations.

pub mod bundle;
pub mod config;
pub mod rank;
pub mod simulate;
pub mod token;

use std::io::Read;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use hotelads_engine::ranking::DEFAULT_SORT;
use hotelads_engine::Hotel;

use crate::context::Context;

/// Arguments for the rank command.
#[derive(Args)]
pub struct RankArgs {
    /// JSON file with an array of hotels ("-" for stdin).
    pub input: String,

    /// Comma-separated criteria: distance, popularity, rating, price.
    #[arg(short, long, default_value = DEFAULT_SORT)]
    pub sort: String,

    /// Sort ascending instead of descending.
    #[arg(long)]
    pub ascending: bool,

    /// Rank by closeness of the best price to this value.
    #[arg(long)]
    pub target_price: Option<f64>,

    /// Fail on unknown criteria instead of ignoring them.
    #[arg(long)]
    pub strict: bool,

    /// Maximum hotels to show (default: ads.max_recommendations).
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the token command.
#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Generate a new encryption key.
    Keygen,
    /// Encrypt a context id.
    Encode {
        /// Context id.
        id: u64,
    },
    /// Decrypt a context token.
    Decode {
        /// Context token.
        token: String,
    },
}

/// Arguments for the bundle command.
#[derive(Args)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

#[derive(Subcommand)]
pub enum BundleCommand {
    /// Build a bundle id for a zipcode and hotel.
    Encode {
        /// Five-digit zipcode.
        zipcode: String,
        /// Hotel id.
        hotel_id: u64,
    },
    /// Decode a bundle id.
    Decode {
        /// Bundle id.
        bundle_id: String,
    },
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// JSON file with an array of hotels ("-" for stdin).
    pub input: String,

    /// Zipcode the hotels belong to.
    #[arg(short, long, default_value = "10001")]
    pub zipcode: String,

    /// Number of times every slot is requested.
    #[arg(short, long, default_value = "3")]
    pub rounds: usize,

    /// Seed for a reproducible rotation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma-separated sort criteria.
    #[arg(short, long, default_value = DEFAULT_SORT)]
    pub sort: String,

    /// Event date (YYYY-MM-DD); the stay is booked around it.
    #[arg(long)]
    pub event_date: Option<NaiveDate>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Output path.
        #[arg(short, long, default_value = "hotelads.toml")]
        path: String,

        /// Public hostname of the ad server.
        #[arg(long, default_value = "localhost")]
        hostname: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

/// Read a JSON array of hotels from a file or stdin.
pub fn read_hotels(input: &str, ctx: &Context) -> Result<Vec<Hotel>> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read hotels from stdin")?;
        buf
    } else {
        let path = ctx.resolve_path(input);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read hotels file: {}", path.display()))?
    };
    serde_json::from_str(&content).context("Hotels must be a JSON array of hotel objects")
}
