//! Hotel ads CLI - operator tooling for the hotel ad engine.
//!
//! Commands:
//! - `hotelads rank` - Rank a JSON list of hotels
//! - `hotelads token` - Generate keys, encode and decode context tokens
//! - `hotelads bundle` - Encode and decode bundle ids
//! - `hotelads simulate` - Rotate ad slots for a context in memory
//! - `hotelads config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{BundleArgs, ConfigArgs, RankArgs, SimulateArgs, TokenArgs};
use logging::LogFormat;

/// Hotel ads CLI - rank hotels, inspect identifiers and simulate ad rotation
#[derive(Parser)]
#[command(name = "hotelads")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a JSON list of hotels
    Rank(RankArgs),

    /// Context token operations
    Token(TokenArgs),

    /// Bundle id operations
    Bundle(BundleArgs),

    /// Simulate ad slot rotation against an in-memory store
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_format, cli.verbose)?;

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.failure(&e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Rank(args) => commands::rank::run(args, &ctx).await,
        Commands::Token(args) => commands::token::run(args, &ctx).await,
        Commands::Bundle(args) => commands::bundle::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.failure(&e);
        std::process::exit(1);
    }

    Ok(())
}
