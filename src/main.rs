//! Dip Sentinel - dip-or-trap verdicts for pump.fun tokens
//!
//! Scores are heuristics over public on-chain and market data. They are not
//! trading advice.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use dip_sentinel::cli::commands;
use dip_sentinel::config::Config;

/// Dip Sentinel - dip opportunity or trap
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "sentinel.toml", env = "SENTINEL_CONFIG")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the token in a snapshot file
    Analyze {
        /// Snapshot JSON (token, holders, flow or trades, prices)
        snapshot: PathBuf,

        /// Replace the snapshot's token and flow with live DexScreener data
        #[arg(long)]
        live: bool,

        /// Print the full audit report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.log_json)?;

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Analyze {
            snapshot,
            live,
            json,
        } => commands::analyze(&config, &snapshot, live, json).await,
        Commands::Config { json } => commands::show_config(&config, json),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr so report output on stdout stays clean
fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("dip_sentinel=info".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
