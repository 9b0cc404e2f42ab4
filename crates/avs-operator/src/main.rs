//! avs-operator: price-prediction AVS operator.
//!
//! Reads the pool (or aggregator) price, predicts the next-period price,
//! commits `keccak256(prediction ‖ salt)` to the AVS manager and reveals it
//! after the configured delay. Commit and reveal can also run as separate
//! invocations; the SQLite round store in the data directory carries the
//! prediction and salt between them.

mod commands;
mod config;

use std::path::PathBuf;

use alloy_primitives::U256;
use avs_types::RoundId;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::commands::Report;
use crate::config::OperatorConfig;

#[derive(Parser, Debug)]
#[command(name = "avs-operator", version)]
#[command(about = "Commit-reveal price prediction operator")]
struct Cli {
    /// Config file (default: $AVS_DATA_DIR/operator.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict, commit, wait for the reveal delay, then reveal
    Run {
        #[arg(long, env = "ROUND_ID", default_value = "1", value_parser = parse_round_id)]
        round: RoundId,
    },

    /// Predict and commit only
    Commit {
        #[arg(long, env = "ROUND_ID", default_value = "1", value_parser = parse_round_id)]
        round: RoundId,
    },

    /// Reveal a previously committed round
    Reveal {
        #[arg(long, env = "ROUND_ID", default_value = "1", value_parser = parse_round_id)]
        round: RoundId,
    },

    /// Print the current prediction without submitting anything
    Predict,

    /// Show stored rounds
    Status {
        #[arg(long, value_parser = parse_round_id)]
        round: Option<RoundId>,
    },
}

/// Decimal or `0x`-prefixed hex `uint256`.
fn parse_round_id(s: &str) -> Result<RoundId, String> {
    s.trim()
        .parse::<U256>()
        .map_err(|e| format!("invalid round id '{s}': {e}"))
}

async fn dispatch(command: &Command, config: &OperatorConfig) -> anyhow::Result<Report> {
    match command {
        Command::Run { round } => {
            commands::round::run(&commands::round::connect(config)?, *round).await
        }
        Command::Commit { round } => {
            commands::round::commit(&commands::round::connect(config)?, *round).await
        }
        Command::Reveal { round } => {
            commands::round::reveal(&commands::round::connect(config)?, *round).await
        }
        Command::Predict => {
            let reader = commands::round::read_client(config)?;
            commands::round::predict(config, reader).await
        }
        Command::Status { round } => {
            let store = commands::round::open_store(config)?;
            commands::status::status(store.as_ref(), *round)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so that clap `env` defaults see it
    let _ = dotenv::dotenv();

    // Logs go to stderr; stdout carries the command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("avs=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = OperatorConfig::load(cli.config.as_deref())?;
    info!(data_dir = %config.data_dir().display(), "avs-operator starting");

    let report = tokio::select! {
        result = dispatch(&cli.command, &config) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl-C received, abandoning in-flight round");
            anyhow::bail!("interrupted");
        }
    };

    report.print(cli.json)
}
