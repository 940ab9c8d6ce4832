//! # sbt CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to the subcommand handlers in the `sbt_cli` library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sbt_cli::keys::{run_keys, KeysArgs};
use sbt_cli::recovery::{run_recovery, RecoveryArgs};
use sbt_cli::replay::{run_replay, ReplayArgs};

/// Non-transferable token ledger toolchain.
///
/// Generates recovery keys, signs recovery challenges, and replays
/// scripted operations against an in-memory ledger.
#[derive(Parser, Debug)]
#[command(name = "sbt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a ledger configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ed25519 key generation and address derivation.
    Keys(KeysArgs),

    /// Build and sign recovery challenges.
    Recovery(RecoveryArgs),

    /// Replay a YAML script of ledger operations.
    Replay(ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    // Logs go to stderr; stdout carries command output.
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "sbt CLI starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Keys(args) => run_keys(&args),
        Commands::Recovery(args) => run_recovery(&args, config),
        Commands::Replay(args) => run_replay(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
