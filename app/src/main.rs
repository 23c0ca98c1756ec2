#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, InitInput, InitStrategy, RunInput, RunStrategy, StatusInput, StatusStrategy,
    VersionStrategy,
};
use enrichor_core::RecheckPolicy;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "enrichor")]
#[command(about = "Resumable, rate-limited biography enrichment for record stores", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich the record store, resuming from a checkpoint if one exists
    Run {
        /// Config file (default: ~/enrichor/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Look up already checked records again: not-found or all
        #[arg(long, default_value = "off")]
        recheck: RecheckPolicy,
    },
    /// Initialize configuration
    Init {
        /// Where to write the config (default: ~/enrichor/config.json)
        path: Option<PathBuf>,
    },
    /// Show store coverage and checkpoint state without looking anything up
    Status {
        /// Config file (default: ~/enrichor/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show version
    Version,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Run { config, recheck } => {
            RunStrategy
                .execute(RunInput { config, recheck })
                .await
        }
        Commands::Init { path } => InitStrategy.execute(InitInput { path }).await,
        Commands::Status { config } => StatusStrategy.execute(StatusInput { config }).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
