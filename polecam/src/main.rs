//! # Polecam
//!
//! `polecam [run] [FLAGS]` plays episodes until interrupted or until
//! `--episodes` are done. `polecam init-checkpoint --out PATH` writes a
//! randomly initialized checkpoint for the configured architecture.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use polecam::{app, RunArgs, RunConfig};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "polecam", about = "Pixel policy harness for CartPole", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run episodes (the default).
    Run(RunArgs),
    /// Write a randomly initialized checkpoint.
    InitCheckpoint {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    match cli.command {
        Some(Command::InitCheckpoint { args, out }) => {
            let config = RunConfig::resolve(&args)?;
            app::init_checkpoint(&config, &out)
        }
        Some(Command::Run(args)) => run(&args).await,
        None => run(&cli.run).await,
    }
}

async fn run(args: &RunArgs) -> Result<()> {
    let config = RunConfig::resolve(args)?;
    let summary = app::run(config).await?;
    if summary.interrupted {
        tracing::info!(episodes = summary.episodes, "stopped by interrupt");
    }
    Ok(())
}
