//! Geneflow CLI - headless runner for gene expression scenarios.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geneflow")]
#[command(author, version, about = "Geneflow - Gene expression attachment-and-motion simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario headless and print statistics
    Run {
        /// Scenario file (default: geneflow.toml in this or a parent directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Simulated seconds to run
        #[arg(short, long, default_value = "60")]
        seconds: f64,

        /// Write the final cell snapshot as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the default scenario file, or write it to a path
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            seconds,
            snapshot,
        } => commands::run::run(config.as_deref(), seconds, snapshot.as_deref(), cli.verbose),
        Commands::Config { output } => commands::config::run(output.as_deref()),
    }
}
