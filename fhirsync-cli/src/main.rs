// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! fhirsync CLI - FHIR fixture synchronization from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Pull a 10-patient snapshot from the public sandbox into ./fixtures
//! fhirsync download
//!
//! # Pull every patient the source has
//! fhirsync download --patients all
//!
//! # Load the snapshot into a local server, 8 uploads in flight
//! fhirsync load --concurrency 8
//!
//! # Stage the prebuilt patient browser bundle
//! fhirsync assets --base-path /patient-browser/
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{assets, download, load};

// ============================================================================
// CLI Definition
// ============================================================================

/// fhirsync - two-phase FHIR fixture synchronization.
#[derive(Parser)]
#[command(name = "fhirsync")]
#[command(about = "Snapshot FHIR fixtures from a source server and load them into a target")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download a fixture snapshot from the source server.
    #[command(visible_alias = "d")]
    Download(download::DownloadArgs),

    /// Load a fixture snapshot into the target server.
    #[command(visible_alias = "l")]
    Load(load::LoadArgs),

    /// Stage the prebuilt patient browser assets.
    Assets(assets::AssetsArgs),
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Download(args) => download::run(args).await,
        Commands::Load(args) => load::run(args).await,
        Commands::Assets(args) => assets::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
