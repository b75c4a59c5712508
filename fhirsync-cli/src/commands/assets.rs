//! Assets command - stage the prebuilt patient browser bundle.

use anyhow::Result;
use clap::Args;
use fhirsync_store::{stage_assets, DEFAULT_BASE_PATH};
use std::path::PathBuf;

/// Arguments for the assets command.
#[derive(Args)]
pub struct AssetsArgs {
    /// Directory holding the prebuilt browser bundle.
    #[arg(long, default_value = "submodules/patient-browser/dist")]
    pub dist_dir: PathBuf,

    /// Directory the bundle is staged into.
    #[arg(long, default_value = "public/patient-browser")]
    pub target_dir: PathBuf,

    /// Base path the browser is served under.
    #[arg(long, env = "PATIENT_BROWSER_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    pub base_path: String,
}

/// Runs the assets command.
pub async fn run(args: &AssetsArgs) -> Result<()> {
    stage_assets(&args.dist_dir, &args.target_dir, &args.base_path).await?;
    Ok(())
}
