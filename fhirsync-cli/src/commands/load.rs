//! Load command - hydrate the target server from a fixture snapshot.

use anyhow::Result;
use clap::Args;
use fhirsync_fetch::{upsert_all, wait_until_ready, FhirClient};
use fhirsync_store::{collect_resources, SnapshotStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Arguments for the load command.
#[derive(Args)]
pub struct LoadArgs {
    /// Target FHIR base URL.
    #[arg(
        long,
        env = "TARGET_FHIR_BASE",
        default_value = "http://localhost:8080/fhir"
    )]
    pub target_base: String,

    /// Directory the snapshot is read from.
    #[arg(long, env = "FIXTURES_DIR", default_value = "fixtures")]
    pub fixtures_dir: PathBuf,

    /// Maximum number of uploads in flight.
    #[arg(long, env = "CONCURRENCY", default_value_t = fhirsync_fetch::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seconds to wait for the target to become ready.
    #[arg(long, env = "READY_TIMEOUT_SECS", default_value_t = 300)]
    pub ready_timeout: u64,
}

/// Runs the load command.
pub async fn run(args: &LoadArgs) -> Result<()> {
    let target_base = args.target_base.trim_end_matches('/').to_string();
    let client = Arc::new(FhirClient::new()?);

    wait_until_ready(
        client.as_ref(),
        &target_base,
        Duration::from_secs(args.ready_timeout),
    )
    .await?;

    let store = SnapshotStore::new(&args.fixtures_dir);
    let resources = collect_resources(&store).await?;
    info!(
        count = resources.len(),
        target = %target_base,
        concurrency = args.concurrency,
        "uploading resources"
    );

    upsert_all(client, &target_base, resources, args.concurrency).await?;
    info!("upload complete");
    Ok(())
}
