//! Bounded-concurrency upsert scheduler.
//!
//! Drives normalize-then-PUT for every resource under a fixed
//! parallelism ceiling. A semaphore holds the permits: admission acquires
//! one, the task releases it when it settles. Admission order follows the
//! input order; completion order across in-flight uploads does not.

use crate::client::FhirGateway;
use crate::error::FetchError;
use fhirsync_core::{normalize, ResourceKey};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Default upload concurrency limit.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Uploads every resource to the target as an idempotent replace.
///
/// Each resource is normalized and `PUT` to `{base}/{resourceType}/{id}`.
/// At most `limit` uploads are in flight at once (a limit of zero is
/// treated as one). On the first failure no further resources are
/// admitted; uploads already in flight run to completion and the first
/// error is returned. There is no rollback of uploads that already
/// succeeded.
pub async fn upsert_all<G>(
    gateway: Arc<G>,
    base_url: &str,
    resources: Vec<Value>,
    limit: usize,
) -> Result<(), FetchError>
where
    G: FhirGateway + 'static,
{
    let base = base_url.trim_end_matches('/').to_string();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks: JoinSet<Result<(), FetchError>> = JoinSet::new();
    let mut first_error: Option<FetchError> = None;

    for resource in resources {
        // The semaphore is never closed; an Err here is unreachable.
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };

        while let Some(settled) = tasks.try_join_next() {
            record_error(&mut first_error, settled);
        }
        if first_error.is_some() {
            break;
        }

        let gateway = Arc::clone(&gateway);
        let base = base.clone();
        tasks.spawn(async move {
            let _permit = permit;
            upsert_one(gateway.as_ref(), &base, resource).await
        });
    }

    while let Some(settled) = tasks.join_next().await {
        record_error(&mut first_error, settled);
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

async fn upsert_one<G: FhirGateway + ?Sized>(
    gateway: &G,
    base: &str,
    resource: Value,
) -> Result<(), FetchError> {
    let key = ResourceKey::of(&resource).ok_or(FetchError::MissingIdentity)?;
    let resource = normalize(resource);
    let url = format!("{base}/{key}");
    debug!(resource = %key, "uploading");
    gateway.put_json(&url, &resource).await?;
    Ok(())
}

fn record_error(
    first_error: &mut Option<FetchError>,
    settled: Result<Result<(), FetchError>, tokio::task::JoinError>,
) {
    let outcome = settled.map_err(FetchError::from).and_then(|inner| inner);
    if let Err(error) = outcome {
        first_error.get_or_insert(error);
    }
}

// ============================================================================
// Tests
// ============================================================================
