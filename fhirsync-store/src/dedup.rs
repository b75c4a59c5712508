//! Resource deduplication across snapshot files.
//!
//! Search pages, `$everything` aggregates, and auxiliary collections
//! overlap heavily; a Patient appears in its search page and again in its
//! own aggregate. Hydration uploads each resource once, keyed by
//! `resourceType/id`.

use crate::error::StoreError;
use crate::snapshot::SnapshotStore;
use fhirsync_core::{Bundle, ResourceKey};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Scans every snapshot file and returns the deduplicated resources.
///
/// Files are scanned in [`SnapshotStore::list_bundles`] order; when the
/// same identity appears in more than one file, the later file's version
/// replaces the earlier one wholesale (no field merge). Entries without a
/// well-formed identity are skipped silently. The result is ordered by
/// identity key, which fixes the upload admission order.
pub async fn collect_resources(store: &SnapshotStore) -> Result<Vec<Value>, StoreError> {
    let mut resources: BTreeMap<ResourceKey, Value> = BTreeMap::new();

    for path in store.list_bundles().await? {
        let value = store.load_json(&path).await?;
        let bundle = Bundle::from_value(&value);
        for resource in bundle.resources() {
            let Some(key) = ResourceKey::of(resource) else {
                continue;
            };
            resources.insert(key, resource.clone());
        }
    }

    debug!(count = resources.len(), dir = %store.dir().display(), "collected snapshot resources");
    Ok(resources.into_values().collect())
}

// ============================================================================
// Tests
// ============================================================================
