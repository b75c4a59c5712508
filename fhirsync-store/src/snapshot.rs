//! File-based snapshot store.
//!
//! One directory holds the whole snapshot; the naming convention doubles
//! as the manifest. Search pages are ordinal-suffixed, per-subject
//! aggregates are id-suffixed, auxiliary collections use a fixed name per
//! kind. Extraction writes the snapshot, hydration only reads it.

use crate::error::StoreError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name prefix for search page files, removed before re-extraction.
pub const SEARCH_PAGE_PREFIX: &str = "patient-search-";

/// Reads and writes bundle files in one snapshot directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store over the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The snapshot directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the snapshot directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Removes search page files left over from a previous extraction.
    ///
    /// Only pages are cleared: a shrinking search result must not leave
    /// stale trailing pages behind, while aggregate and collection files
    /// are simply overwritten by the new run.
    pub async fn clear_search_pages(&self) -> Result<(), StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(SEARCH_PAGE_PREFIX) {
                debug!(file = %name.to_string_lossy(), "removing stale search page");
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    /// Persists one search page bundle, 1-based and zero-padded.
    pub async fn save_search_page(
        &self,
        ordinal: usize,
        bundle: &Value,
    ) -> Result<PathBuf, StoreError> {
        self.save(&format!("{SEARCH_PAGE_PREFIX}{ordinal:02}.json"), bundle)
            .await
    }

    /// Persists the `$everything` aggregate bundle for one subject.
    pub async fn save_everything(&self, id: &str, bundle: &Value) -> Result<PathBuf, StoreError> {
        self.save(&format!("patient-{id}-everything.json"), bundle)
            .await
    }

    /// Persists an auxiliary collection bundle under its fixed name.
    pub async fn save_collection(&self, name: &str, bundle: &Value) -> Result<PathBuf, StoreError> {
        self.save(&format!("{name}.json"), bundle).await
    }

    async fn save(&self, file_name: &str, bundle: &Value) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(file_name);
        let mut json = serde_json::to_string_pretty(bundle)?;
        json.push('\n');
        tokio::fs::write(&path, json).await?;
        debug!(path = %path.display(), "snapshot file written");
        Ok(path)
    }

    /// Lists every `.json` file in the snapshot, sorted by file name.
    ///
    /// Directory listing order is filesystem-dependent, so the scan order
    /// is pinned to lexicographic file names; "latest file wins" during
    /// deduplication means the last file in this order.
    pub async fn list_bundles(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("json")
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Loads one snapshot file as JSON.
    pub async fn load_json(&self, path: &Path) -> Result<Value, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (_dir, store) = store();
        store.ensure_dir().await.unwrap();

        let bundle = json!({"resourceType": "Bundle", "entry": []});
        let path = store.save_search_page(1, &bundle).await.unwrap();

        assert!(path.ends_with("patient-search-01.json"));
        assert_eq!(store.load_json(&path).await.unwrap(), bundle);

        // wire format: pretty-printed with a trailing newline
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.contains("\n  \"entry\""));
    }

    #[tokio::test]
    async fn test_list_bundles_sorted_by_name() {
        let (_dir, store) = store();
        let bundle = json!({});

        store.save_collection("practitioners", &bundle).await.unwrap();
        store.save_search_page(2, &bundle).await.unwrap();
        store.save_everything("abc", &bundle).await.unwrap();
        store.save_search_page(1, &bundle).await.unwrap();

        let names: Vec<String> = store
            .list_bundles()
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "patient-abc-everything.json",
                "patient-search-01.json",
                "patient-search-02.json",
                "practitioners.json"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_bundles_ignores_non_json() {
        let (_dir, store) = store();
        store.save_search_page(1, &json!({})).await.unwrap();
        tokio::fs::write(store.dir().join("notes.txt"), "x")
            .await
            .unwrap();

        assert_eq!(store.list_bundles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_search_pages_keeps_other_files() {
        let (_dir, store) = store();
        let bundle = json!({});
        store.save_search_page(1, &bundle).await.unwrap();
        store.save_search_page(2, &bundle).await.unwrap();
        store.save_everything("abc", &bundle).await.unwrap();
        store.save_collection("practitioners", &bundle).await.unwrap();

        store.clear_search_pages().await.unwrap();

        let names: Vec<String> = store
            .list_bundles()
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["patient-abc-everything.json", "practitioners.json"]
        );
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("a").join("b"));
        store.ensure_dir().await.unwrap();
        assert!(store.dir().is_dir());
    }
}
