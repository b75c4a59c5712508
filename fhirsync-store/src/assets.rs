//! Static asset staging for the bundled patient browser.
//!
//! Copies a prebuilt front-end bundle into the public directory and
//! rewrites root-absolute asset references in `index.html` to the
//! configured base path. Pure file-copy and string-rewrite; building the
//! bundle itself is out of scope here.

use crate::error::StoreError;
use regex::{Captures, Regex};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default base path the browser is served under.
pub const DEFAULT_BASE_PATH: &str = "/patient-browser/";

/// Stages the asset bundle at `dist_dir` into `target_dir`.
///
/// The target directory is replaced wholesale. `base_path` is normalized
/// to end with exactly one slash before rewriting.
pub async fn stage_assets(
    dist_dir: &Path,
    target_dir: &Path,
    base_path: &str,
) -> Result<(), StoreError> {
    if !dist_dir.is_dir() {
        return Err(StoreError::MissingAssets(dist_dir.to_path_buf()));
    }

    let base = normalize_base_path(base_path);

    if target_dir.exists() {
        tokio::fs::remove_dir_all(target_dir).await?;
    }
    tokio::fs::create_dir_all(target_dir).await?;
    copy_tree(dist_dir.to_path_buf(), target_dir.to_path_buf()).await?;

    let index = target_dir.join("index.html");
    if index.is_file() {
        let html = tokio::fs::read_to_string(&index).await?;
        let rewritten = rewrite_asset_roots(&html, &base)?;
        tokio::fs::write(&index, rewritten).await?;
        debug!(path = %index.display(), base = %base, "rewrote asset roots");
    }

    info!(target = %target_dir.display(), "asset bundle staged");
    Ok(())
}

/// Ensures the base path ends with exactly one slash.
fn normalize_base_path(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

/// Rewrites `href="/..."` and `src="/..."` references to live under the
/// base path. References already under the base path stay as they are.
fn rewrite_asset_roots(html: &str, base: &str) -> Result<String, StoreError> {
    let pattern = Regex::new(r#"(href|src)="(/[^"]*)""#)?;
    let rewritten = pattern.replace_all(html, |caps: &Captures<'_>| {
        let attr = &caps[1];
        let path = &caps[2];
        if path.starts_with(base) {
            caps[0].to_string()
        } else {
            format!("{attr}=\"{base}{}\"", &path[1..])
        }
    });
    Ok(rewritten.into_owned())
}

/// Recursively copies a directory tree.
fn copy_tree(
    from: PathBuf,
    to: PathBuf,
) -> std::pin::Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let source = entry.path();
            let dest = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                tokio::fs::create_dir_all(&dest).await?;
                copy_tree(source, dest).await?;
            } else {
                tokio::fs::copy(&source, &dest).await?;
            }
        }
        Ok(())
    })
}

// ============================================================================
// Tests
// ============================================================================
