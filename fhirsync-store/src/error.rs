//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur reading or writing the snapshot directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Asset source directory does not exist.
    #[error("Asset bundle not found at {0}")]
    MissingAssets(PathBuf),

    /// Invalid rewrite pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
