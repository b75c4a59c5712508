//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

/// Error type for HTTP operations against FHIR servers.
///
/// None of these are retried: the pipeline has no transient-failure
/// handling, every error surfaces to the top level and ends the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}\n{body}")]
    Transport {
        /// The HTTP status code.
        status: u16,
        /// The request URL.
        url: String,
        /// The response body, verbatim.
        body: String,
    },

    /// The request itself failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL failed to parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The target never became ready within the deadline.
    #[error("Timed out waiting for FHIR server at {base_url} after {waited:?}")]
    ReadinessTimeout {
        /// The probed base URL.
        base_url: String,
        /// How long the prober waited.
        waited: Duration,
    },

    /// A resource queued for upload has no `resourceType`/`id` identity.
    #[error("Resource is missing resourceType or id")]
    MissingIdentity,

    /// An upload task panicked or was aborted.
    #[error("Upload task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
