//! HTTP gateway trait and the reqwest-backed client.

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The FHIR JSON media type, sent as both `Accept` and `Content-Type`.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Default request timeout in seconds. Generous because `$everything`
/// bundles for data-rich patients can run to several megabytes.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Gateway Trait
// ============================================================================

/// Minimal JSON-over-HTTP surface the pipeline needs.
///
/// The walker, the readiness prober, and the upload scheduler all take a
/// gateway rather than a concrete client, so tests drive them with
/// in-memory fakes and production injects one [`FhirClient`] everywhere.
#[async_trait]
pub trait FhirGateway: Send + Sync {
    /// Issues a GET and parses the response body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// Issues a PUT with a JSON body and parses the response body as JSON.
    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, FetchError>;
}

// ============================================================================
// Reqwest Client
// ============================================================================

/// HTTP client speaking `application/fhir+json`.
///
/// Constructed explicitly and passed to each component; there is no
/// process-wide client handle.
#[derive(Debug, Clone)]
pub struct FhirClient {
    inner: Client,
}

impl FhirClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fhirsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    /// Fetches the `$everything` aggregate bundle for one subject.
    pub async fn everything(
        &self,
        base_url: &str,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, FetchError> {
        let url = format!(
            "{}/{resource_type}/{id}/$everything?_format=json",
            base_url.trim_end_matches('/')
        );
        self.get_json(&url).await
    }

    /// Fetches a fixed-size collection of one resource kind.
    pub async fn collection(
        &self,
        base_url: &str,
        resource_type: &str,
        count: usize,
    ) -> Result<Value, FetchError> {
        let url = format!(
            "{}/{resource_type}?_count={count}&_format=json",
            base_url.trim_end_matches('/')
        );
        self.get_json(&url).await
    }
}

#[async_trait]
impl FhirGateway for FhirClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url = %url, "GET");
        let response = self
            .inner
            .get(url)
            .header(header::ACCEPT, FHIR_JSON)
            .send()
            .await?;
        read_json(url, response).await
    }

    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, FetchError> {
        debug!(url = %url, "PUT");
        let response = self
            .inner
            .put(url)
            .header(header::ACCEPT, FHIR_JSON)
            .header(header::CONTENT_TYPE, FHIR_JSON)
            .json(body)
            .send()
            .await?;
        read_json(url, response).await
    }
}

/// Classifies the response: non-success statuses become
/// [`FetchError::Transport`] carrying the body, success bodies parse as
/// JSON (empty bodies read as `null`).
async fn read_json(url: &str, response: Response) -> Result<Value, FetchError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(FetchError::Transport {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }

    if body.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body)?)
}
