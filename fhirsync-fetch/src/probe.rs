//! Readiness probe for the target server.
//!
//! Hydration must not start before the target can answer; this is a
//! blocking precondition gate, not a background health check.

use crate::client::FhirGateway;
use crate::error::FetchError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Delay between readiness attempts.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default overall readiness deadline.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);

/// Polls `{base}/metadata` until the target answers successfully.
///
/// Every failure, connection refused and non-success statuses alike, is
/// swallowed and followed by a [`PROBE_INTERVAL`] sleep. Returns
/// [`FetchError::ReadinessTimeout`] once the deadline passes without a
/// success.
pub async fn wait_until_ready<G: FhirGateway>(
    gateway: &G,
    base_url: &str,
    timeout: Duration,
) -> Result<(), FetchError> {
    let url = format!("{}/metadata?_format=json", base_url.trim_end_matches('/'));
    let deadline = Instant::now() + timeout;

    loop {
        match gateway.get_json(&url).await {
            Ok(_) => return Ok(()),
            Err(error) => {
                if Instant::now() >= deadline {
                    return Err(FetchError::ReadinessTimeout {
                        base_url: base_url.to_string(),
                        waited: timeout,
                    });
                }
                info!(base = %base_url, error = %error, "waiting for FHIR server");
                tokio::time::sleep(PROBE_INTERVAL).await;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
