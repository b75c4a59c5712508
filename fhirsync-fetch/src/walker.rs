//! Paginated search walker.
//!
//! Follows a search result's `next` links page by page, collecting
//! distinct entry ids until the target count is reached or pagination
//! ends. Pages are pulled one at a time so the caller can persist each
//! bundle before the next request goes out.

use crate::client::FhirGateway;
use crate::error::FetchError;
use fhirsync_core::Bundle;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};
use url::Url;

/// Walks a paged FHIR search, one bundle per call.
///
/// A walk never revisits a page URL: a `next` link pointing back at an
/// already-fetched page ends the walk with the partial result rather
/// than looping. Unresolvable `next` links likewise end the walk; both
/// cases are logged, neither is an error.
pub struct SearchWalker<'a, G> {
    gateway: &'a G,
    base: Url,
    next_url: Option<Url>,
    visited: HashSet<String>,
    seen: HashSet<String>,
    ids: Vec<String>,
    target: usize,
}

impl<'a, G: FhirGateway> SearchWalker<'a, G> {
    /// Prepares a walk over `{base}/{resource_type}`.
    ///
    /// The first page requests `min(page_size, target_count)` items when
    /// `target_count` is positive, else `page_size`. A `target_count` of
    /// zero means unbounded: the walk runs until pagination ends.
    pub fn new(
        gateway: &'a G,
        base_url: &str,
        resource_type: &str,
        page_size: usize,
        target_count: usize,
    ) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)?;

        let count = if target_count > 0 {
            page_size.min(target_count)
        } else {
            page_size
        };
        let mut first = Url::parse(&format!(
            "{}/{resource_type}",
            base_url.trim_end_matches('/')
        ))?;
        first
            .query_pairs_mut()
            .append_pair("_count", &count.to_string())
            .append_pair("_format", "json");

        Ok(Self {
            gateway,
            base,
            next_url: Some(first),
            visited: HashSet::new(),
            seen: HashSet::new(),
            ids: Vec::new(),
            target: target_count,
        })
    }

    /// Fetches the next page, or `None` when the walk is over.
    ///
    /// The returned value is the raw bundle as served; callers persist it
    /// before asking for the following page.
    pub async fn next_page(&mut self) -> Result<Option<Value>, FetchError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let url_string = url.to_string();
        if !self.visited.insert(url_string.clone()) {
            warn!(url = %url_string, "detected loop while paging search, stopping");
            return Ok(None);
        }

        info!(page = self.visited.len(), url = %url_string, "fetching search page");
        let value = self.gateway.get_json(&url_string).await?;
        let bundle = Bundle::from_value(&value);

        let mut reached_target = false;
        for resource in bundle.resources() {
            let Some(id) = resource.get("id").and_then(Value::as_str) else {
                continue;
            };
            if id.is_empty() {
                continue;
            }
            if self.seen.insert(id.to_string()) {
                self.ids.push(id.to_string());
            }
            if self.target > 0 && self.ids.len() >= self.target {
                reached_target = true;
                break;
            }
        }

        if reached_target {
            self.ids.truncate(self.target);
            return Ok(Some(value));
        }

        if let Some(raw) = bundle.next_link() {
            match self.base.join(raw) {
                Ok(next) => self.next_url = Some(next),
                Err(error) => {
                    warn!(url = %raw, error = %error, "unresolvable next link, treating as end of pagination");
                }
            }
        }

        Ok(Some(value))
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> usize {
        self.visited.len()
    }

    /// Consumes the walker, yielding the distinct ids in first-seen order.
    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Gateway serving canned bundles keyed by exact URL.
    struct MockGateway {
        pages: HashMap<String, Value>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn new(pages: Vec<(&str, Value)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, value)| (url.to_string(), value))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FhirGateway for MockGateway {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Transport {
                    status: 404,
                    url: url.to_string(),
                    body: String::new(),
                })
        }

        async fn put_json(&self, url: &str, _body: &Value) -> Result<Value, FetchError> {
            Err(FetchError::Transport {
                status: 405,
                url: url.to_string(),
                body: String::new(),
            })
        }
    }

    fn patient_page(ids: &[&str], next: Option<&str>) -> Value {
        let entries: Vec<Value> = ids
            .iter()
            .map(|id| json!({"resource": {"resourceType": "Patient", "id": id}}))
            .collect();
        let mut bundle = json!({"resourceType": "Bundle", "entry": entries});
        if let Some(next) = next {
            bundle["link"] = json!([{"relation": "next", "url": next}]);
        }
        bundle
    }

    const BASE: &str = "https://example.org/fhir";
    const PAGE1: &str = "https://example.org/fhir/Patient?_count=2&_format=json";
    const PAGE2: &str = "https://example.org/fhir/Patient?page=2";

    async fn drain<G: FhirGateway>(walker: &mut SearchWalker<'_, G>) -> Vec<Value> {
        let mut pages = Vec::new();
        while let Some(page) = walker.next_page().await.unwrap() {
            pages.push(page);
        }
        pages
    }

    #[tokio::test]
    async fn test_target_truncates_across_pages() {
        let gateway = MockGateway::new(vec![
            (PAGE1, patient_page(&["a", "b"], Some(PAGE2))),
            (PAGE2, patient_page(&["c", "d"], None)),
        ]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 3).unwrap();
        let pages = drain(&mut walker).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(walker.pages(), 2);
        assert_eq!(walker.into_ids(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_first_page_count_is_min_of_page_size_and_target() {
        let url = "https://example.org/fhir/Patient?_count=3&_format=json";
        let gateway = MockGateway::new(vec![(url, patient_page(&["a"], None))]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 200, 3).unwrap();
        drain(&mut walker).await;

        assert_eq!(gateway.calls(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_unbounded_walk_follows_all_pages() {
        let gateway = MockGateway::new(vec![
            (PAGE1, patient_page(&["a", "b"], Some(PAGE2))),
            (PAGE2, patient_page(&["c"], None)),
        ]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();
        let pages = drain(&mut walker).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(walker.into_ids(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_loop_guard_stops_without_refetching() {
        // Second page links back to the first; the walk must end with the
        // partial result instead of looping.
        let gateway = MockGateway::new(vec![
            (PAGE1, patient_page(&["a"], Some(PAGE2))),
            (PAGE2, patient_page(&["b"], Some(PAGE1))),
        ]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();
        let pages = drain(&mut walker).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(gateway.calls().len(), 2);
        assert_eq!(walker.into_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_relative_next_link_resolves_against_base() {
        let gateway = MockGateway::new(vec![
            (PAGE1, patient_page(&["a"], Some("/fhir/Patient?page=2"))),
            (PAGE2, patient_page(&["b"], None)),
        ]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();
        drain(&mut walker).await;

        assert_eq!(walker.into_ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_next_link_ends_pagination() {
        let gateway = MockGateway::new(vec![(
            PAGE1,
            patient_page(&["a"], Some("http://[not-a-url")),
        )]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();
        let pages = drain(&mut walker).await;

        assert_eq!(pages.len(), 1);
        assert_eq!(walker.into_ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_counted_once() {
        let gateway = MockGateway::new(vec![
            (PAGE1, patient_page(&["a", "b"], Some(PAGE2))),
            (PAGE2, patient_page(&["b", "c"], None)),
        ]);

        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();
        drain(&mut walker).await;

        assert_eq!(walker.into_ids(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let gateway = MockGateway::new(vec![]);
        let mut walker = SearchWalker::new(&gateway, BASE, "Patient", 2, 0).unwrap();

        let result = walker.next_page().await;
        assert!(matches!(
            result,
            Err(FetchError::Transport { status: 404, .. })
        ));
    }
}
