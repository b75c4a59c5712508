//! Typed views over untyped FHIR JSON.

use serde_json::Value;
use std::fmt;

// ============================================================================
// Resource Identity
// ============================================================================

/// Identity of a FHIR resource, `resourceType` plus `id`.
///
/// Two resources with the same key refer to the same logical resource,
/// regardless of which snapshot file they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    /// The resource kind, e.g. `Patient`.
    pub resource_type: String,
    /// The id, unique within the resource kind.
    pub id: String,
}

impl ResourceKey {
    /// Extracts the identity of a resource value.
    ///
    /// Returns `None` when `resourceType` or `id` is missing, not a
    /// string, or empty. Such resources are not addressable and callers
    /// skip them.
    pub fn of(resource: &Value) -> Option<Self> {
        let resource_type = resource.get("resourceType")?.as_str()?;
        let id = resource.get("id")?.as_str()?;
        if resource_type.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

// ============================================================================
// Bundle View
// ============================================================================

/// Read-only view of a FHIR bundle.
///
/// The raw [`Value`] stays the persisted wire form; this view only exposes
/// the parts the pipeline reads (entries and paging links). Parsing is
/// lenient: missing or mis-typed fields read as empty, matching how a
/// search bundle with no `entry` array is a valid empty page.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    /// Links carried by the bundle, e.g. the `next` page relation.
    pub link: Vec<BundleLink>,
    /// Entries in bundle order.
    pub entry: Vec<BundleEntry>,
}

/// A link carried by a bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleLink {
    /// The link relation, e.g. `next` or `self`.
    pub relation: String,
    /// The link target, possibly relative to the server base.
    pub url: String,
}

/// A single bundle entry, optionally wrapping a resource.
#[derive(Debug, Clone, Default)]
pub struct BundleEntry {
    /// The wrapped resource, if the entry carries one.
    pub resource: Option<Value>,
}

impl Bundle {
    /// Builds a view of a bundle value.
    pub fn from_value(value: &Value) -> Self {
        let link = value
            .get("link")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .map(|link| BundleLink {
                        relation: str_field(link, "relation"),
                        url: str_field(link, "url"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entry = value
            .get("entry")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| BundleEntry {
                        resource: entry.get("resource").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { link, entry }
    }

    /// Returns the `next` page link, if present and non-empty.
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|link| link.relation == "next")
            .map(|link| link.url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Iterates over the resources carried by the bundle's entries.
    pub fn resources(&self) -> impl Iterator<Item = &Value> {
        self.entry.iter().filter_map(|entry| entry.resource.as_ref())
    }
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_key_of() {
        let resource = json!({"resourceType": "Patient", "id": "abc"});
        let key = ResourceKey::of(&resource).unwrap();
        assert_eq!(key.resource_type, "Patient");
        assert_eq!(key.id, "abc");
        assert_eq!(key.to_string(), "Patient/abc");
    }

    #[test]
    fn test_resource_key_missing_fields() {
        assert!(ResourceKey::of(&json!({"resourceType": "Patient"})).is_none());
        assert!(ResourceKey::of(&json!({"id": "abc"})).is_none());
        assert!(ResourceKey::of(&json!({"resourceType": "", "id": "abc"})).is_none());
        assert!(ResourceKey::of(&json!({"resourceType": "Patient", "id": ""})).is_none());
        assert!(ResourceKey::of(&json!({"resourceType": "Patient", "id": 7})).is_none());
        assert!(ResourceKey::of(&json!("not an object")).is_none());
    }

    #[test]
    fn test_bundle_from_value() {
        let value = json!({
            "resourceType": "Bundle",
            "link": [
                {"relation": "self", "url": "https://example.org/Patient"},
                {"relation": "next", "url": "https://example.org/Patient?page=2"}
            ],
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "1"}},
                {"fullUrl": "urn:uuid:x"}
            ]
        });

        let bundle = Bundle::from_value(&value);
        assert_eq!(bundle.link.len(), 2);
        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(
            bundle.next_link(),
            Some("https://example.org/Patient?page=2")
        );
        assert_eq!(bundle.resources().count(), 1);
    }

    #[test]
    fn test_bundle_lenient_on_missing_fields() {
        let bundle = Bundle::from_value(&json!({"resourceType": "Bundle"}));
        assert!(bundle.link.is_empty());
        assert!(bundle.entry.is_empty());
        assert!(bundle.next_link().is_none());

        // entry that is not an array reads as empty
        let bundle = Bundle::from_value(&json!({"entry": "oops"}));
        assert!(bundle.entry.is_empty());
    }

    #[test]
    fn test_next_link_empty_url_ignored() {
        let bundle = Bundle::from_value(&json!({
            "link": [{"relation": "next"}]
        }));
        assert!(bundle.next_link().is_none());
    }
}
