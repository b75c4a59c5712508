//! Resource normalization applied before upload.
//!
//! Source servers hand out data the target server's validation rejects.
//! Two rules fix the known cases: attachment payloads that are not valid
//! base64, and legacy `MedicationAdministration.status` codes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

/// Status codes accepted for `MedicationAdministration.status`.
pub const MEDICATION_ADMINISTRATION_STATUSES: [&str; 7] = [
    "in-progress",
    "not-done",
    "on-hold",
    "completed",
    "entered-in-error",
    "stopped",
    "unknown",
];

/// Normalizes a resource so the target server accepts it.
///
/// Takes the resource by value and returns the rewritten tree; callers
/// that need the original keep their own copy.
pub fn normalize(mut resource: Value) -> Value {
    normalize_status(&mut resource);
    reencode_attachments(&mut resource);
    resource
}

/// Maps legacy `MedicationAdministration.status` codes onto the accepted
/// value set: `not-taken` becomes `not-done`, any other unrecognized code
/// drops the field rather than uploading an invalid enum.
fn normalize_status(resource: &mut Value) {
    let Some(object) = resource.as_object_mut() else {
        return;
    };
    if object.get("resourceType").and_then(Value::as_str) != Some("MedicationAdministration") {
        return;
    }
    let Some(status) = object.get("status").and_then(Value::as_str) else {
        return;
    };
    if MEDICATION_ADMINISTRATION_STATUSES.contains(&status) {
        return;
    }
    if status == "not-taken" {
        object.insert("status".to_string(), Value::String("not-done".to_string()));
    } else {
        object.remove("status");
    }
}

/// Walks the resource tree and base64-encodes attachment payloads that do
/// not look like base64 already.
///
/// Any object carrying both a string `data` and a string `contentType`
/// counts as an attachment. The check is a heuristic: a plaintext value
/// that happens to use only the base64 alphabet passes through untouched,
/// and no length validation is attempted. Re-encoding encoded output is a
/// no-op, so the rule is idempotent.
fn reencode_attachments(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                reencode_attachments(item);
            }
        }
        Value::Object(object) => {
            let encoded = match (
                object.get("data").and_then(Value::as_str),
                object.get("contentType").and_then(Value::as_str),
            ) {
                (Some(data), Some(_)) => {
                    let candidate = data.trim();
                    (!candidate.is_empty() && !is_base64_alphabet(candidate))
                        .then(|| BASE64.encode(candidate.as_bytes()))
                }
                _ => None,
            };
            if let Some(encoded) = encoded {
                object.insert("data".to_string(), Value::String(encoded));
            }
            for nested in object.values_mut() {
                reencode_attachments(nested);
            }
        }
        _ => {}
    }
}

fn is_base64_alphabet(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

// ============================================================================
// Tests
// ============================================================================
