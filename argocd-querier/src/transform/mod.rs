//! Reshaping of ArgoCD list payloads.
//!
//! Upstream items are treated as untyped JSON. A single malformed item is
//! skipped with a [`TransformWarning`]; the call only fails when the `items`
//! collection itself is unusable or when not a single item could be read.

mod applications;
mod projects;

pub use applications::transform_applications;
pub use projects::transform_projects;

use crate::errors::GatewayError;
use crate::metrics_defs::TRANSFORM_SKIPPED_ITEMS;
use serde_json::Value;
use shared::counter;

/// One upstream list item, schema owned by ArgoCD
pub type RawUpstreamItem = Value;

/// An upstream item that was skipped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformWarning {
    /// Position of the item in the upstream `items` array
    pub index: usize,
    pub reason: String,
}

/// Transformer output together with the items it had to skip
#[derive(Clone, Debug, PartialEq)]
pub struct Transformed<T> {
    pub value: T,
    pub warnings: Vec<TransformWarning>,
}

/// Parses the body and returns its `items` array.
///
/// ArgoCD serializes an empty list as `"items": null`, which is read as no items.
fn parse_items(body: &[u8]) -> Result<Vec<RawUpstreamItem>, GatewayError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::Transform(format!("body is not valid JSON: {e}")))?;

    let Value::Object(mut payload) = payload else {
        return Err(GatewayError::Transform("body is not a JSON object".into()));
    };

    match payload.remove("items") {
        None => Err(GatewayError::Transform("missing `items` field".into())),
        Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(GatewayError::Transform("`items` is not an array".into())),
    }
}

/// Runs `extract` over every item, keeping order and skipping failures.
fn extract_items<T, F>(
    resource: &'static str,
    items: Vec<RawUpstreamItem>,
    extract: F,
) -> Result<Transformed<Vec<T>>, GatewayError>
where
    F: Fn(&RawUpstreamItem) -> Result<T, String>,
{
    let total = items.len();
    let mut extracted = Vec::with_capacity(total);
    let mut warnings = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match extract(item) {
            Ok(value) => extracted.push(value),
            Err(reason) => {
                tracing::warn!(resource, index, %reason, "Skipping malformed upstream item");
                counter!(TRANSFORM_SKIPPED_ITEMS, "resource" => resource).increment(1);
                warnings.push(TransformWarning { index, reason });
            }
        }
    }

    if total > 0 && extracted.is_empty() {
        return Err(GatewayError::Transform(format!(
            "none of the {total} {resource} items could be read"
        )));
    }

    Ok(Transformed {
        value: extracted,
        warnings,
    })
}

/// Reads the string at a JSON pointer such as `/metadata/name`.
fn string_at(item: &RawUpstreamItem, pointer: &str) -> Result<String, String> {
    match item.pointer(pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("`{pointer}` is not a string")),
        None => Err(format!("missing `{pointer}`")),
    }
}
