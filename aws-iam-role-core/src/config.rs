//! Config resolution: right-biased deep merge of caller inputs over defaults

use crate::error::{RoleComponentError, RoleComponentResult};
use crate::types::{DesiredConfig, RoleInputs};
use serde_json::Value;

/// Merge `overrides` onto `defaults` and produce the complete desired configuration.
///
/// Nested records are merged key by key, so overriding only `policy.arn` keeps
/// any other keys of the default policy. No validation happens here; bad names
/// or ARNs are rejected by the provider.
pub fn resolve(defaults: &DesiredConfig, overrides: &RoleInputs) -> RoleComponentResult<DesiredConfig> {
    let base = serde_json::to_value(defaults)
        .map_err(|e| RoleComponentError::config(format!("Failed to serialize defaults: {e}")))?;
    let overrides = serde_json::to_value(overrides)
        .map_err(|e| RoleComponentError::config(format!("Failed to serialize inputs: {e}")))?;

    serde_json::from_value(merge_deep_right(base, overrides))
        .map_err(|e| RoleComponentError::config(format!("Failed to build configuration: {e}")))
}

/// Layer one set of inputs over another, e.g. command line flags over an inputs file.
pub fn merge_inputs(base: &RoleInputs, overrides: &RoleInputs) -> RoleComponentResult<RoleInputs> {
    let base = serde_json::to_value(base)
        .map_err(|e| RoleComponentError::config(format!("Failed to serialize inputs: {e}")))?;
    let overrides = serde_json::to_value(overrides)
        .map_err(|e| RoleComponentError::config(format!("Failed to serialize inputs: {e}")))?;

    serde_json::from_value(merge_deep_right(base, overrides))
        .map_err(|e| RoleComponentError::config(format!("Failed to merge inputs: {e}")))
}

/// When both sides are objects, merge recursively per key; otherwise the right side wins.
pub(crate) fn merge_deep_right(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                let merged = match left.remove(&key) {
                    Some(existing) => merge_deep_right(existing, value),
                    None => value,
                };
                left.insert(key, merged);
            }
            Value::Object(left)
        }
        (_, right) => right,
    }
}
