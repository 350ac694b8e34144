//! Assume-role (trust) policy documents: build for a service principal, read one back

use serde::Serialize;
use serde_json::Value;

use crate::aws::{AwsError, AwsResult};

const POLICY_VERSION: &str = "2012-10-17";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TrustPolicy<'a> {
    version: &'a str,
    statement: TrustStatement<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TrustStatement<'a> {
    effect: &'a str,
    principal: ServicePrincipal<'a>,
    action: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServicePrincipal<'a> {
    service: &'a str,
}

/// Trust policy allowing `service` to assume the role.
pub(crate) fn build_trust_policy(service: &str) -> AwsResult<String> {
    let policy = TrustPolicy {
        version: POLICY_VERSION,
        statement: TrustStatement {
            effect: "Allow",
            principal: ServicePrincipal { service },
            action: "sts:AssumeRole",
        },
    };
    serde_json::to_string(&policy)
        .map_err(|e| AwsError::PolicyError(format!("Failed to serialize trust policy: {e}")))
}

/// First element of a value IAM allows as either a single item or an array.
fn first_of(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Service principal of the first trust statement, if it names one.
///
/// IAM returns the document URL-encoded. `Statement` may be an object or an
/// array, `Principal.Service` a string or an array; the first entry wins.
pub(crate) fn service_principal(encoded_document: &str) -> AwsResult<Option<String>> {
    let decoded = percent_encoding::percent_decode_str(encoded_document)
        .decode_utf8()
        .map_err(|e| AwsError::PolicyError(format!("Failed to URL decode trust policy: {e}")))?;

    let policy: Value = serde_json::from_str(&decoded)
        .map_err(|e| AwsError::PolicyError(format!("Failed to parse trust policy JSON: {e}")))?;

    let statement = policy
        .get("Statement")
        .ok_or_else(|| AwsError::PolicyError("Trust policy has no Statement".to_string()))?;

    // A wildcard principal ("*") or an AWS/Federated principal names no service
    let service = first_of(statement)
        .and_then(|statement| statement.get("Principal"))
        .and_then(|principal| principal.get("Service"))
        .and_then(first_of)
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(service)
}
