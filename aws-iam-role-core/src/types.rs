//! Shared value types: desired configuration, caller inputs, provider snapshots and outputs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_ROLE_NAME: &str = "serverless";
pub const DEFAULT_SERVICE: &str = "lambda.amazonaws.com";
pub const DEFAULT_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AdministratorAccess";
pub const DEFAULT_REGION: &str = "us-east-1";

/// A managed policy slot. Compared structurally, so any extra key makes two
/// policies differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedPolicy {
    pub arn: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ManagedPolicy {
    pub fn new(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Complete desired configuration for one reconcile. Built once by
/// [`crate::resolve`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredConfig {
    pub name: String,
    pub service: String,
    pub policy: ManagedPolicy,
    pub region: String,
}

impl Default for DesiredConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ROLE_NAME.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            policy: ManagedPolicy::new(DEFAULT_POLICY_ARN),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Caller-supplied overrides. Every field is optional; absent fields fall
/// back to the defaults during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyInputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RoleInputs {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_policy_arn(mut self, arn: impl Into<String>) -> Self {
        let mut policy = self.policy.take().unwrap_or_default();
        policy.arn = Some(arn.into());
        self.policy = Some(policy);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Explicit, non-empty name override.
    pub(crate) fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Identifies a role for lookups and deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleIdentity {
    pub name: String,
    pub arn: Option<String>,
}

impl RoleIdentity {
    pub fn new(name: impl Into<String>, arn: Option<String>) -> Self {
        Self {
            name: name.into(),
            arn,
        }
    }
}

/// Snapshot of a role as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRole {
    pub name: String,
    pub arn: String,
    /// First service principal of the trust policy, if any
    pub service: Option<String>,
    /// First attached managed policy, if any
    pub policy: Option<ManagedPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOutputs {
    pub name: String,
    pub arn: String,
    pub service: String,
    pub policy: ManagedPolicy,
}

impl DeployOutputs {
    pub(crate) fn new(desired: DesiredConfig, arn: String) -> Self {
        Self {
            name: desired.name,
            arn,
            service: desired.service,
            policy: desired.policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutputs {
    pub name: String,
}
