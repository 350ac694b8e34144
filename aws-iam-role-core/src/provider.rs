//! Capability interface over the provider's role and policy API

use async_trait::async_trait;

use crate::aws::AwsResult;
use crate::types::{DesiredConfig, ManagedPolicy, RemoteRole, RoleIdentity};

/// Each method is a single remote call (or a fixed short sequence of them)
/// with no local decision logic. The reconciler awaits every call before
/// issuing the next one.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    /// `Ok(None)` when no role exists under `name`.
    async fn get_role(&self, name: &str) -> AwsResult<Option<RemoteRole>>;

    /// Create the role with its trust policy and attach the managed policy.
    /// Returns the new role's ARN.
    async fn create_role(&self, config: &DesiredConfig) -> AwsResult<String>;

    /// Point the trust policy at `config.service`.
    async fn update_assume_role_policy(&self, config: &DesiredConfig) -> AwsResult<()>;

    /// Attach `config.policy` to the role named `config.name`.
    async fn add_role_policy(&self, config: &DesiredConfig) -> AwsResult<()>;

    /// Detach `policy` from the role named `role_name`.
    async fn remove_role_policy(&self, role_name: &str, policy: &ManagedPolicy) -> AwsResult<()>;

    /// Detach `policy`, then delete the role. A role or attachment that is
    /// already gone is not an error.
    async fn delete_role(&self, identity: &RoleIdentity, policy: &ManagedPolicy) -> AwsResult<()>;
}
