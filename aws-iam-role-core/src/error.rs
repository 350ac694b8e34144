//! Error types surfaced by `deploy` and `remove`

use crate::aws::AwsError;
use crate::state::StateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoleComponentError {
    /// Inputs could not be merged into a complete configuration
    #[error("Invalid component inputs: {0}")]
    Config(String),

    #[error("State store error: {0}")]
    State(#[from] StateError),

    /// A provider call was rejected; nothing after it was attempted
    #[error("{operation} failed for role '{role}': {source}")]
    Provider {
        operation: &'static str,
        role: String,
        #[source]
        source: AwsError,
    },

    /// The old managed policy was detached but the new one could not be
    /// attached. The role is left without a managed policy until the next
    /// deploy retries the swap.
    #[error(
        "Role '{role}' is left without a managed policy: detached '{detached_arn}' but attaching '{attach_arn}' failed: {source}"
    )]
    PartialPolicyState {
        role: String,
        detached_arn: String,
        attach_arn: String,
        #[source]
        source: AwsError,
    },

    /// The renamed role is ready but the role under the previous name is still there
    #[error(
        "New role '{name}' ({arn}) is ready, but cleanup of the previous role '{old_name}' failed: {source}"
    )]
    StaleNameOrphan {
        name: String,
        arn: String,
        old_name: String,
        #[source]
        source: AwsError,
    },
}

impl RoleComponentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Adapter for `map_err` on a provider call against `role`.
    pub(crate) fn provider(operation: &'static str, role: &str) -> impl FnOnce(AwsError) -> Self {
        let role = role.to_string();
        move |source| Self::Provider {
            operation,
            role,
            source,
        }
    }
}

pub type RoleComponentResult<T> = Result<T, RoleComponentError>;
