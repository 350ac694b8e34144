//! This crate provides the core logic of the AWS IAM role component:
//! - Config resolution (deep merge of inputs over defaults)
//! - Drift detection between the desired configuration and the live role
//! - Reconciliation (`deploy`, `remove`) against IAM through a provider adapter
//! - Persisted component state
//!

pub mod aws;
pub mod commands;
mod config;
mod drift;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fakes;
mod provider;
pub mod state;
mod types;

// Re-exports for a small, focused public API
pub use aws::iam_client::{AwsIamClient, DEFAULT_PROPAGATION_DELAY};
pub use aws::{AwsError, AwsResult};
pub use commands::RoleComponent;
pub use config::{merge_inputs, resolve};
pub use drift::{classify, detect_replace, DriftPlan, RoleAction};
pub use error::{RoleComponentError, RoleComponentResult};
pub use provider::RoleProvider;
pub use state::{FileStateStore, PersistedState, StateError, StateStore};
pub use types::{
    DeployOutputs, DesiredConfig, ManagedPolicy, PolicyInputs, RemoteRole, RemoveOutputs,
    RoleIdentity, RoleInputs, DEFAULT_POLICY_ARN, DEFAULT_REGION, DEFAULT_ROLE_NAME,
    DEFAULT_SERVICE,
};
