//! In-memory fakes for the provider and state store (testing only)
//!
//! `RecordingProvider` simulates IAM closely enough for reconcile tests and
//! records every call it receives; `MemoryStateStore` keeps the state in memory.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::aws::{AwsError, AwsResult};
use crate::provider::RoleProvider;
use crate::state::{PersistedState, StateResult, StateStore};
use crate::types::{DesiredConfig, ManagedPolicy, RemoteRole, RoleIdentity};

const FAKE_ACCOUNT: &str = "123456789012";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn role_arn(name: &str) -> String {
    format!("arn:aws:iam::{FAKE_ACCOUNT}:role/{name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    GetRole,
    CreateRole,
    UpdateAssumeRolePolicy,
    AddRolePolicy,
    RemoveRolePolicy,
    DeleteRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    GetRole {
        name: String,
    },
    CreateRole {
        name: String,
        service: String,
        policy_arn: String,
    },
    UpdateAssumeRolePolicy {
        name: String,
        service: String,
    },
    AddRolePolicy {
        name: String,
        policy_arn: String,
    },
    RemoveRolePolicy {
        name: String,
        policy_arn: String,
    },
    DeleteRole {
        name: String,
        arn: Option<String>,
        policy_arn: String,
    },
}

impl ProviderCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::GetRole { .. } => CallKind::GetRole,
            Self::CreateRole { .. } => CallKind::CreateRole,
            Self::UpdateAssumeRolePolicy { .. } => CallKind::UpdateAssumeRolePolicy,
            Self::AddRolePolicy { .. } => CallKind::AddRolePolicy,
            Self::RemoveRolePolicy { .. } => CallKind::RemoveRolePolicy,
            Self::DeleteRole { .. } => CallKind::DeleteRole,
        }
    }
}

/// Fake IAM: a map of roles by name plus a log of calls.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    roles: Mutex<BTreeMap<String, RemoteRole>>,
    calls: Mutex<Vec<ProviderCall>>,
    failing: Mutex<HashSet<CallKind>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a role that already exists provider-side.
    pub fn with_role(self, role: RemoteRole) -> Self {
        lock(&self.roles).insert(role.name.clone(), role);
        self
    }

    /// Seed a role built from a configuration, as `create_role` would leave it.
    pub fn with_role_from(self, config: &DesiredConfig) -> Self {
        self.with_role(RemoteRole {
            name: config.name.clone(),
            arn: role_arn(&config.name),
            service: Some(config.service.clone()),
            policy: Some(config.policy.clone()),
        })
    }

    /// Make every subsequent call of `kind` fail with an access-denied error.
    pub fn fail_on(&self, kind: CallKind) {
        lock(&self.failing).insert(kind);
    }

    pub fn recover(&self, kind: CallKind) {
        lock(&self.failing).remove(&kind);
    }

    pub fn role(&self, name: &str) -> Option<RemoteRole> {
        lock(&self.roles).get(name).cloned()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.calls).clone()
    }

    /// Calls other than lookups.
    pub fn mutating_calls(&self) -> Vec<ProviderCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind() != CallKind::GetRole)
            .collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: ProviderCall) -> AwsResult<()> {
        let kind = call.kind();
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&kind) {
            return Err(AwsError::IamError(format!(
                "AccessDenied: injected failure for {kind:?}"
            )));
        }
        Ok(())
    }

    fn no_such_entity(name: &str) -> AwsError {
        AwsError::IamError(format!(
            "NoSuchEntity: The role with name {name} cannot be found."
        ))
    }
}

#[async_trait]
impl RoleProvider for RecordingProvider {
    async fn get_role(&self, name: &str) -> AwsResult<Option<RemoteRole>> {
        self.record(ProviderCall::GetRole {
            name: name.to_string(),
        })?;
        Ok(self.role(name))
    }

    async fn create_role(&self, config: &DesiredConfig) -> AwsResult<String> {
        self.record(ProviderCall::CreateRole {
            name: config.name.clone(),
            service: config.service.clone(),
            policy_arn: config.policy.arn.clone(),
        })?;

        let mut roles = lock(&self.roles);
        if roles.contains_key(&config.name) {
            return Err(AwsError::IamError(format!(
                "EntityAlreadyExists: Role with name {} already exists.",
                config.name
            )));
        }
        let arn = role_arn(&config.name);
        roles.insert(
            config.name.clone(),
            RemoteRole {
                name: config.name.clone(),
                arn: arn.clone(),
                service: Some(config.service.clone()),
                policy: Some(config.policy.clone()),
            },
        );
        Ok(arn)
    }

    async fn update_assume_role_policy(&self, config: &DesiredConfig) -> AwsResult<()> {
        self.record(ProviderCall::UpdateAssumeRolePolicy {
            name: config.name.clone(),
            service: config.service.clone(),
        })?;

        let mut roles = lock(&self.roles);
        let role = roles
            .get_mut(&config.name)
            .ok_or_else(|| Self::no_such_entity(&config.name))?;
        role.service = Some(config.service.clone());
        Ok(())
    }

    async fn add_role_policy(&self, config: &DesiredConfig) -> AwsResult<()> {
        self.record(ProviderCall::AddRolePolicy {
            name: config.name.clone(),
            policy_arn: config.policy.arn.clone(),
        })?;

        let mut roles = lock(&self.roles);
        let role = roles
            .get_mut(&config.name)
            .ok_or_else(|| Self::no_such_entity(&config.name))?;
        role.policy = Some(config.policy.clone());
        Ok(())
    }

    async fn remove_role_policy(&self, role_name: &str, policy: &ManagedPolicy) -> AwsResult<()> {
        self.record(ProviderCall::RemoveRolePolicy {
            name: role_name.to_string(),
            policy_arn: policy.arn.clone(),
        })?;

        let mut roles = lock(&self.roles);
        let role = roles
            .get_mut(role_name)
            .ok_or_else(|| Self::no_such_entity(role_name))?;
        if role.policy.as_ref().map(|p| &p.arn) == Some(&policy.arn) {
            role.policy = None;
        }
        Ok(())
    }

    async fn delete_role(&self, identity: &RoleIdentity, policy: &ManagedPolicy) -> AwsResult<()> {
        self.record(ProviderCall::DeleteRole {
            name: identity.name.clone(),
            arn: identity.arn.clone(),
            policy_arn: policy.arn.clone(),
        })?;

        // Missing roles are fine, matching the IAM adapter
        lock(&self.roles).remove(&identity.name);
        Ok(())
    }
}

/// State store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<PersistedState>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    pub fn current(&self) -> PersistedState {
        lock(&self.state).clone()
    }

    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> StateResult<PersistedState> {
        Ok(self.current())
    }

    async fn save(&self, state: &PersistedState) -> StateResult<()> {
        *lock(&self.state) = state.clone();
        *lock(&self.saves) += 1;
        Ok(())
    }
}
