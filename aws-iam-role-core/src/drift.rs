//! Drift detection: decides what a deploy has to change, without touching the provider

use crate::state::PersistedState;
use crate::types::{DesiredConfig, RemoteRole, RoleIdentity};

/// Action required to bring the role under the desired name in line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Create,
    NoOp,
    /// Both flags may be set in the same reconcile
    Update {
        assume_role_policy: bool,
        managed_policy: bool,
    },
}

/// Classify the role found under the desired name against the desired configuration.
///
/// Service is compared by exact string equality and policy structurally. A
/// remote role without a trust principal or without an attached policy
/// counts as differing.
pub fn classify(previous: Option<&RemoteRole>, desired: &DesiredConfig) -> RoleAction {
    let Some(previous) = previous else {
        return RoleAction::Create;
    };

    let assume_role_policy = previous.service.as_deref() != Some(desired.service.as_str());
    let managed_policy = previous.policy.as_ref() != Some(&desired.policy);

    if assume_role_policy || managed_policy {
        RoleAction::Update {
            assume_role_policy,
            managed_policy,
        }
    } else {
        RoleAction::NoOp
    }
}

/// The role this component deployed last, if it lived under a different name.
pub fn detect_replace(state: &PersistedState, desired: &DesiredConfig) -> Option<RoleIdentity> {
    match state {
        PersistedState::Deployed { name, arn } if !name.is_empty() && *name != desired.name => {
            Some(RoleIdentity::new(name.clone(), Some(arn.clone())))
        }
        _ => None,
    }
}

/// Everything a deploy needs to do, computed once before any mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftPlan {
    pub action: RoleAction,
    /// Previously deployed role to delete after the desired role is in place
    pub replace: Option<RoleIdentity>,
}

impl DriftPlan {
    pub fn detect(
        previous: Option<&RemoteRole>,
        state: &PersistedState,
        desired: &DesiredConfig,
    ) -> Self {
        Self {
            action: classify(previous, desired),
            replace: detect_replace(state, desired),
        }
    }

    pub fn create_needed(&self) -> bool {
        matches!(self.action, RoleAction::Create)
    }

    pub fn assume_policy_update_needed(&self) -> bool {
        matches!(
            self.action,
            RoleAction::Update {
                assume_role_policy: true,
                ..
            }
        )
    }

    pub fn managed_policy_update_needed(&self) -> bool {
        matches!(
            self.action,
            RoleAction::Update {
                managed_policy: true,
                ..
            }
        )
    }

    pub fn replace_needed(&self) -> bool {
        self.replace.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ManagedPolicy;

    fn remote(service: &str, policy_arn: &str) -> RemoteRole {
        RemoteRole {
            name: "serverless".into(),
            arn: "arn:aws:iam::123456789012:role/serverless".into(),
            service: Some(service.into()),
            policy: Some(ManagedPolicy::new(policy_arn)),
        }
    }

    fn desired() -> DesiredConfig {
        DesiredConfig::default()
    }

    #[test]
    fn test_absent_role_needs_create() {
        assert_eq!(classify(None, &desired()), RoleAction::Create);
    }

    #[test]
    fn test_matching_role_is_noop() {
        let d = desired();
        let role = remote(&d.service, &d.policy.arn);
        assert_eq!(classify(Some(&role), &d), RoleAction::NoOp);
    }

    #[test]
    fn test_service_change_only() {
        let d = desired();
        let role = remote("edgelambda.amazonaws.com", &d.policy.arn);
        assert_eq!(
            classify(Some(&role), &d),
            RoleAction::Update {
                assume_role_policy: true,
                managed_policy: false
            }
        );
    }

    #[test]
    fn test_policy_change_only() {
        let d = desired();
        let role = remote(&d.service, "arn:aws:iam::aws:policy/ReadOnlyAccess");
        assert_eq!(
            classify(Some(&role), &d),
            RoleAction::Update {
                assume_role_policy: false,
                managed_policy: true
            }
        );
    }

    #[test]
    fn test_missing_remote_fields_count_as_drift() {
        let d = desired();
        let role = RemoteRole {
            service: None,
            policy: None,
            ..remote(&d.service, &d.policy.arn)
        };
        assert_eq!(
            classify(Some(&role), &d),
            RoleAction::Update {
                assume_role_policy: true,
                managed_policy: true
            }
        );
    }

    #[test]
    fn test_extra_policy_key_counts_as_drift() {
        let mut d = desired();
        d.policy
            .extra
            .insert("version".into(), serde_json::Value::from("v2"));
        let role = remote(&d.service, &d.policy.arn);
        let plan = DriftPlan::detect(Some(&role), &PersistedState::Empty, &d);
        assert!(plan.managed_policy_update_needed());
        assert!(!plan.assume_policy_update_needed());
    }

    #[test]
    fn test_replace_only_on_name_change() {
        let d = desired();
        assert_eq!(detect_replace(&PersistedState::Empty, &d), None);
        assert_eq!(
            detect_replace(&PersistedState::deployed("serverless", "arn:old"), &d),
            None
        );
        assert_eq!(
            detect_replace(&PersistedState::deployed("svc-old", "arn:old"), &d),
            Some(RoleIdentity::new("svc-old", Some("arn:old".into())))
        );
    }

    #[test]
    fn test_rename_plans_create_and_replace() {
        let d = desired();
        let plan = DriftPlan::detect(None, &PersistedState::deployed("svc-old", "arn:old"), &d);
        assert!(plan.create_needed());
        assert!(plan.replace_needed());
        assert!(!plan.assume_policy_update_needed());
        assert!(!plan.managed_policy_update_needed());
    }
}
