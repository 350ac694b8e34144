use aws_iam_role_core::fakes::{role_arn, CallKind, MemoryStateStore, ProviderCall, RecordingProvider};
use aws_iam_role_core::{
    DesiredConfig, ManagedPolicy, PersistedState, RemoteRole, RoleComponent, RoleComponentError,
    RoleInputs, DEFAULT_POLICY_ARN,
};

const READ_ONLY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";

fn config_named(name: &str) -> DesiredConfig {
    DesiredConfig {
        name: name.to_string(),
        ..DesiredConfig::default()
    }
}

#[tokio::test]
async fn test_first_deploy_creates_role_with_default_policy() {
    let component = RoleComponent::new(RecordingProvider::new(), MemoryStateStore::new());

    let outputs = component
        .deploy(&RoleInputs::named("svc-a"))
        .await
        .expect("deploy should succeed");

    assert_eq!(
        component.provider().mutating_calls(),
        vec![ProviderCall::CreateRole {
            name: "svc-a".into(),
            service: "lambda.amazonaws.com".into(),
            policy_arn: DEFAULT_POLICY_ARN.into(),
        }]
    );
    assert_eq!(outputs.arn, role_arn("svc-a"));
    assert_eq!(outputs.policy, ManagedPolicy::new(DEFAULT_POLICY_ARN));
    assert_eq!(
        component.store().current(),
        PersistedState::deployed("svc-a", role_arn("svc-a"))
    );
    assert_eq!(component.store().save_count(), 1);
}

#[tokio::test]
async fn test_second_identical_deploy_is_noop() {
    let component = RoleComponent::new(RecordingProvider::new(), MemoryStateStore::new());
    let inputs = RoleInputs::named("svc-a").with_policy_arn(READ_ONLY);

    let first = component.deploy(&inputs).await.unwrap();
    component.provider().clear_calls();
    let second = component.deploy(&inputs).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        component.provider().calls(),
        vec![ProviderCall::GetRole {
            name: "svc-a".into()
        }]
    );
    assert_eq!(component.store().save_count(), 2);
}

#[tokio::test]
async fn test_policy_change_detaches_old_then_attaches_new() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    let store = MemoryStateStore::with_state(PersistedState::deployed("svc-a", role_arn("svc-a")));
    let component = RoleComponent::new(provider, store);

    let outputs = component
        .deploy(&RoleInputs::named("svc-a").with_policy_arn(READ_ONLY))
        .await
        .unwrap();

    assert_eq!(
        component.provider().mutating_calls(),
        vec![
            ProviderCall::RemoveRolePolicy {
                name: "svc-a".into(),
                policy_arn: DEFAULT_POLICY_ARN.into(),
            },
            ProviderCall::AddRolePolicy {
                name: "svc-a".into(),
                policy_arn: READ_ONLY.into(),
            },
        ]
    );
    assert_eq!(component.provider().count(CallKind::UpdateAssumeRolePolicy), 0);
    assert_eq!(outputs.policy.arn, READ_ONLY);
    assert_eq!(
        component.provider().role("svc-a").unwrap().policy,
        Some(ManagedPolicy::new(READ_ONLY))
    );
}

#[tokio::test]
async fn test_service_change_updates_trust_policy_only() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    let component = RoleComponent::new(provider, MemoryStateStore::new());

    component
        .deploy(&RoleInputs::named("svc-a").with_service("edgelambda.amazonaws.com"))
        .await
        .unwrap();

    assert_eq!(
        component.provider().mutating_calls(),
        vec![ProviderCall::UpdateAssumeRolePolicy {
            name: "svc-a".into(),
            service: "edgelambda.amazonaws.com".into(),
        }]
    );
}

#[tokio::test]
async fn test_both_changes_update_trust_policy_before_policy_swap() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    let component = RoleComponent::new(provider, MemoryStateStore::new());

    component
        .deploy(
            &RoleInputs::named("svc-a")
                .with_service("ecs-tasks.amazonaws.com")
                .with_policy_arn(READ_ONLY),
        )
        .await
        .unwrap();

    let kinds: Vec<CallKind> = component
        .provider()
        .mutating_calls()
        .iter()
        .map(ProviderCall::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CallKind::UpdateAssumeRolePolicy,
            CallKind::RemoveRolePolicy,
            CallKind::AddRolePolicy
        ]
    );
}

#[tokio::test]
async fn test_rename_creates_new_role_then_deletes_old() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    let store = MemoryStateStore::with_state(PersistedState::deployed("svc-a", role_arn("svc-a")));
    let component = RoleComponent::new(provider, store);

    let outputs = component.deploy(&RoleInputs::named("svc-b")).await.unwrap();

    assert_eq!(
        component.provider().mutating_calls(),
        vec![
            ProviderCall::CreateRole {
                name: "svc-b".into(),
                service: "lambda.amazonaws.com".into(),
                policy_arn: DEFAULT_POLICY_ARN.into(),
            },
            ProviderCall::DeleteRole {
                name: "svc-a".into(),
                arn: Some(role_arn("svc-a")),
                policy_arn: DEFAULT_POLICY_ARN.into(),
            },
        ]
    );
    assert!(component.provider().role("svc-a").is_none());
    assert_eq!(outputs.name, "svc-b");
    assert_eq!(
        component.store().current(),
        PersistedState::deployed("svc-b", role_arn("svc-b"))
    );
}

#[tokio::test]
async fn test_rename_onto_existing_role_updates_and_deletes_old() {
    let provider = RecordingProvider::new()
        .with_role_from(&config_named("svc-a"))
        .with_role(RemoteRole {
            name: "svc-b".into(),
            arn: role_arn("svc-b"),
            service: Some("lambda.amazonaws.com".into()),
            policy: Some(ManagedPolicy::new(READ_ONLY)),
        });
    let store = MemoryStateStore::with_state(PersistedState::deployed("svc-a", role_arn("svc-a")));
    let component = RoleComponent::new(provider, store);

    component.deploy(&RoleInputs::named("svc-b")).await.unwrap();

    let kinds: Vec<CallKind> = component
        .provider()
        .mutating_calls()
        .iter()
        .map(ProviderCall::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CallKind::RemoveRolePolicy,
            CallKind::AddRolePolicy,
            CallKind::DeleteRole
        ]
    );
}

#[tokio::test]
async fn test_failed_attach_after_detach_is_partial_policy_state() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    provider.fail_on(CallKind::AddRolePolicy);
    let previous = PersistedState::deployed("svc-a", role_arn("svc-a"));
    let component = RoleComponent::new(provider, MemoryStateStore::with_state(previous.clone()));
    let inputs = RoleInputs::named("svc-a").with_policy_arn(READ_ONLY);

    let err = component.deploy(&inputs).await.unwrap_err();

    match &err {
        RoleComponentError::PartialPolicyState {
            role,
            detached_arn,
            attach_arn,
            ..
        } => {
            assert_eq!(role, "svc-a");
            assert_eq!(detached_arn, DEFAULT_POLICY_ARN);
            assert_eq!(attach_arn, READ_ONLY);
        }
        other => panic!("Expected PartialPolicyState, got {other:?}"),
    }
    assert_eq!(component.provider().role("svc-a").unwrap().policy, None);
    assert_eq!(component.store().current(), previous);
    assert_eq!(component.store().save_count(), 0);

    // The next deploy sees the missing policy and attaches it
    component.provider().recover(CallKind::AddRolePolicy);
    component.provider().clear_calls();
    component.deploy(&inputs).await.unwrap();
    assert_eq!(
        component.provider().mutating_calls(),
        vec![ProviderCall::AddRolePolicy {
            name: "svc-a".into(),
            policy_arn: READ_ONLY.into(),
        }]
    );
}

#[tokio::test]
async fn test_failed_old_role_cleanup_is_stale_name_orphan() {
    let provider = RecordingProvider::new().with_role_from(&config_named("svc-a"));
    provider.fail_on(CallKind::DeleteRole);
    let previous = PersistedState::deployed("svc-a", role_arn("svc-a"));
    let component = RoleComponent::new(provider, MemoryStateStore::with_state(previous.clone()));

    let err = component.deploy(&RoleInputs::named("svc-b")).await.unwrap_err();

    assert!(matches!(err, RoleComponentError::StaleNameOrphan { .. }));
    assert!(err.to_string().contains("New role 'svc-b'"), "{err}");
    assert!(component.provider().role("svc-b").is_some());
    assert!(component.provider().role("svc-a").is_some());
    assert_eq!(component.store().current(), previous);
}

#[tokio::test]
async fn test_rejected_create_aborts_without_saving() {
    let provider = RecordingProvider::new();
    provider.fail_on(CallKind::CreateRole);
    let component = RoleComponent::new(provider, MemoryStateStore::new());

    let err = component.deploy(&RoleInputs::named("svc-a")).await.unwrap_err();

    match err {
        RoleComponentError::Provider {
            operation, role, ..
        } => {
            assert_eq!(operation, "CreateRole");
            assert_eq!(role, "svc-a");
        }
        other => panic!("Expected Provider error, got {other:?}"),
    }
    assert_eq!(component.store().save_count(), 0);
}

#[tokio::test]
async fn test_rejected_lookup_aborts_before_mutating() {
    let provider = RecordingProvider::new();
    provider.fail_on(CallKind::GetRole);
    let component = RoleComponent::new(provider, MemoryStateStore::new());

    assert!(component.deploy(&RoleInputs::default()).await.is_err());
    assert!(component.provider().mutating_calls().is_empty());
}

#[tokio::test]
async fn test_custom_defaults_are_used() {
    let defaults = DesiredConfig {
        name: "base".into(),
        service: "states.amazonaws.com".into(),
        policy: ManagedPolicy::new(READ_ONLY),
        region: "eu-central-1".into(),
    };
    let component =
        RoleComponent::with_defaults(RecordingProvider::new(), MemoryStateStore::new(), defaults);

    let outputs = component.deploy(&RoleInputs::default()).await.unwrap();

    assert_eq!(outputs.name, "base");
    assert_eq!(outputs.service, "states.amazonaws.com");
    assert_eq!(outputs.policy.arn, READ_ONLY);
}
