//! AWS IAM client adapter implementing [`RoleProvider`]
//!
// IAM is eventually consistent: a role or attachment that was just created can
// take several seconds before STS honors it, hence the propagation wait after
// create and attach.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;
use log::debug;

use crate::aws::trust_policy::{build_trust_policy, service_principal};
use crate::aws::{AwsError, AwsResult};
use crate::provider::RoleProvider;
use crate::types::{DesiredConfig, ManagedPolicy, RemoteRole, RoleIdentity};

pub const DEFAULT_PROPAGATION_DELAY: Duration = Duration::from_secs(15);

pub struct AwsIamClient {
    client: IamClient,
    propagation_delay: Duration,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self {
            client,
            propagation_delay: DEFAULT_PROPAGATION_DELAY,
        }
    }

    /// Create a client for `region` using the default credential provider chain.
    pub async fn for_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self::new(IamClient::new(&config))
    }

    /// Zero disables the wait.
    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    pub fn propagation_delay(&self) -> Duration {
        self.propagation_delay
    }

    async fn wait_for_propagation(&self) {
        if self.propagation_delay.is_zero() {
            return;
        }
        debug!(
            "Waiting {:?} for IAM changes to propagate",
            self.propagation_delay
        );
        tokio::time::sleep(self.propagation_delay).await;
    }

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> AwsResult<()> {
        debug!("Attaching policy '{policy_arn}' to role '{role_name}'");
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to attach policy '{policy_arn}' to role '{role_name}': {e}"
                ))
            })?;
        Ok(())
    }

    /// First attached managed policy of a role.
    ///
    /// Only the first page of attachments is read; a role with several
    /// attached policies reports the first one IAM lists.
    async fn attached_policy(&self, role_name: &str) -> AwsResult<Option<ManagedPolicy>> {
        let response = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to list attached policies of role '{role_name}': {e}"
                ))
            })?;

        Ok(response
            .attached_policies()
            .iter()
            .find_map(|policy| policy.policy_arn())
            .map(ManagedPolicy::new))
    }
}

#[async_trait]
impl RoleProvider for AwsIamClient {
    async fn get_role(&self, name: &str) -> AwsResult<Option<RemoteRole>> {
        let response = match self.client.get_role().role_name(name).send().await {
            Ok(response) => response,
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                debug!("Role '{name}' does not exist");
                return Ok(None);
            }
            Err(e) => {
                return Err(AwsError::IamError(format!(
                    "Failed to get role '{name}': {e}"
                )))
            }
        };

        let role = response.role().ok_or_else(|| {
            AwsError::SdkError(format!("GetRole response for '{name}' is missing the role"))
        })?;

        let service = match role.assume_role_policy_document() {
            Some(document) => service_principal(document)?,
            None => None,
        };
        let policy = self.attached_policy(name).await?;

        Ok(Some(RemoteRole {
            name: role.role_name().to_string(),
            arn: role.arn().to_string(),
            service,
            policy,
        }))
    }

    async fn create_role(&self, config: &DesiredConfig) -> AwsResult<String> {
        let trust_policy = build_trust_policy(&config.service)?;

        let response = self
            .client
            .create_role()
            .role_name(&config.name)
            .path("/")
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!("Failed to create role '{}': {e}", config.name))
            })?;

        let arn = response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| {
                AwsError::SdkError(format!(
                    "CreateRole response for '{}' is missing the role",
                    config.name
                ))
            })?;

        self.attach_policy(&config.name, &config.policy.arn).await?;
        self.wait_for_propagation().await;
        Ok(arn)
    }

    async fn update_assume_role_policy(&self, config: &DesiredConfig) -> AwsResult<()> {
        let trust_policy = build_trust_policy(&config.service)?;

        self.client
            .update_assume_role_policy()
            .role_name(&config.name)
            .policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to update trust policy of role '{}': {e}",
                    config.name
                ))
            })?;
        Ok(())
    }

    async fn add_role_policy(&self, config: &DesiredConfig) -> AwsResult<()> {
        self.attach_policy(&config.name, &config.policy.arn).await?;
        self.wait_for_propagation().await;
        Ok(())
    }

    async fn remove_role_policy(&self, role_name: &str, policy: &ManagedPolicy) -> AwsResult<()> {
        debug!("Detaching policy '{}' from role '{role_name}'", policy.arn);
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(&policy.arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to detach policy '{}' from role '{role_name}': {e}",
                    policy.arn
                ))
            })?;
        Ok(())
    }

    async fn delete_role(&self, identity: &RoleIdentity, policy: &ManagedPolicy) -> AwsResult<()> {
        let name = &identity.name;

        match self
            .client
            .detach_role_policy()
            .role_name(name)
            .policy_arn(&policy.arn)
            .send()
            .await
        {
            Ok(_) => {}
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                debug!("Policy '{}' was not attached to role '{name}'", policy.arn);
            }
            Err(e) => {
                return Err(AwsError::IamError(format!(
                    "Failed to detach policy '{}' from role '{name}': {e}",
                    policy.arn
                )))
            }
        }

        match self.client.delete_role().role_name(name).send().await {
            Ok(_) => {}
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                debug!("Role '{name}' was already deleted");
            }
            Err(e) => {
                return Err(AwsError::IamError(format!(
                    "Failed to delete role '{name}': {e}"
                )))
            }
        }
        Ok(())
    }
}
