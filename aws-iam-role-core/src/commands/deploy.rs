//! Deploy logic for the IAM role component

use log::{debug, info};

use crate::config::resolve;
use crate::drift::{DriftPlan, RoleAction};
use crate::error::{RoleComponentError, RoleComponentResult};
use crate::provider::RoleProvider;
use crate::state::{PersistedState, StateStore};
use crate::types::{DeployOutputs, DesiredConfig, RemoteRole, RoleInputs};

impl<P: RoleProvider, S: StateStore> super::service::RoleComponent<P, S> {
    /// Reconcile the role to match `inputs` merged over the defaults.
    ///
    /// Provider calls run strictly in order: lookup, create or in-place
    /// updates, then deletion of the previously deployed role if the name
    /// changed. State is saved only after every call succeeded.
    pub async fn deploy(&self, inputs: &RoleInputs) -> RoleComponentResult<DeployOutputs> {
        let previous_state = self.store.load().await?;
        let desired = resolve(&self.defaults, inputs)?;

        info!("Deploying role '{}'", desired.name);

        let remote = self
            .provider
            .get_role(&desired.name)
            .await
            .map_err(RoleComponentError::provider("GetRole", &desired.name))?;

        let plan = DriftPlan::detect(remote.as_ref(), &previous_state, &desired);
        debug!("Drift for role '{}': {:?}", desired.name, plan);

        let arn = match remote {
            None => {
                info!("Creating role '{}'", desired.name);
                self.provider
                    .create_role(&desired)
                    .await
                    .map_err(RoleComponentError::provider("CreateRole", &desired.name))?
            }
            Some(role) => {
                self.update_in_place(&role, &desired, plan.action).await?;
                role.arn
            }
        };

        if let Some(previous) = &plan.replace {
            info!(
                "Replacing role '{}' with '{}'",
                previous.name, desired.name
            );
            self.provider
                .delete_role(previous, &desired.policy)
                .await
                .map_err(|source| RoleComponentError::StaleNameOrphan {
                    name: desired.name.clone(),
                    arn: arn.clone(),
                    old_name: previous.name.clone(),
                    source,
                })?;
        }

        self.store
            .save(&PersistedState::deployed(&desired.name, &arn))
            .await?;

        Ok(DeployOutputs::new(desired, arn))
    }

    /// Trust policy first, then the managed policy swap (detach old, attach new).
    async fn update_in_place(
        &self,
        role: &RemoteRole,
        desired: &DesiredConfig,
        action: RoleAction,
    ) -> RoleComponentResult<()> {
        let RoleAction::Update {
            assume_role_policy,
            managed_policy,
        } = action
        else {
            debug!("Role '{}' is up to date", desired.name);
            return Ok(());
        };

        info!("Updating role '{}'", desired.name);

        if assume_role_policy {
            self.provider
                .update_assume_role_policy(desired)
                .await
                .map_err(RoleComponentError::provider(
                    "UpdateAssumeRolePolicy",
                    &desired.name,
                ))?;
        }

        if managed_policy {
            let detached = match &role.policy {
                Some(current) => {
                    self.provider
                        .remove_role_policy(&desired.name, current)
                        .await
                        .map_err(RoleComponentError::provider(
                            "RemoveRolePolicy",
                            &desired.name,
                        ))?;
                    Some(current)
                }
                None => {
                    debug!("Role '{}' has no managed policy to detach", desired.name);
                    None
                }
            };

            self.provider
                .add_role_policy(desired)
                .await
                .map_err(|source| match detached {
                    Some(current) => RoleComponentError::PartialPolicyState {
                        role: desired.name.clone(),
                        detached_arn: current.arn.clone(),
                        attach_arn: desired.policy.arn.clone(),
                        source,
                    },
                    None => RoleComponentError::provider("AddRolePolicy", &desired.name)(source),
                })?;
        }

        Ok(())
    }
}
