//! Remove logic for the IAM role component

use log::info;

use crate::config::resolve;
use crate::error::{RoleComponentError, RoleComponentResult};
use crate::provider::RoleProvider;
use crate::state::{PersistedState, StateStore};
use crate::types::{RemoveOutputs, RoleIdentity, RoleInputs};

impl<P: RoleProvider, S: StateStore> super::service::RoleComponent<P, S> {
    /// Delete the role and clear the persisted state.
    ///
    /// The role name is the explicit input if given, else the last deployed
    /// name, else the default. Deleting a role that does not exist succeeds.
    pub async fn remove(&self, inputs: &RoleInputs) -> RoleComponentResult<RemoveOutputs> {
        let state = self.store.load().await?;
        let config = resolve(&self.defaults, inputs)?;

        let name = inputs
            .explicit_name()
            .or_else(|| state.name().filter(|name| !name.is_empty()))
            .unwrap_or(self.defaults.name.as_str())
            .to_string();

        let arn = state
            .arn()
            .filter(|_| state.name() == Some(name.as_str()))
            .map(str::to_string);
        let identity = RoleIdentity::new(name, arn);

        info!("Removing role '{}'", identity.name);

        self.provider
            .delete_role(&identity, &config.policy)
            .await
            .map_err(RoleComponentError::provider("DeleteRole", &identity.name))?;

        self.store.save(&PersistedState::Empty).await?;

        Ok(RemoveOutputs {
            name: identity.name,
        })
    }
}
