//! IAM Role Component Service Layer
//!
//! The component holds a role provider, a state store and the static defaults,
//! and exposes the two reconcile operations (`deploy`, `remove`) that the CLI
//! drives. Each operation reads the state once at entry and writes it once at
//! exit; concurrent invocations against the same state are not coordinated.

use crate::provider::RoleProvider;
use crate::state::StateStore;
use crate::types::DesiredConfig;

/// Main component struct: provider adapter, state store and defaults
pub struct RoleComponent<P, S> {
    pub(crate) provider: P,
    pub(crate) store: S,
    pub(crate) defaults: DesiredConfig,
}

impl<P: RoleProvider, S: StateStore> RoleComponent<P, S> {
    /// Create a component using the built-in defaults
    pub fn new(provider: P, store: S) -> Self {
        Self::with_defaults(provider, store, DesiredConfig::default())
    }

    pub fn with_defaults(provider: P, store: S, defaults: DesiredConfig) -> Self {
        Self {
            provider,
            store,
            defaults,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn defaults(&self) -> &DesiredConfig {
        &self.defaults
    }
}
