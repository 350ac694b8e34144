//! Persisted component state and the store it lives in

mod file;

pub use file::FileStateStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to {operation} state file '{path}': {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt state record: {0}")]
    Corrupt(String),
}

pub type StateResult<T> = Result<T, StateError>;

/// What this component last deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StateRecord", into = "StateRecord")]
pub enum PersistedState {
    #[default]
    Empty,
    Deployed { name: String, arn: String },
}

impl PersistedState {
    pub fn deployed(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self::Deployed {
            name: name.into(),
            arn: arn.into(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Deployed { name, .. } => Some(name),
        }
    }

    pub fn arn(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Deployed { arn, .. } => Some(arn),
        }
    }
}

/// Flat on-disk layout: `{}` or `{"name": .., "arn": ..}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    arn: Option<String>,
}

impl TryFrom<StateRecord> for PersistedState {
    type Error = StateError;

    fn try_from(record: StateRecord) -> StateResult<Self> {
        match (record.name, record.arn) {
            (None, None) => Ok(Self::Empty),
            (Some(name), Some(arn)) => Ok(Self::Deployed { name, arn }),
            (Some(name), None) => Err(StateError::Corrupt(format!(
                "role '{name}' is recorded without an ARN"
            ))),
            (None, Some(arn)) => Err(StateError::Corrupt(format!(
                "ARN '{arn}' is recorded without a role name"
            ))),
        }
    }
}

impl From<PersistedState> for StateRecord {
    fn from(state: PersistedState) -> Self {
        match state {
            PersistedState::Empty => Self::default(),
            PersistedState::Deployed { name, arn } => Self {
                name: Some(name),
                arn: Some(arn),
            },
        }
    }
}

/// Durable record of the last-applied state. Read once at the start of a
/// reconcile and written once at the end; no locking is done between the two.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> StateResult<PersistedState>;

    /// Replace the stored state wholesale.
    async fn save(&self, state: &PersistedState) -> StateResult<()>;
}
