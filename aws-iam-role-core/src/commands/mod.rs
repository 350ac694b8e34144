//! Commands module - reconcile operations of the IAM role component

mod deploy;
mod remove;
pub(crate) mod service;

pub use service::RoleComponent;
