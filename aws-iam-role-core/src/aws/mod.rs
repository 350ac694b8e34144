//! AWS SDK integration: IAM client adapter and trust policy documents.

pub mod iam_client;
pub(crate) mod trust_policy;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("IAM client error: {0}")]
    IamError(String),
    #[error("Policy document error: {0}")]
    PolicyError(String),
    #[error("AWS SDK error: {0}")]
    SdkError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
