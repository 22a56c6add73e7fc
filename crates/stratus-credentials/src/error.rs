//! Credentials error types.

use thiserror::Error;

/// Errors raised while turning account definitions into credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("account {account} references compute account {compute_account}, which is not registered")]
    ReferencedComputeAccountMissing {
        account: String,
        compute_account: String,
    },

    #[error("failed to parse compute credentials for account {account}: {source}")]
    ComputeParseFailed {
        account: String,
        #[source]
        source: ParseError,
    },

    #[error("credentials for account {0} are not assume-role credentials")]
    NotAssumeRole(String),
}

/// Rejections from a compute credentials parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("account {0} has no role to assume")]
    MissingAssumeRole(String),

    #[error("account {account} is missing required field {field}")]
    MissingField { account: String, field: &'static str },

    #[error("account {0} did not produce assume-role credentials")]
    NotAssumeRole(String),

    #[error("{0}")]
    Rejected(String),
}

pub type CredentialsResult<T> = Result<T, CredentialsError>;
