//! Credentials parsers.
//!
//! [`ContainerServiceCredentialsParser`] turns a container-service account
//! definition into credentials:
//!
//! 1. resolve the referenced compute account in the composite registry
//! 2. derive a compute account spec renamed to the container-service account
//! 3. hand it to the injected [`ComputeCredentialsParser`] (role assumption)
//! 4. wrap the assume-role result with the owning compute account name
//! 5. register the credentials and the pairing
//!
//! Nothing is registered unless steps 1–4 succeed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use stratus_core::{ComputeAccount, ContainerServiceAccount, ProviderId};

use crate::credentials::{
    AssumeRoleCredentials, ComputeCredentials, ContainerServiceCredentials, Credentials,
    DirectCredentials, StaticCredentials,
};
use crate::error::{CredentialsError, CredentialsResult, ParseError};
use crate::mapper::AccountMapper;
use crate::repository::CompositeCredentialsRepository;

/// Session name used when an account does not set one.
pub const DEFAULT_SESSION_NAME: &str = "stratus";

/// Turns a compute account spec into compute credentials. Injected so the
/// role-assumption backend can be swapped out.
pub trait ComputeCredentialsParser: Send + Sync {
    fn parse(&self, account: &ComputeAccount) -> Result<ComputeCredentials, ParseError>;
}

impl<F> ComputeCredentialsParser for F
where
    F: Fn(&ComputeAccount) -> Result<ComputeCredentials, ParseError> + Send + Sync,
{
    fn parse(&self, account: &ComputeAccount) -> Result<ComputeCredentials, ParseError> {
        self(account)
    }
}

/// Builds credentials straight from the account: assume-role when a role is
/// configured, direct otherwise.
#[derive(Debug, Clone, Default)]
pub struct DefaultComputeCredentialsParser;

impl ComputeCredentialsParser for DefaultComputeCredentialsParser {
    fn parse(&self, account: &ComputeAccount) -> Result<ComputeCredentials, ParseError> {
        if account.account_id.is_empty() {
            return Err(ParseError::MissingField {
                account: account.name.clone(),
                field: "account_id",
            });
        }

        let material = match (&account.access_key_id, &account.secret_access_key) {
            (Some(key), Some(secret)) => Some(StaticCredentials::new(key, secret)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ParseError::MissingField {
                    account: account.name.clone(),
                    field: "secret_access_key",
                });
            }
            (None, Some(_)) => {
                return Err(ParseError::MissingField {
                    account: account.name.clone(),
                    field: "access_key_id",
                });
            }
        };

        let base = DirectCredentials {
            name: account.name.clone(),
            account_id: account.account_id.clone(),
            regions: account.regions.clone(),
            material,
            environment: account.environment.clone(),
            account_type: account.account_type.clone(),
        };

        match &account.assume_role {
            Some(role) => Ok(ComputeCredentials::AssumeRole(AssumeRoleCredentials {
                base,
                assume_role: role.clone(),
                session_name: account
                    .session_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
                source_account_id: account.account_id.clone(),
            })),
            None if account.provider == ProviderId::ContainerService => {
                Err(ParseError::MissingAssumeRole(account.name.clone()))
            }
            None => Ok(ComputeCredentials::Direct(base)),
        }
    }
}

/// Re-parents a compute account's identity onto a container-service account.
pub struct ContainerServiceAccountBuilder;

impl ContainerServiceAccountBuilder {
    /// Copy role, region and key data from `compute`, then apply the
    /// definition's overrides. The result is named after the container-service
    /// account and tagged with [`ProviderId::ContainerService`].
    pub fn build(compute: &ComputeCredentials, account: &ContainerServiceAccount) -> ComputeAccount {
        let assumed = compute.as_assume_role();
        let material = compute.material();

        ComputeAccount {
            name: account.name.clone(),
            account_id: compute.account_id().to_string(),
            regions: account
                .regions
                .clone()
                .unwrap_or_else(|| compute.regions().to_vec()),
            assume_role: account
                .assume_role
                .clone()
                .or_else(|| assumed.map(|a| a.assume_role.clone())),
            session_name: account
                .session_name
                .clone()
                .or_else(|| assumed.map(|a| a.session_name.clone())),
            access_key_id: material.map(|m| m.access_key_id.clone()),
            secret_access_key: material.map(|m| m.secret_access_key.clone()),
            environment: account
                .environment
                .clone()
                .or_else(|| compute.environment().map(str::to_string)),
            account_type: account
                .account_type
                .clone()
                .or_else(|| compute.account_type().map(str::to_string)),
            provider: ProviderId::ContainerService,
        }
    }
}

/// Parses container-service account definitions and registers the results.
pub struct ContainerServiceCredentialsParser {
    composite: CompositeCredentialsRepository,
    mapper: Arc<AccountMapper>,
    compute_parser: Arc<dyn ComputeCredentialsParser>,
}

impl ContainerServiceCredentialsParser {
    pub fn new(
        composite: CompositeCredentialsRepository,
        mapper: Arc<AccountMapper>,
        compute_parser: Arc<dyn ComputeCredentialsParser>,
    ) -> Self {
        Self {
            composite,
            mapper,
            compute_parser,
        }
    }

    pub fn parse(
        &self,
        account: &ContainerServiceAccount,
    ) -> CredentialsResult<ContainerServiceCredentials> {
        let compute = self
            .composite
            .compute_credentials(&account.aws_account)
            .ok_or_else(|| {
                warn!(
                    account = %account.name,
                    compute_account = %account.aws_account,
                    "referenced compute account is not registered"
                );
                CredentialsError::ReferencedComputeAccountMissing {
                    account: account.name.clone(),
                    compute_account: account.aws_account.clone(),
                }
            })?;

        let spec = ContainerServiceAccountBuilder::build(&compute, account);
        debug!(account = %account.name, compute_account = %account.aws_account, "derived account spec");

        let parsed = self.compute_parser.parse(&spec).map_err(|source| {
            CredentialsError::ComputeParseFailed {
                account: account.name.clone(),
                source,
            }
        })?;

        let credentials = ContainerServiceCredentials::from_compute(parsed, &account.aws_account)
            .map_err(|_| CredentialsError::ComputeParseFailed {
                account: account.name.clone(),
                source: ParseError::NotAssumeRole(account.name.clone()),
            })?;

        self.mapper.register(credentials.clone());

        info!(
            account = %account.name,
            compute_account = %account.aws_account,
            role = %credentials.assume_role().role_arn(),
            "container-service account registered"
        );
        Ok(credentials)
    }
}
