//! Credentials kinds for compute and container-service accounts.
//!
//! Compute accounts either carry credentials directly or assume a role in the
//! target account. Container-service accounts always wrap assume-role compute
//! credentials plus the name of the compute account they were derived from;
//! the constructor only accepts the assume-role variant, so a
//! [`ContainerServiceCredentials`] value can never hold direct credentials.

use std::fmt;
use std::sync::Arc;

use stratus_core::ProviderId;

use crate::error::{CredentialsError, CredentialsResult};

/// Static credential material (access key pair, optional session token).
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: None,
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How a client should obtain usable credentials for an account.
///
/// This is a description only; resolving an `AssumeRole` source means calling
/// the role-assumption endpoint, which is the SDK client's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Use the ambient provider chain (environment, instance profile, ...).
    DefaultChain,
    Static(StaticCredentials),
    AssumeRole {
        role_arn: String,
        session_name: String,
        source: Box<CredentialsSource>,
    },
}

/// Capabilities shared by every credentials kind.
pub trait Credentials {
    fn name(&self) -> &str;
    fn account_id(&self) -> &str;
    fn regions(&self) -> &[String];
    fn provider(&self) -> ProviderId;
    fn materialize(&self) -> CredentialsSource;
}

/// Compute credentials used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectCredentials {
    pub name: String,
    pub account_id: String,
    pub regions: Vec<String>,
    /// `None` defers to the default provider chain.
    pub material: Option<StaticCredentials>,
    pub environment: Option<String>,
    pub account_type: Option<String>,
}

impl DirectCredentials {
    fn source(&self) -> CredentialsSource {
        match &self.material {
            Some(material) => CredentialsSource::Static(material.clone()),
            None => CredentialsSource::DefaultChain,
        }
    }
}

/// Compute credentials that assume a role before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleCredentials {
    pub base: DirectCredentials,
    /// A full role ARN or `role/<name>` relative to `base.account_id`.
    pub assume_role: String,
    pub session_name: String,
    /// Account id of the compute account the role is assumed from.
    pub source_account_id: String,
}

impl AssumeRoleCredentials {
    /// The fully-qualified role ARN.
    pub fn role_arn(&self) -> String {
        if self.assume_role.starts_with("arn:") {
            self.assume_role.clone()
        } else {
            format!("arn:aws:iam::{}:{}", self.base.account_id, self.assume_role)
        }
    }

    fn source(&self) -> CredentialsSource {
        CredentialsSource::AssumeRole {
            role_arn: self.role_arn(),
            session_name: self.session_name.clone(),
            source: Box::new(self.base.source()),
        }
    }
}

/// Credentials registered under [`ProviderId::Compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCredentials {
    Direct(DirectCredentials),
    AssumeRole(AssumeRoleCredentials),
}

impl ComputeCredentials {
    fn base(&self) -> &DirectCredentials {
        match self {
            ComputeCredentials::Direct(direct) => direct,
            ComputeCredentials::AssumeRole(assumed) => &assumed.base,
        }
    }

    pub fn as_assume_role(&self) -> Option<&AssumeRoleCredentials> {
        match self {
            ComputeCredentials::AssumeRole(assumed) => Some(assumed),
            ComputeCredentials::Direct(_) => None,
        }
    }

    pub fn material(&self) -> Option<&StaticCredentials> {
        self.base().material.as_ref()
    }

    pub fn environment(&self) -> Option<&str> {
        self.base().environment.as_deref()
    }

    pub fn account_type(&self) -> Option<&str> {
        self.base().account_type.as_deref()
    }
}

impl Credentials for ComputeCredentials {
    fn name(&self) -> &str {
        &self.base().name
    }

    fn account_id(&self) -> &str {
        &self.base().account_id
    }

    fn regions(&self) -> &[String] {
        &self.base().regions
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Compute
    }

    fn materialize(&self) -> CredentialsSource {
        match self {
            ComputeCredentials::Direct(direct) => direct.source(),
            ComputeCredentials::AssumeRole(assumed) => assumed.source(),
        }
    }
}

/// Credentials registered under [`ProviderId::ContainerService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerServiceCredentials {
    inner: AssumeRoleCredentials,
    compute_account: String,
}

impl ContainerServiceCredentials {
    pub fn new(inner: AssumeRoleCredentials, compute_account: &str) -> Self {
        Self {
            inner,
            compute_account: compute_account.to_string(),
        }
    }

    /// Wrap compute credentials, rejecting anything but the assume-role variant.
    pub fn from_compute(
        credentials: ComputeCredentials,
        compute_account: &str,
    ) -> CredentialsResult<Self> {
        match credentials {
            ComputeCredentials::AssumeRole(assumed) => Ok(Self::new(assumed, compute_account)),
            ComputeCredentials::Direct(direct) => Err(CredentialsError::NotAssumeRole(direct.name)),
        }
    }

    pub fn assume_role(&self) -> &AssumeRoleCredentials {
        &self.inner
    }

    /// The wrapped credentials as a compute credentials value.
    pub fn to_compute_credentials(&self) -> ComputeCredentials {
        ComputeCredentials::AssumeRole(self.inner.clone())
    }

    /// Name of the compute account this account was derived from.
    pub fn compute_account(&self) -> &str {
        &self.compute_account
    }
}

impl Credentials for ContainerServiceCredentials {
    fn name(&self) -> &str {
        &self.inner.base.name
    }

    fn account_id(&self) -> &str {
        &self.inner.base.account_id
    }

    fn regions(&self) -> &[String] {
        &self.inner.base.regions
    }

    fn provider(&self) -> ProviderId {
        ProviderId::ContainerService
    }

    fn materialize(&self) -> CredentialsSource {
        self.inner.source()
    }
}

/// Any credentials held by the composite registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCredentials {
    Compute(Arc<ComputeCredentials>),
    ContainerService(Arc<ContainerServiceCredentials>),
}

impl AccountCredentials {
    pub fn name(&self) -> &str {
        match self {
            AccountCredentials::Compute(c) => c.name(),
            AccountCredentials::ContainerService(c) => c.name(),
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            AccountCredentials::Compute(_) => ProviderId::Compute,
            AccountCredentials::ContainerService(_) => ProviderId::ContainerService,
        }
    }
}
