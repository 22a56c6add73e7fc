//! Shared types used across Stratus crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider a set of credentials belongs to.
///
/// The string forms are stable: they key the composite credentials registry
/// and prefix every composite cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// The underlying cloud compute provider.
    Compute,
    /// The container-scheduling service layered on a compute account.
    ContainerService,
}

impl ProviderId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Compute => "compute",
            ProviderId::ContainerService => "container-service",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider id: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compute" => Ok(ProviderId::Compute),
            "container-service" => Ok(ProviderId::ContainerService),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Problems found by [`crate::AccountsConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("duplicate compute account: {0}")]
    DuplicateComputeAccount(String),

    #[error("duplicate container-service account: {0}")]
    DuplicateContainerServiceAccount(String),

    #[error("container-service account {account} references undeclared compute account {compute_account}")]
    UndeclaredComputeAccount {
        account: String,
        compute_account: String,
    },

    #[error("compute account {compute_account} is claimed by both {first} and {second}")]
    ComputeAccountClaimedTwice {
        compute_account: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_have_stable_strings() {
        assert_eq!(ProviderId::Compute.to_string(), "compute");
        assert_eq!(ProviderId::ContainerService.to_string(), "container-service");
        assert_eq!("compute".parse::<ProviderId>(), Ok(ProviderId::Compute));
        assert_eq!(
            "container-service".parse::<ProviderId>(),
            Ok(ProviderId::ContainerService)
        );
        assert!("kubernetes".parse::<ProviderId>().is_err());
    }

    #[test]
    fn provider_id_serde_matches_display() {
        let json = serde_json::to_string(&ProviderId::ContainerService).unwrap();
        assert_eq!(json, "\"container-service\"");
    }
}
