//! Account definition config parser.
//!
//! Compute accounts and the container-service accounts derived from them are
//! declared together in one TOML document:
//!
//! ```toml
//! [[compute.accounts]]
//! name = "aws-prod"
//! account_id = "123456789012"
//! regions = ["us-west-2"]
//! assume_role = "role/deploy"
//!
//! [[container_service.accounts]]
//! name = "ecs-prod"
//! aws_account = "aws-prod"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::types::{ConfigIssue, ProviderId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub compute: ComputeSection,
    #[serde(default)]
    pub container_service: ContainerServiceSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeSection {
    #[serde(default)]
    pub accounts: Vec<ComputeAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerServiceSection {
    #[serde(default)]
    pub accounts: Vec<ContainerServiceAccount>,
}

/// Declarative compute account, the input of a compute credentials parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeAccount {
    pub name: String,
    pub account_id: String,
    #[serde(default)]
    pub regions: Vec<String>,
    /// Role to assume, either a full ARN or `role/<name>`.
    pub assume_role: Option<String>,
    pub session_name: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub environment: Option<String>,
    pub account_type: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: ProviderId,
}

fn default_provider() -> ProviderId {
    ProviderId::Compute
}

/// Declarative container-service account layered on a compute account.
///
/// Optional fields override what is inherited from the compute account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerServiceAccount {
    pub name: String,
    #[serde(alias = "awsAccount")]
    pub aws_account: String,
    pub regions: Option<Vec<String>>,
    pub assume_role: Option<String>,
    pub session_name: Option<String>,
    pub environment: Option<String>,
    pub account_type: Option<String>,
}

impl ContainerServiceAccount {
    /// A definition carrying only the two required fields.
    pub fn new(name: &str, aws_account: &str) -> Self {
        Self {
            name: name.to_string(),
            aws_account: aws_account.to_string(),
            regions: None,
            assume_role: None,
            session_name: None,
            environment: None,
            account_type: None,
        }
    }
}

impl AccountsConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: AccountsConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config with one compute account and its container-service overlay.
    pub fn scaffold(compute_name: &str, account_id: &str, container_service_name: &str) -> Self {
        AccountsConfig {
            compute: ComputeSection {
                accounts: vec![ComputeAccount {
                    name: compute_name.to_string(),
                    account_id: account_id.to_string(),
                    regions: vec!["us-west-2".to_string()],
                    assume_role: Some("role/deploy".to_string()),
                    session_name: None,
                    access_key_id: None,
                    secret_access_key: None,
                    environment: None,
                    account_type: None,
                    provider: ProviderId::Compute,
                }],
            },
            container_service: ContainerServiceSection {
                accounts: vec![ContainerServiceAccount::new(
                    container_service_name,
                    compute_name,
                )],
            },
        }
    }

    pub fn compute_account(&self, name: &str) -> Option<&ComputeAccount> {
        self.compute.accounts.iter().find(|a| a.name == name)
    }

    pub fn container_service_account(&self, name: &str) -> Option<&ContainerServiceAccount> {
        self.container_service.accounts.iter().find(|a| a.name == name)
    }

    /// Report structural problems. An empty result means the config is clean.
    ///
    /// A compute account claimed by two container-service accounts is reported
    /// but still loadable: the later definition wins the pairing.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let mut compute_names = HashSet::new();
        for account in &self.compute.accounts {
            if !compute_names.insert(account.name.as_str()) {
                issues.push(ConfigIssue::DuplicateComputeAccount(account.name.clone()));
            }
        }

        let mut ecs_names = HashSet::new();
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for account in &self.container_service.accounts {
            if !ecs_names.insert(account.name.as_str()) {
                issues.push(ConfigIssue::DuplicateContainerServiceAccount(
                    account.name.clone(),
                ));
            }
            if !compute_names.contains(account.aws_account.as_str()) {
                issues.push(ConfigIssue::UndeclaredComputeAccount {
                    account: account.name.clone(),
                    compute_account: account.aws_account.clone(),
                });
            }
            if let Some(first) = claimed.insert(&account.aws_account, &account.name) {
                if first != account.name {
                    issues.push(ConfigIssue::ComputeAccountClaimedTwice {
                        compute_account: account.aws_account.clone(),
                        first: first.to_string(),
                        second: account.name.clone(),
                    });
                }
            }
        }

        issues
    }
}
