//! Credentials context — wiring and account lifecycle.
//!
//! Construction is two-phase: the registries are created empty, the mapper
//! is built over them, and only then is the container-service parser wired to
//! the registries and the mapper. Account definitions are loaded afterwards.
//!
//! Loading is per-account: a definition that fails to parse is reported in
//! the [`LoadReport`] and skipped, the rest of the config still loads.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use stratus_core::{AccountsConfig, ProviderId};

use crate::credentials::ContainerServiceCredentials;
use crate::error::CredentialsError;
use crate::mapper::AccountMapper;
use crate::parser::{ComputeCredentialsParser, ContainerServiceCredentialsParser};
use crate::repository::CompositeCredentialsRepository;

/// An account that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub account: String,
    pub provider: ProviderId,
    pub error: CredentialsError,
}

/// Outcome of a [`CredentialsContext::load`] or [`CredentialsContext::reload`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub compute_loaded: Vec<String>,
    pub container_service_loaded: Vec<String>,
    pub compute_removed: Vec<String>,
    pub container_service_removed: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registries, mapper and parser wired together.
pub struct CredentialsContext {
    composite: CompositeCredentialsRepository,
    mapper: Arc<AccountMapper>,
    parser: ContainerServiceCredentialsParser,
    compute_parser: Arc<dyn ComputeCredentialsParser>,
}

impl CredentialsContext {
    pub fn new(compute_parser: Arc<dyn ComputeCredentialsParser>) -> Self {
        let composite = CompositeCredentialsRepository::empty();
        let mapper = Arc::new(AccountMapper::new(composite.clone()));
        let parser = ContainerServiceCredentialsParser::new(
            composite.clone(),
            Arc::clone(&mapper),
            Arc::clone(&compute_parser),
        );
        Self {
            composite,
            mapper,
            parser,
            compute_parser,
        }
    }

    pub fn composite(&self) -> &CompositeCredentialsRepository {
        &self.composite
    }

    pub fn mapper(&self) -> &Arc<AccountMapper> {
        &self.mapper
    }

    pub fn parser(&self) -> &ContainerServiceCredentialsParser {
        &self.parser
    }

    /// Register every account in `config`. Compute accounts go first so the
    /// container-service accounts can resolve them.
    pub fn load(&self, config: &AccountsConfig) -> LoadReport {
        let mut report = LoadReport::default();
        self.load_compute(config, &mut report);
        self.load_container_service(config, &mut report);
        info!(
            compute = report.compute_loaded.len(),
            container_service = report.container_service_loaded.len(),
            failures = report.failures.len(),
            "accounts loaded"
        );
        report
    }

    /// Bring the registries and mapper in line with `config`.
    ///
    /// Accounts missing from `config` are deregistered, everything in
    /// `config` is re-parsed. An account of either provider that was
    /// registered but now fails to parse is deregistered too.
    pub fn reload(&self, config: &AccountsConfig) -> LoadReport {
        let mut report = LoadReport::default();

        let wanted_ecs: HashSet<&str> = config
            .container_service
            .accounts
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        for name in self.composite.container_service().names() {
            if !wanted_ecs.contains(name.as_str()) {
                self.deregister(&name);
                report.container_service_removed.push(name);
            }
        }

        let wanted_compute: HashSet<&str> =
            config.compute.accounts.iter().map(|a| a.name.as_str()).collect();
        for name in self.composite.compute().names() {
            if !wanted_compute.contains(name.as_str()) {
                self.composite.compute().delete(&name);
                info!(account = %name, "compute account deregistered");
                report.compute_removed.push(name);
            }
        }

        let previous_compute: HashSet<String> =
            self.composite.compute().names().into_iter().collect();
        let previous_ecs: HashSet<String> =
            self.composite.container_service().names().into_iter().collect();

        self.load_compute(config, &mut report);
        // Drop compute credentials that no longer parse before dependents resolve them.
        let stale: Vec<String> = report
            .failures
            .iter()
            .filter(|f| f.provider == ProviderId::Compute && previous_compute.contains(&f.account))
            .map(|f| f.account.clone())
            .collect();
        for name in stale {
            self.composite.compute().delete(&name);
            info!(account = %name, "compute account deregistered after failed re-parse");
            report.compute_removed.push(name);
        }

        let compute_failures = report.failures.len();
        self.load_container_service(config, &mut report);
        let failed_ecs: Vec<String> = report.failures[compute_failures..]
            .iter()
            .filter(|f| previous_ecs.contains(&f.account))
            .map(|f| f.account.clone())
            .collect();
        for name in failed_ecs {
            self.deregister(&name);
            report.container_service_removed.push(name);
        }

        info!(
            compute = report.compute_loaded.len(),
            container_service = report.container_service_loaded.len(),
            removed = report.compute_removed.len() + report.container_service_removed.len(),
            failures = report.failures.len(),
            "accounts reloaded"
        );
        report
    }

    /// Remove a container-service account from the registry and the mapper.
    pub fn deregister(&self, container_service_name: &str) -> Option<Arc<ContainerServiceCredentials>> {
        let removed = self.mapper.deregister(container_service_name);
        if removed.is_some() {
            info!(account = %container_service_name, "container-service account deregistered");
        }
        removed
    }

    fn load_compute(&self, config: &AccountsConfig, report: &mut LoadReport) {
        for account in &config.compute.accounts {
            match self.compute_parser.parse(account) {
                Ok(credentials) => {
                    self.composite.compute().save(credentials);
                    report.compute_loaded.push(account.name.clone());
                }
                Err(source) => {
                    warn!(account = %account.name, error = %source, "skipping compute account");
                    report.failures.push(LoadFailure {
                        account: account.name.clone(),
                        provider: ProviderId::Compute,
                        error: CredentialsError::ComputeParseFailed {
                            account: account.name.clone(),
                            source,
                        },
                    });
                }
            }
        }
    }

    fn load_container_service(&self, config: &AccountsConfig, report: &mut LoadReport) {
        for account in &config.container_service.accounts {
            match self.parser.parse(account) {
                Ok(_) => report.container_service_loaded.push(account.name.clone()),
                Err(error) => {
                    warn!(account = %account.name, %error, "skipping container-service account");
                    report.failures.push(LoadFailure {
                        account: account.name.clone(),
                        provider: ProviderId::ContainerService,
                        error,
                    });
                }
            }
        }
    }
}
