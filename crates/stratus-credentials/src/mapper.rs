//! Account mapper — pairs compute accounts with container-service accounts.
//!
//! Both directions live in one [`Mappings`] value behind a single lock, so a
//! reader never sees one direction updated without the other. Credential
//! lookups compose a name lookup with a registry fetch; the lock is released
//! before the registry is touched.
//!
//! [`AccountMapper::register`] and [`AccountMapper::deregister`] change the
//! container-service registry while holding the mappings write lock, so
//! concurrent registrations of one name serialize and the stored credentials
//! always belong to the compute account the pairing names.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use stratus_core::{ContainerServiceAccount, ProviderId};

use crate::credentials::{
    AccountCredentials, ComputeCredentials, ContainerServiceCredentials, Credentials,
};
use crate::repository::{CompositeCredentialsRepository, CredentialsRepository};

/// The two directional maps. Each is the inverse of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    ecs_by_aws: HashMap<String, String>,
    aws_by_ecs: HashMap<String, String>,
}

impl Mappings {
    /// compute name → container-service name.
    pub fn ecs_by_aws(&self) -> &HashMap<String, String> {
        &self.ecs_by_aws
    }

    /// container-service name → compute name.
    pub fn aws_by_ecs(&self) -> &HashMap<String, String> {
        &self.aws_by_ecs
    }

    pub fn len(&self) -> usize {
        self.aws_by_ecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aws_by_ecs.is_empty()
    }

    /// True when each map is exactly the inverse of the other.
    pub fn is_consistent(&self) -> bool {
        self.ecs_by_aws.len() == self.aws_by_ecs.len()
            && self
                .aws_by_ecs
                .iter()
                .all(|(ecs, aws)| self.ecs_by_aws.get(aws) == Some(ecs))
    }

    fn insert(&mut self, ecs: &str, aws: &str) {
        // A compute account pairs with one container-service account and
        // vice versa; whatever either side pointed at before is unpaired.
        if let Some(prev_ecs) = self.ecs_by_aws.insert(aws.to_string(), ecs.to_string()) {
            if prev_ecs != ecs {
                self.aws_by_ecs.remove(&prev_ecs);
            }
        }
        if let Some(prev_aws) = self.aws_by_ecs.insert(ecs.to_string(), aws.to_string()) {
            if prev_aws != aws {
                self.ecs_by_aws.remove(&prev_aws);
            }
        }
    }

    fn remove(&mut self, ecs: &str) -> Option<String> {
        let aws = self.aws_by_ecs.remove(ecs)?;
        if self.ecs_by_aws.get(&aws).map(String::as_str) == Some(ecs) {
            self.ecs_by_aws.remove(&aws);
        }
        Some(aws)
    }
}

/// Resolves names and credentials across the compute and container-service
/// namespaces.
pub struct AccountMapper {
    container_service: Arc<CredentialsRepository<ContainerServiceCredentials>>,
    composite: CompositeCredentialsRepository,
    mappings: RwLock<Mappings>,
}

impl AccountMapper {
    /// Create a mapper with no pairings over the given registries.
    pub fn new(composite: CompositeCredentialsRepository) -> Self {
        Self {
            container_service: composite.container_service().clone(),
            composite,
            mappings: RwLock::new(Mappings::default()),
        }
    }

    /// Pair `account.aws_account` with `account.name`, unpairing anything
    /// either side was paired with before. Re-adding an identical pair is a no-op.
    pub fn add_mapping(&self, account: &ContainerServiceAccount) {
        self.mappings
            .write()
            .insert(&account.name, &account.aws_account);
        debug!(
            account = %account.name,
            compute_account = %account.aws_account,
            "account mapping added"
        );
    }

    /// Store `credentials` and pair them with their compute account as one
    /// step. Returns the credentials previously stored under the same name.
    pub fn register(
        &self,
        credentials: ContainerServiceCredentials,
    ) -> Option<Arc<ContainerServiceCredentials>> {
        let name = credentials.name().to_string();
        let compute_account = credentials.compute_account().to_string();

        let mut mappings = self.mappings.write();
        let previous = self.container_service.save(credentials);
        mappings.insert(&name, &compute_account);
        drop(mappings);

        debug!(account = %name, %compute_account, "account registered and mapped");
        previous
    }

    /// Unpair a container-service account and drop its credentials as one
    /// step.
    pub fn deregister(&self, container_service_name: &str) -> Option<Arc<ContainerServiceCredentials>> {
        let mut mappings = self.mappings.write();
        let compute_account = mappings.remove(container_service_name);
        let removed = self.container_service.delete(container_service_name);
        drop(mappings);

        if let Some(compute_account) = compute_account {
            debug!(account = %container_service_name, %compute_account, "account mapping removed");
        }
        removed
    }

    /// Unpair a container-service account. Unknown names are ignored.
    pub fn remove_mapping(&self, container_service_name: &str) {
        let removed = self.mappings.write().remove(container_service_name);
        if let Some(compute_account) = removed {
            debug!(
                account = %container_service_name,
                %compute_account,
                "account mapping removed"
            );
        }
    }

    pub fn compute_to_container_service(
        &self,
        compute_name: &str,
    ) -> Option<Arc<ContainerServiceCredentials>> {
        let name = self.container_service_name_of(compute_name)?;
        self.container_service.get_one(&name)
    }

    pub fn container_service_to_compute(
        &self,
        container_service_name: &str,
    ) -> Option<Arc<ComputeCredentials>> {
        let name = self.compute_name_of(container_service_name)?;
        match self.composite.get_credentials(&name, ProviderId::Compute)? {
            AccountCredentials::Compute(credentials) => Some(credentials),
            AccountCredentials::ContainerService(_) => None,
        }
    }

    /// Compute account paired with a container-service account.
    pub fn compute_name_of(&self, container_service_name: &str) -> Option<String> {
        self.mappings.read().aws_by_ecs.get(container_service_name).cloned()
    }

    /// Container-service account paired with a compute account.
    pub fn container_service_name_of(&self, compute_name: &str) -> Option<String> {
        self.mappings.read().ecs_by_aws.get(compute_name).cloned()
    }

    /// A consistent copy of both maps.
    pub fn snapshot(&self) -> Mappings {
        self.mappings.read().clone()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}
