//! Credentials registries.
//!
//! A [`CredentialsRepository`] holds credentials of one provider keyed by
//! account name. The [`CompositeCredentialsRepository`] fronts one repository
//! per provider and resolves `(name, provider)` pairs.
//!
//! Values are stored as `Arc<T>` and replaced wholesale on `save`; readers
//! holding an older `Arc` keep a consistent value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use stratus_core::ProviderId;

use crate::credentials::{
    AccountCredentials, ComputeCredentials, ContainerServiceCredentials, Credentials,
};

/// Thread-safe registry of credentials for a single provider.
pub struct CredentialsRepository<T> {
    provider: ProviderId,
    credentials: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: Credentials> CredentialsRepository<T> {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            credentials: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Get credentials by account name.
    pub fn get_one(&self, name: &str) -> Option<Arc<T>> {
        self.credentials.read().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.credentials.read().contains_key(name)
    }

    /// Insert or replace credentials. Returns the replaced value, if any.
    pub fn save(&self, credentials: T) -> Option<Arc<T>> {
        let name = credentials.name().to_string();
        let previous = self
            .credentials
            .write()
            .insert(name.clone(), Arc::new(credentials));
        debug!(provider = %self.provider, account = %name, replaced = previous.is_some(), "credentials saved");
        previous
    }

    /// Remove credentials by account name. Returns the removed value, if any.
    pub fn delete(&self, name: &str) -> Option<Arc<T>> {
        let removed = self.credentials.write().remove(name);
        debug!(provider = %self.provider, account = %name, existed = removed.is_some(), "credentials deleted");
        removed
    }

    pub fn get_all(&self) -> Vec<Arc<T>> {
        self.credentials.read().values().cloned().collect()
    }

    /// Sorted account names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.credentials.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.credentials.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.read().is_empty()
    }
}

/// Registry keyed by `(name, provider)`, backed by one repository per provider.
#[derive(Clone)]
pub struct CompositeCredentialsRepository {
    compute: Arc<CredentialsRepository<ComputeCredentials>>,
    container_service: Arc<CredentialsRepository<ContainerServiceCredentials>>,
}

impl CompositeCredentialsRepository {
    pub fn new(
        compute: Arc<CredentialsRepository<ComputeCredentials>>,
        container_service: Arc<CredentialsRepository<ContainerServiceCredentials>>,
    ) -> Self {
        Self {
            compute,
            container_service,
        }
    }

    /// A composite over two fresh, empty repositories.
    pub fn empty() -> Self {
        Self::new(
            Arc::new(CredentialsRepository::new(ProviderId::Compute)),
            Arc::new(CredentialsRepository::new(ProviderId::ContainerService)),
        )
    }

    pub fn compute(&self) -> &Arc<CredentialsRepository<ComputeCredentials>> {
        &self.compute
    }

    pub fn container_service(&self) -> &Arc<CredentialsRepository<ContainerServiceCredentials>> {
        &self.container_service
    }

    pub fn get_credentials(&self, name: &str, provider: ProviderId) -> Option<AccountCredentials> {
        match provider {
            ProviderId::Compute => self.compute.get_one(name).map(AccountCredentials::Compute),
            ProviderId::ContainerService => self
                .container_service
                .get_one(name)
                .map(AccountCredentials::ContainerService),
        }
    }

    /// Typed shorthand for `get_credentials(name, ProviderId::Compute)`.
    pub fn compute_credentials(&self, name: &str) -> Option<Arc<ComputeCredentials>> {
        self.compute.get_one(name)
    }

    /// First credentials with this name, checking compute before container-service.
    pub fn first_credentials_with_name(&self, name: &str) -> Option<AccountCredentials> {
        self.get_credentials(name, ProviderId::Compute)
            .or_else(|| self.get_credentials(name, ProviderId::ContainerService))
    }

    pub fn all_credentials(&self) -> Vec<AccountCredentials> {
        let mut all: Vec<AccountCredentials> = self
            .compute
            .get_all()
            .into_iter()
            .map(AccountCredentials::Compute)
            .collect();
        all.extend(
            self.container_service
                .get_all()
                .into_iter()
                .map(AccountCredentials::ContainerService),
        );
        all
    }
}

impl Default for CompositeCredentialsRepository {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AssumeRoleCredentials, DirectCredentials};

    fn direct(name: &str) -> ComputeCredentials {
        ComputeCredentials::Direct(DirectCredentials {
            name: name.to_string(),
            account_id: "123456789012".to_string(),
            regions: vec!["us-east-1".to_string()],
            material: None,
            environment: None,
            account_type: None,
        })
    }

    fn container_service(name: &str, compute: &str) -> ContainerServiceCredentials {
        let base = DirectCredentials {
            name: name.to_string(),
            account_id: "123456789012".to_string(),
            regions: vec![],
            material: None,
            environment: None,
            account_type: None,
        };
        ContainerServiceCredentials::new(
            AssumeRoleCredentials {
                base,
                assume_role: "role/deploy".to_string(),
                session_name: "stratus".to_string(),
                source_account_id: "123456789012".to_string(),
            },
            compute,
        )
    }

    #[test]
    fn save_get_delete() {
        let repo = CredentialsRepository::new(ProviderId::Compute);
        assert!(repo.is_empty());

        assert!(repo.save(direct("aws-prod")).is_none());
        assert!(repo.has("aws-prod"));
        assert_eq!(repo.get_one("aws-prod").unwrap().name(), "aws-prod");

        assert!(repo.delete("aws-prod").is_some());
        assert!(repo.delete("aws-prod").is_none());
        assert!(repo.get_one("aws-prod").is_none());
    }

    #[test]
    fn save_replaces_and_old_arc_survives() {
        let repo = CredentialsRepository::new(ProviderId::Compute);
        repo.save(direct("aws-prod"));
        let before = repo.get_one("aws-prod").unwrap();

        let mut updated = direct("aws-prod");
        if let ComputeCredentials::Direct(d) = &mut updated {
            d.regions.push("eu-west-1".to_string());
        }
        let replaced = repo.save(updated).unwrap();

        assert_eq!(replaced, before);
        assert_eq!(before.regions().len(), 1);
        assert_eq!(repo.get_one("aws-prod").unwrap().regions().len(), 2);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let repo = CredentialsRepository::new(ProviderId::Compute);
        repo.save(direct("b"));
        repo.save(direct("a"));
        repo.save(direct("c"));
        assert_eq!(repo.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn composite_dispatches_by_provider() {
        let composite = CompositeCredentialsRepository::empty();
        composite.compute().save(direct("shared"));
        composite
            .container_service()
            .save(container_service("shared", "aws-prod"));
        composite
            .container_service()
            .save(container_service("ecs-only", "aws-prod"));

        let compute = composite.get_credentials("shared", ProviderId::Compute).unwrap();
        assert_eq!(compute.provider(), ProviderId::Compute);

        let ecs = composite
            .get_credentials("shared", ProviderId::ContainerService)
            .unwrap();
        assert_eq!(ecs.provider(), ProviderId::ContainerService);

        assert!(composite.get_credentials("ecs-only", ProviderId::Compute).is_none());
        assert_eq!(
            composite.first_credentials_with_name("shared").unwrap().provider(),
            ProviderId::Compute
        );
        assert_eq!(
            composite.first_credentials_with_name("ecs-only").unwrap().name(),
            "ecs-only"
        );
        assert_eq!(composite.all_credentials().len(), 3);
    }
}
