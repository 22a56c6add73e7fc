//! Typed cache clients.
//!
//! A [`CacheClient<T>`] reads the namespace of entity `T` and projects each
//! row through [`CachedEntity::from_cache`]. Rows the converter rejects are
//! dropped. Rows whose key does not parse are logged and dropped too: agents
//! only ever write well-formed keys, so a bad one is a bug, not a user fault.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::error;

use crate::error::CacheResult;
use crate::keys::{Key, Namespace};
use crate::store::Cache;
use crate::types::{Attributes, CacheData};

/// An entity projected from one cache namespace.
pub trait CachedEntity: Sized {
    const NAMESPACE: Namespace;

    /// Build the entity from a row, or `None` if a required attribute is
    /// missing.
    fn from_cache(key: &Key, attributes: &Attributes) -> Option<Self>;
}

/// Read-only view of one namespace as typed entities.
pub struct CacheClient<T> {
    cache: Arc<dyn Cache>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheClient<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CacheClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("namespace", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: CachedEntity> CacheClient<T> {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            _entity: PhantomData,
        }
    }

    /// Every convertible entity in the namespace.
    pub fn get_all(&self) -> CacheResult<Vec<T>> {
        let rows = self.cache.get_all(T::NAMESPACE)?;
        Ok(rows.iter().filter_map(convert).collect())
    }

    pub fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let row = self.cache.get(T::NAMESPACE, key)?;
        Ok(row.as_ref().and_then(convert))
    }

    /// Keys in the namespace matching a glob.
    pub fn filter_identifiers(&self, pattern: &str) -> CacheResult<Vec<String>> {
        self.cache.filter_identifiers(T::NAMESPACE, pattern)
    }

    /// Entities in one account and region. Keys that disappear between the
    /// listing and the fetch are skipped.
    pub fn get_all_in(&self, account: &str, region: &str) -> CacheResult<Vec<T>> {
        let keys = self.filter_identifiers(&Key::pattern(T::NAMESPACE, account, region))?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.cache.get_many(T::NAMESPACE, &keys)?;
        Ok(rows.iter().filter_map(convert).collect())
    }
}

fn convert<T: CachedEntity>(row: &CacheData) -> Option<T> {
    match Key::parse(&row.id) {
        Ok(key) => T::from_cache(&key, &row.attributes),
        Err(err) => {
            error!(namespace = %T::NAMESPACE, key = %row.id, error = %err, "malformed cache key");
            None
        }
    }
}
