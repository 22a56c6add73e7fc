//! CacheStore — redb-backed resource cache.
//!
//! One table per [`Namespace`], keyed by composite key, with JSON-serialized
//! [`CacheData`] in the `&[u8]` value column. Reads implement the [`Cache`]
//! interface consumed by the typed clients; `put`/`evict` are for the agents
//! that refresh the cache. Both on-disk and in-memory backends are supported
//! (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::glob;
use crate::keys::Namespace;
use crate::types::CacheData;

/// Closure turning a redb error into [`CacheError::Storage`] for `op`.
macro_rules! storage {
    ($op:literal) => {
        |e| CacheError::Storage {
            op: $op,
            reason: e.to_string(),
        }
    };
}

/// Read side of the cache, as consumed by [`CacheClient`](crate::CacheClient).
///
/// Each call is consistent on its own. Nothing is promised across calls: a
/// key returned by `filter_identifiers` may be gone by the next `get_many`.
pub trait Cache: Send + Sync {
    fn get(&self, namespace: Namespace, key: &str) -> CacheResult<Option<CacheData>>;

    fn get_all(&self, namespace: Namespace) -> CacheResult<Vec<CacheData>>;

    /// Rows for the keys that exist; missing keys are skipped.
    fn get_many(&self, namespace: Namespace, keys: &[String]) -> CacheResult<Vec<CacheData>>;

    /// Keys in `namespace` matching a glob (`*`, `?`).
    fn filter_identifiers(&self, namespace: Namespace, pattern: &str) -> CacheResult<Vec<String>>;
}

fn table_def(namespace: Namespace) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(namespace.as_str())
}

fn decode(namespace: Namespace, key: &str, bytes: &[u8]) -> CacheResult<CacheData> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Decode {
        namespace,
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Thread-safe cache store backed by redb.
#[derive(Clone)]
pub struct CacheStore {
    db: Arc<Database>,
}

impl CacheStore {
    /// Open (or create) a persistent cache at the given path.
    pub fn open(path: &Path) -> CacheResult<Self> {
        let db = Database::create(path).map_err(|e| CacheError::Open {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "cache store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory cache (for testing).
    pub fn open_in_memory() -> CacheResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(|e| CacheError::Open {
                location: "memory".to_string(),
                reason: e.to_string(),
            })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory cache store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> CacheResult<()> {
        let txn = self.db.begin_write().map_err(storage!("begin"))?;
        // Opening a table in a write transaction creates it if absent.
        for namespace in Namespace::ALL {
            txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
        }
        txn.commit().map_err(storage!("commit"))?;
        Ok(())
    }

    /// Insert or replace rows in one transaction.
    pub fn put_all(&self, namespace: Namespace, rows: &[CacheData]) -> CacheResult<()> {
        let encoded = rows
            .iter()
            .map(|row| {
                serde_json::to_vec(row)
                    .map(|bytes| (row.id.as_str(), bytes))
                    .map_err(|e| CacheError::Encode {
                        key: row.id.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<CacheResult<Vec<_>>>()?;

        let txn = self.db.begin_write().map_err(storage!("begin"))?;
        {
            let mut table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
            for (key, value) in &encoded {
                table
                    .insert(*key, value.as_slice())
                    .map_err(storage!("write"))?;
            }
        }
        txn.commit().map_err(storage!("commit"))?;
        debug!(%namespace, rows = encoded.len(), "cache rows stored");
        Ok(())
    }

    /// Insert or replace a single row.
    pub fn put(&self, namespace: Namespace, row: &CacheData) -> CacheResult<()> {
        self.put_all(namespace, std::slice::from_ref(row))
    }

    /// Remove a row. Returns true if it existed.
    pub fn evict(&self, namespace: Namespace, key: &str) -> CacheResult<bool> {
        let txn = self.db.begin_write().map_err(storage!("begin"))?;
        let existed;
        {
            let mut table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
            existed = table.remove(key).map_err(storage!("write"))?.is_some();
        }
        txn.commit().map_err(storage!("commit"))?;
        debug!(%namespace, %key, existed, "cache row evicted");
        Ok(existed)
    }
}

impl Cache for CacheStore {
    fn get(&self, namespace: Namespace, key: &str) -> CacheResult<Option<CacheData>> {
        let txn = self.db.begin_read().map_err(storage!("begin"))?;
        let table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
        match table.get(key).map_err(storage!("read"))? {
            Some(guard) => Ok(Some(decode(namespace, key, guard.value())?)),
            None => Ok(None),
        }
    }

    fn get_all(&self, namespace: Namespace) -> CacheResult<Vec<CacheData>> {
        let txn = self.db.begin_read().map_err(storage!("begin"))?;
        let table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(storage!("read"))? {
            let (key, value) = entry.map_err(storage!("read"))?;
            results.push(decode(namespace, key.value(), value.value())?);
        }
        Ok(results)
    }

    fn get_many(&self, namespace: Namespace, keys: &[String]) -> CacheResult<Vec<CacheData>> {
        let txn = self.db.begin_read().map_err(storage!("begin"))?;
        let table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(guard) = table.get(key.as_str()).map_err(storage!("read"))? {
                results.push(decode(namespace, key, guard.value())?);
            }
        }
        Ok(results)
    }

    fn filter_identifiers(&self, namespace: Namespace, pattern: &str) -> CacheResult<Vec<String>> {
        let matcher = glob::compile(pattern)?;
        let txn = self.db.begin_read().map_err(storage!("begin"))?;
        let table = txn.open_table(table_def(namespace)).map_err(storage!("open table"))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(storage!("read"))? {
            let (key, _) = entry.map_err(storage!("read"))?;
            if matcher.is_match(key.value()) {
                results.push(key.value().to_string());
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::types::Attributes;
    use serde_json::json;

    fn row(key: String, arn: &str) -> CacheData {
        let mut attributes = Attributes::new();
        attributes.insert("containerInstanceArn".to_string(), json!(arn));
        CacheData::new(key, attributes)
    }

    fn instance_key(account: &str, region: &str, id: &str) -> String {
        keys::container_instance(account, region, &format!("arn:aws:ecs:{region}:1:ci/{id}"))
    }

    #[test]
    fn put_and_get() {
        let store = CacheStore::open_in_memory().unwrap();
        let data = row(instance_key("a", "us-west-2", "1"), "arn-1")
            .with_relationship("clusters", vec![keys::cluster("a", "us-west-2", "main")]);

        store.put(Namespace::ContainerInstances, &data).unwrap();
        let retrieved = store.get(Namespace::ContainerInstances, &data.id).unwrap();

        assert_eq!(retrieved, Some(data));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = CacheStore::open_in_memory().unwrap();
        assert!(store.get(Namespace::Tasks, "nope").unwrap().is_none());
    }

    #[test]
    fn namespaces_are_isolated() {
        let store = CacheStore::open_in_memory().unwrap();
        let data = row(instance_key("a", "us-west-2", "1"), "arn-1");
        store.put(Namespace::ContainerInstances, &data).unwrap();

        assert!(store.get(Namespace::Tasks, &data.id).unwrap().is_none());
        assert!(store.get_all(Namespace::Tasks).unwrap().is_empty());
        assert_eq!(store.get_all(Namespace::ContainerInstances).unwrap().len(), 1);
    }

    #[test]
    fn put_replaces_existing_row() {
        let store = CacheStore::open_in_memory().unwrap();
        let key = instance_key("a", "us-west-2", "1");
        store.put(Namespace::ContainerInstances, &row(key.clone(), "old")).unwrap();
        store.put(Namespace::ContainerInstances, &row(key.clone(), "new")).unwrap();

        let all = store.get_all(Namespace::ContainerInstances).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].attributes["containerInstanceArn"], json!("new"));
    }

    #[test]
    fn get_many_skips_missing_keys() {
        let store = CacheStore::open_in_memory().unwrap();
        let present = row(instance_key("a", "us-west-2", "1"), "arn-1");
        store.put(Namespace::ContainerInstances, &present).unwrap();

        let rows = store
            .get_many(
                Namespace::ContainerInstances,
                &[present.id.clone(), instance_key("a", "us-west-2", "gone")],
            )
            .unwrap();

        assert_eq!(rows, vec![present]);
    }

    #[test]
    fn filter_identifiers_by_account_and_region() {
        let store = CacheStore::open_in_memory().unwrap();
        let rows = vec![
            row(instance_key("a", "us-west-2", "1"), "arn-1"),
            row(instance_key("a", "us-west-2", "2"), "arn-2"),
            row(instance_key("a", "us-east-1", "3"), "arn-3"),
            row(instance_key("b", "us-west-2", "4"), "arn-4"),
        ];
        store.put_all(Namespace::ContainerInstances, &rows).unwrap();

        let mut found = store
            .filter_identifiers(
                Namespace::ContainerInstances,
                &keys::Key::pattern(Namespace::ContainerInstances, "a", "us-west-2"),
            )
            .unwrap();
        found.sort();

        assert_eq!(found, vec![rows[0].id.clone(), rows[1].id.clone()]);
        assert_eq!(
            store
                .filter_identifiers(Namespace::ContainerInstances, "*")
                .unwrap()
                .len(),
            4
        );
    }

    #[test]
    fn evict_removes_row() {
        let store = CacheStore::open_in_memory().unwrap();
        let data = row(instance_key("a", "us-west-2", "1"), "arn-1");
        store.put(Namespace::ContainerInstances, &data).unwrap();

        assert!(store.evict(Namespace::ContainerInstances, &data.id).unwrap());
        assert!(!store.evict(Namespace::ContainerInstances, &data.id).unwrap());
        assert!(store.get(Namespace::ContainerInstances, &data.id).unwrap().is_none());
    }

    #[test]
    fn empty_store_operations() {
        let store = CacheStore::open_in_memory().unwrap();
        for namespace in Namespace::ALL {
            assert!(store.get_all(namespace).unwrap().is_empty());
            assert!(store.filter_identifiers(namespace, "*").unwrap().is_empty());
            assert!(store.get_many(namespace, &["x".to_string()]).unwrap().is_empty());
        }
    }

    #[test]
    fn undecodable_row_names_its_key() {
        let store = CacheStore::open_in_memory().unwrap();
        let key = instance_key("a", "us-west-2", "1");
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(table_def(Namespace::ContainerInstances)).unwrap();
            table.insert(key.as_str(), b"not json".as_slice()).unwrap();
        }
        txn.commit().unwrap();

        let err = store.get(Namespace::ContainerInstances, &key).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Decode { namespace: Namespace::ContainerInstances, key: ref k, .. } if *k == key
        ));
        assert!(matches!(
            store.get_all(Namespace::ContainerInstances),
            Err(CacheError::Decode { .. })
        ));
    }

    #[test]
    fn open_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("cache.redb");
        let err = CacheStore::open(&missing).err().unwrap();
        assert!(matches!(err, CacheError::Open { ref location, .. } if location.contains("no-such-dir")));
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("cache.redb");
        let data = row(instance_key("a", "us-west-2", "1"), "arn-1");

        {
            let store = CacheStore::open(&db_path).unwrap();
            store.put(Namespace::ContainerInstances, &data).unwrap();
        }

        // Reopen the same database file.
        let store = CacheStore::open(&db_path).unwrap();
        assert_eq!(
            store.get(Namespace::ContainerInstances, &data.id).unwrap(),
            Some(data)
        );
    }
}
