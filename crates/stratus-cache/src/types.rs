//! Raw cache rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute map of a cache row. Values are opaque until projected.
pub type Attributes = BTreeMap<String, Value>;

/// One cache row: composite key, attributes, and keys of related rows
/// grouped by namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<String>>,
}

impl CacheData {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
            relationships: BTreeMap::new(),
        }
    }

    /// Add related row keys under `namespace`.
    pub fn with_relationship(mut self, namespace: &str, keys: Vec<String>) -> Self {
        self.relationships
            .entry(namespace.to_string())
            .or_default()
            .extend(keys);
        self
    }
}
