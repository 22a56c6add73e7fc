//! Cache errors.

use thiserror::Error;

use crate::keys::Namespace;

pub type CacheResult<T> = Result<T, CacheError>;

/// Failures of the cache store. Clients pass them through unchanged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot open cache at {location}: {reason}")]
    Open { location: String, reason: String },

    /// redb failed while running `op` (begin, open table, read, write, commit).
    #[error("cache {op} failed: {reason}")]
    Storage { op: &'static str, reason: String },

    #[error("cannot encode row {key:?}: {reason}")]
    Encode { key: String, reason: String },

    #[error("row {key:?} in {namespace} is not valid cache data: {reason}")]
    Decode {
        namespace: Namespace,
        key: String,
        reason: String,
    },

    #[error("invalid identifier pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}
