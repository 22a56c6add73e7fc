//! stratus-cache — resource cache for the container service.
//!
//! Cache agents write rows of `(composite key, attribute map, relationships)`
//! into a [`CacheStore`]; readers go through a typed [`CacheClient`] that
//! projects each row into a domain entity.
//!
//! # Architecture
//!
//! - **`keys`** — composite key grammar
//!   `container-service:<namespace>:<account>:<region>:<resource-id>`.
//! - **`store`** — the [`Cache`] read interface and its redb implementation.
//!   One table per namespace; rows are JSON-serialized [`CacheData`].
//! - **`client`** — [`CacheClient<T>`], generic over a [`CachedEntity`].
//! - **`entities`** — container instances, clusters, services and tasks.
//!
//! The store is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).
//! Clients are read-only.

pub mod client;
pub mod entities;
pub mod error;
mod glob;
pub mod keys;
pub mod store;
pub mod types;

pub use client::{CacheClient, CachedEntity};
pub use entities::*;
pub use error::{CacheError, CacheResult};
pub use keys::{Key, KeyError, Namespace};
pub use store::{Cache, CacheStore};
pub use types::{Attributes, CacheData};
