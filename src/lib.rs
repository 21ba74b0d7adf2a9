//! Doc Cache - namespaced caches over a shared document store
//!
//! Several named caches can live in one document key-value store. Each
//! cache writes its entries under `cache:<name>:<key>` ids and finds them
//! again through a store view, so clearing one cache leaves the others
//! alone.

pub mod cache;
pub mod config;
pub mod error;
pub mod keyspace;
pub mod store;
pub mod tasks;

pub use cache::{Cache, CacheExt, CacheRegistry, NamespacedCache};
pub use config::{CacheOptions, RegistryConfig};
pub use error::{CacheError, Result, StoreError};
pub use store::{DocumentStore, MemoryStore};
pub use tasks::spawn_expiry_sweeper;
