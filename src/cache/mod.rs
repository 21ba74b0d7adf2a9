//! Cache Module
//!
//! The generic cache interface, its namespaced implementation over a shared
//! document store, and the registry that builds one cache per store handle.

mod namespaced;
mod registry;


use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};
use crate::store::DocumentStore;

pub use namespaced::NamespacedCache;
pub use registry::CacheRegistry;

// == Cache Trait ==
/// Generic cache interface over JSON values.
///
/// Object safe, so caches can be held as `Arc<dyn Cache>`. Typed access is
/// provided by [`CacheExt`].
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Name of the cache.
    fn name(&self) -> &str;

    /// The store handle the cache writes to.
    fn native_store(&self) -> &Arc<dyn DocumentStore>;

    /// Gets a value, `None` when absent.
    async fn get_raw(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value, replacing any previous one. `Value::Null` evicts.
    async fn put_raw(&self, key: &str, value: Value) -> Result<()>;

    /// Stores `value` only if `get_raw(key)` finds nothing.
    ///
    /// Returns `None` when the value was written. Otherwise nothing is
    /// written and the *supplied* value is handed back; it does not reflect
    /// what is stored. The check and the write are separate store calls, so
    /// a concurrent writer can slip in between them.
    async fn put_if_absent_raw(&self, key: &str, value: Value) -> Result<Option<Value>> {
        if self.get_raw(key).await?.is_none() {
            self.put_raw(key, value).await?;
            return Ok(None);
        }

        Ok(Some(value))
    }

    /// Removes a value. Evicting an absent key is not an error.
    async fn evict(&self, key: &str) -> Result<()>;

    /// Removes every value of the cache.
    async fn clear(&self) -> Result<()>;
}

/// Converts a value into the JSON form persisted by the store.
pub fn to_cache_value<V>(value: &V) -> Result<Value>
where
    V: Serialize + ?Sized,
{
    serde_json::to_value(value).map_err(|e| {
        CacheError::InvalidValue(format!(
            "value of type {} cannot be stored: {}",
            std::any::type_name::<V>(),
            e
        ))
    })
}

// == Typed Access ==
/// Typed get/put on top of [`Cache`].
pub trait CacheExt: Cache {
    /// Gets a value deserialized as `V`.
    ///
    /// Fails with [`CacheError::TypeMismatch`] if the stored value does not
    /// fit `V`.
    fn get_as<'a, V>(&'a self, key: &'a str) -> impl Future<Output = Result<Option<V>>> + Send + 'a
    where
        V: DeserializeOwned + Send + 'a,
    {
        async move {
            match self.get_raw(key).await? {
                Some(value) => serde_json::from_value(value).map(Some).map_err(|source| {
                    CacheError::TypeMismatch {
                        key: key.to_string(),
                        source,
                    }
                }),
                None => Ok(None),
            }
        }
    }

    /// Stores a serializable value. Values serializing to `null` (such as
    /// `None`) evict the key instead.
    fn put<'a, V>(&'a self, key: &'a str, value: &'a V) -> impl Future<Output = Result<()>> + Send + 'a
    where
        V: Serialize + Sync + ?Sized,
    {
        async move {
            let value = to_cache_value(value)?;
            self.put_raw(key, value).await
        }
    }

    /// Typed [`Cache::put_if_absent_raw`]: `Some(value)` means the key was
    /// already present and nothing was written.
    fn put_if_absent<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
    ) -> impl Future<Output = Result<Option<&'a V>>> + Send + 'a
    where
        V: Serialize + Sync + ?Sized,
    {
        async move {
            let raw = to_cache_value(value)?;
            let previous = self.put_if_absent_raw(key, raw).await?;
            Ok(previous.map(|_| value))
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}
