//! Cache Registry Module
//!
//! Maps cache names to store handles and builds one cache per handle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use super::NamespacedCache;
use crate::config::RegistryConfig;
use crate::error::Result;
use crate::store::DocumentStore;

// == Cache Registry ==
/// Owns the name → store handle mapping and the caches built from it.
///
/// Caches are built on the first query (`caches`, `cache`, `cache_names`)
/// and reused afterwards. Several names may point at the same store; their
/// documents stay apart because each name has its own id prefix.
#[derive(Debug)]
pub struct CacheRegistry {
    stores: HashMap<String, Arc<dyn DocumentStore>>,
    config: RegistryConfig,
    caches: OnceCell<HashMap<String, Arc<NamespacedCache>>>,
}

impl CacheRegistry {
    /// Registry whose caches have no TTL.
    pub fn new(stores: HashMap<String, Arc<dyn DocumentStore>>) -> Self {
        Self::with_config(stores, RegistryConfig::default())
    }

    /// Registry with per-name TTLs in seconds; missing names get 0.
    pub fn with_ttls(
        stores: HashMap<String, Arc<dyn DocumentStore>>,
        ttls: HashMap<String, u32>,
    ) -> Self {
        Self::with_config(stores, RegistryConfig::from_ttls(ttls))
    }

    pub fn with_config(
        stores: HashMap<String, Arc<dyn DocumentStore>>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            stores,
            config,
            caches: OnceCell::new(),
        }
    }

    /// The registered store handles by cache name.
    pub fn stores(&self) -> &HashMap<String, Arc<dyn DocumentStore>> {
        &self.stores
    }

    /// TTL the cache called `name` is built with.
    pub fn ttl_for(&self, name: &str) -> u32 {
        self.config.ttl_for(name)
    }

    // == Caches ==
    /// All caches, building them on first call.
    ///
    /// If building fails the error is returned and the next call tries
    /// again from scratch.
    pub async fn caches(&self) -> Result<&HashMap<String, Arc<NamespacedCache>>> {
        self.caches.get_or_try_init(|| self.load_caches()).await
    }

    /// The cache called `name`, if registered.
    pub async fn cache(&self, name: &str) -> Result<Option<Arc<NamespacedCache>>> {
        Ok(self.caches().await?.get(name).cloned())
    }

    /// Names of all caches, sorted.
    pub async fn cache_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.caches().await?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn load_caches(&self) -> Result<HashMap<String, Arc<NamespacedCache>>> {
        let mut caches = HashMap::with_capacity(self.stores.len());

        for (name, store) in &self.stores {
            let options = self.config.options_for(name);
            let cache = NamespacedCache::with_options(name.clone(), Arc::clone(store), options).await?;
            caches.insert(name.clone(), Arc::new(cache));
        }

        info!(count = caches.len(), "cache registry initialized");
        Ok(caches)
    }
}
