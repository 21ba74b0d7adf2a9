//! Namespaced Cache Module
//!
//! A cache living inside one shared document store, isolated from other
//! caches by its document id prefix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::Cache;
use crate::config::CacheOptions;
use crate::error::Result;
use crate::keyspace::{self, namespace_view, CACHE_DESIGN_DOCUMENT, CACHE_VIEW};
use crate::store::{DesignDocument, Document, DocumentStore, Stale, ViewQuery};

// == Namespaced Cache ==
/// Cache whose entries are stored as `cache:<name>:<key>` documents.
///
/// `clear` is dual mode. With a non-blank name and always-flush off it
/// removes only this cache's documents, found through the `cache/names`
/// view. With always-flush on, or a blank name, it flushes the **whole
/// store**, including documents of other caches and of anything else
/// sharing the store.
#[derive(Debug)]
pub struct NamespacedCache {
    /// Cache name, may be blank
    name: String,
    /// Shared store handle
    store: Arc<dyn DocumentStore>,
    /// TTL in seconds applied to every write, 0 = no expiry
    ttl: u32,
    /// Clear by flushing the whole store
    always_flush: AtomicBool,
}

impl NamespacedCache {
    // == Constructors ==
    /// Creates a cache without TTL.
    pub async fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>) -> Result<Self> {
        Self::with_options(name, store, CacheOptions::default()).await
    }

    /// Creates a cache writing documents with `ttl` seconds of expiry.
    pub async fn with_ttl(
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        ttl: u32,
    ) -> Result<Self> {
        Self::with_options(name, store, CacheOptions::with_ttl(ttl)).await
    }

    /// Creates a cache from explicit options.
    ///
    /// The namespace view is registered with the store if it is not there
    /// yet, whatever the always-flush setting, so the flag can be switched
    /// off later.
    pub async fn with_options(
        name: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        options: CacheOptions,
    ) -> Result<Self> {
        let cache = Self {
            name: name.into(),
            store,
            ttl: options.ttl,
            always_flush: AtomicBool::new(options.always_flush),
        };

        cache.ensure_view_exists().await?;
        Ok(cache)
    }

    // == Accessors ==
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Whether `clear` flushes the whole store.
    pub fn always_flush(&self) -> bool {
        self.always_flush.load(Ordering::Acquire)
    }

    /// Switches `clear` between flushing the whole store and evicting only
    /// this cache's documents.
    pub fn set_always_flush(&self, always_flush: bool) {
        self.always_flush.store(always_flush, Ordering::Release);
    }

    /// Document id of `key` in this cache.
    pub fn document_id(&self, key: &str) -> String {
        keyspace::document_id(&self.name, key)
    }

    // == Scoped Eviction ==
    /// Removes every document the namespace view lists under this cache's
    /// name. Returns how many were removed.
    async fn evict_all_documents(&self) -> Result<usize> {
        let query = ViewQuery::from(CACHE_DESIGN_DOCUMENT, CACHE_VIEW)
            .key(self.name.as_str())
            .stale(Stale::False);

        let rows = self.store.query_view(&query).await?;
        let mut removed = 0;
        for row in rows {
            if self.store.remove(&row.id).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Registers the namespace view unless a view of that name exists.
    ///
    /// A failed probe counts as "no design document"; a failed upsert
    /// propagates.
    async fn ensure_view_exists(&self) -> Result<()> {
        let existing = match self.store.get_design_document(CACHE_DESIGN_DOCUMENT).await {
            Ok(design) => design,
            Err(err) => {
                debug!(error = %err, "design document probe failed, treating as absent");
                None
            }
        };

        let design = match existing {
            Some(design) if design.view(CACHE_VIEW).is_some() => return Ok(()),
            Some(mut design) => {
                design.views.push(namespace_view());
                design
            }
            None => DesignDocument::new(CACHE_DESIGN_DOCUMENT, vec![namespace_view()]),
        };

        self.store.upsert_design_document(design).await?;
        info!(
            cache = %self.name,
            "registered view {}/{}", CACHE_DESIGN_DOCUMENT, CACHE_VIEW
        );
        Ok(())
    }
}

#[async_trait]
impl Cache for NamespacedCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        let id = self.document_id(key);
        let document = self.store.get(&id).await?;

        Ok(document
            .map(|document| document.content)
            .filter(|content| !content.is_null()))
    }

    async fn put_raw(&self, key: &str, value: Value) -> Result<()> {
        if value.is_null() {
            return self.evict(key).await;
        }

        let id = self.document_id(key);
        debug!(cache = %self.name, %id, ttl = self.ttl, "upserting document");
        self.store
            .upsert(Document::new(id, value, self.ttl))
            .await?;
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<()> {
        let id = self.document_id(key);
        let existed = self.store.remove(&id).await?;
        debug!(cache = %self.name, %id, existed, "evicted document");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.always_flush() || keyspace::is_blank(&self.name) {
            match self.store.flush().await {
                Ok(()) => info!(cache = %self.name, "flushed store"),
                Err(err) => error!(cache = %self.name, error = %err, "store flush failed"),
            }
            return Ok(());
        }

        let removed = self.evict_all_documents().await?;
        debug!(cache = %self.name, removed, "cleared cache namespace");
        Ok(())
    }
}
