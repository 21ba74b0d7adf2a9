//! In-Memory Store Module
//!
//! HashMap-backed document store with per-document expiry, design documents
//! and the namespace view.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    DesignDocument, Document, DocumentStore, StoreResult, StoreStats, StoredDocument, ViewQuery,
    ViewRow,
};
use crate::error::StoreError;
use crate::keyspace::{cache_name_of, namespace_map_function};

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, StoredDocument>,
    design_documents: HashMap<String, DesignDocument>,
    stats: StoreStats,
}

// == Memory Store ==
/// In-memory [`DocumentStore`].
///
/// Expired documents are invisible to reads and view queries; they are
/// dropped on access or by [`MemoryStore::purge_expired`]. The only view map
/// function it can evaluate is the namespace function from
/// [`keyspace`](crate::keyspace).
///
/// Reads take the write lock too, since they update the counters, so all
/// operations on one store are serialized.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    flush_enabled: bool,
}

/// Builder for [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryStoreBuilder {
    flush_enabled: bool,
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self {
            flush_enabled: true,
        }
    }
}

impl MemoryStoreBuilder {
    /// Whether [`DocumentStore::flush`] is allowed (default: true).
    pub fn flush_enabled(mut self, enabled: bool) -> Self {
        self.flush_enabled = enabled;
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore {
            inner: RwLock::new(Inner::default()),
            flush_enabled: self.flush_enabled,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with flush enabled.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    // == Stats ==
    /// Returns current operation counters.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_documents(inner.documents.len());
        stats
    }

    /// Number of documents held, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Ids of all live documents, sorted.
    pub async fn document_ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut ids: Vec<String> = inner
            .documents
            .iter()
            .filter(|(_, stored)| !stored.is_expired())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    // == Purge Expired ==
    /// Removes all expired documents.
    ///
    /// Returns the number of documents removed.
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.documents.len();
        inner.documents.retain(|_, stored| !stored.is_expired());

        before - inner.documents.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let mut inner = self.inner.write().await;

        match inner.documents.get(id) {
            Some(stored) if !stored.is_expired() => {
                let document = stored.to_document(id);
                inner.stats.record_hit();
                Ok(Some(document))
            }
            Some(_) => {
                inner.documents.remove(id);
                inner.stats.record_miss();
                Ok(None)
            }
            None => {
                inner.stats.record_miss();
                Ok(None)
            }
        }
    }

    async fn upsert(&self, document: Document) -> StoreResult<()> {
        let stored = StoredDocument::new(&document);
        let mut inner = self.inner.write().await;
        inner.documents.insert(document.id, stored);
        inner.stats.record_upsert();
        Ok(())
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let existed = inner
            .documents
            .remove(id)
            .is_some_and(|stored| !stored.is_expired());
        inner.stats.record_remove();
        Ok(existed)
    }

    async fn flush(&self) -> StoreResult<()> {
        if !self.flush_enabled {
            return Err(StoreError::FlushDisabled);
        }

        let mut inner = self.inner.write().await;
        let removed = inner.documents.len();
        inner.documents.clear();
        inner.stats.record_flush();
        debug!(removed, "memory store flushed");
        Ok(())
    }

    async fn query_view(&self, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        let mut inner = self.inner.write().await;

        let design = inner
            .design_documents
            .get(&query.design_document)
            .ok_or_else(|| StoreError::DesignDocumentNotFound(query.design_document.clone()))?;
        let view = design.view(&query.view).ok_or_else(|| StoreError::ViewNotFound {
            design: query.design_document.clone(),
            view: query.view.clone(),
        })?;
        if view.map != namespace_map_function() {
            return Err(StoreError::UnsupportedView(format!(
                "{}/{}",
                query.design_document, query.view
            )));
        }

        let mut rows: Vec<ViewRow> = inner
            .documents
            .iter()
            .filter(|(_, stored)| !stored.is_expired())
            .filter_map(|(id, _)| {
                let key = cache_name_of(id)?;
                let matches = query.key.as_deref().map_or(true, |wanted| wanted == key);
                matches.then(|| ViewRow {
                    id: id.clone(),
                    key: key.to_string(),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        inner.stats.record_view_query();
        Ok(rows)
    }

    async fn get_design_document(&self, name: &str) -> StoreResult<Option<DesignDocument>> {
        Ok(self.inner.read().await.design_documents.get(name).cloned())
    }

    async fn upsert_design_document(&self, design: DesignDocument) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.design_documents.insert(design.name.clone(), design);
        Ok(())
    }
}
