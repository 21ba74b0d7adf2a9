//! Store Module
//!
//! The document store handle a cache delegates to, the values crossing it,
//! and an in-memory implementation.

mod entry;
mod memory;
mod stats;

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

pub use entry::StoredDocument;
pub use memory::{MemoryStore, MemoryStoreBuilder};
pub use stats::StoreStats;

/// Result type of store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Document ==
/// A JSON document addressed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Fully qualified document id
    pub id: String,
    /// Stored value
    pub content: Value,
    /// Expiry in seconds from write time, 0 = never
    pub expiry: u32,
}

impl Document {
    /// Creates a document with the given expiry.
    pub fn new(id: impl Into<String>, content: Value, expiry: u32) -> Self {
        Self {
            id: id.into(),
            content,
            expiry,
        }
    }
}

// == Views ==
/// A named map function registered with the store's index subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    /// Map function source
    pub map: String,
}

impl View {
    pub fn new(name: impl Into<String>, map: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            map: map.into(),
        }
    }
}

/// A named group of views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub name: String,
    pub views: Vec<View>,
}

impl DesignDocument {
    pub fn new(name: impl Into<String>, views: Vec<View>) -> Self {
        Self {
            name: name.into(),
            views,
        }
    }

    /// Looks up a view by name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.name == name)
    }
}

/// Index freshness requested by a view query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stale {
    /// Serve the index as it is
    #[default]
    Ok,
    /// Update the index before answering
    False,
    /// Answer, then update the index
    UpdateAfter,
}

/// Query against one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub design_document: String,
    pub view: String,
    /// Exact emitted key to match, all rows when `None`
    pub key: Option<String>,
    pub stale: Stale,
}

impl ViewQuery {
    /// Query every row of `design_document/view`.
    pub fn from(design_document: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design_document: design_document.into(),
            view: view.into(),
            key: None,
            stale: Stale::default(),
        }
    }

    /// Restricts the query to rows emitted with `key`.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn stale(mut self, stale: Stale) -> Self {
        self.stale = stale;
        self
    }
}

/// One row produced by a view query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    /// Id of the document that emitted the row
    pub id: String,
    /// Emitted key
    pub key: String,
}

// == Document Store ==
/// Client handle of a document key-value store.
///
/// Implementations must be safe to share between tasks; caches only ever
/// hold them behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Fetches a document, `None` if it does not exist.
    async fn get(&self, id: &str) -> StoreResult<Option<Document>>;

    /// Creates or replaces a document.
    async fn upsert(&self, document: Document) -> StoreResult<()>;

    /// Removes a document. Returns whether it existed.
    async fn remove(&self, id: &str) -> StoreResult<bool>;

    /// Deletes every document in the store.
    async fn flush(&self) -> StoreResult<()>;

    /// Runs a view query.
    async fn query_view(&self, query: &ViewQuery) -> StoreResult<Vec<ViewRow>>;

    /// Reads a design document, `None` if it does not exist.
    async fn get_design_document(&self, name: &str) -> StoreResult<Option<DesignDocument>>;

    /// Creates or replaces a design document.
    async fn upsert_design_document(&self, design: DesignDocument) -> StoreResult<()>;
}
