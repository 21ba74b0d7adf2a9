//! Stored Document Module
//!
//! A document as held by the in-memory store, with its expiry deadline.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::Document;

// == Stored Document ==
/// Document content plus its expiry deadline.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// The stored value
    pub content: Value,
    /// Expiry in seconds as requested by the writer
    pub expiry: u32,
    /// Expiration deadline, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredDocument {
    // == Constructor ==
    /// Stores `document` as written now.
    ///
    /// An expiry of 0 means the document never expires.
    pub fn new(document: &Document) -> Self {
        Self::written_at(document, Utc::now())
    }

    /// Stores `document` as written at `now`.
    pub fn written_at(document: &Document, now: DateTime<Utc>) -> Self {
        let expires_at =
            (document.expiry > 0).then(|| now + Duration::seconds(i64::from(document.expiry)));

        Self {
            content: document.content.clone(),
            expiry: document.expiry,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the document has expired.
    ///
    /// A document is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Rebuilds the document under `id`.
    pub fn to_document(&self, id: &str) -> Document {
        Document::new(id, self.content.clone(), self.expiry)
    }
}
