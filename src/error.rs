//! Error types for the cache adapter
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Errors reported by a document store handle.
///
/// The adapter never wraps or retries these; callers see them as-is through
/// [`CacheError::Store`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Flush is not enabled on the store
    #[error("Flush is disabled on this store")]
    FlushDisabled,

    /// Requested design document does not exist
    #[error("Design document not found: {0}")]
    DesignDocumentNotFound(String),

    /// Requested view does not exist in the design document
    #[error("View not found: {design}/{view}")]
    ViewNotFound { design: String, view: String },

    /// The store cannot evaluate the view's map function
    #[error("Unsupported view: {0}")]
    UnsupportedView(String),

    /// The request timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Any other store-side failure
    #[error("Internal store error: {0}")]
    Internal(String),
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value cannot be persisted by the store
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Stored document could not be read as the requested type
    #[error("Value under key {key} has an unexpected type: {source}")]
    TypeMismatch {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by the underlying store
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
