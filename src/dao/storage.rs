use std::{error::Error, sync::Arc};

use thiserror::Error;

use crate::dao::document_store::Collection;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
///
/// Cloneable so a single failed fetch can be handed to every caller sharing it.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The addressed document does not exist.
    #[error("document `{id}` not found in `{collection}`")]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Identifier that matched nothing.
        id: String,
    },
    /// The backend refused the operation for the configured credentials.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Backend explanation.
        message: String,
    },
    /// The backend could not be reached or answered unexpectedly.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Summary shown to callers.
        message: String,
        /// Backend failure.
        #[source]
        source: Arc<dyn Error + Send + Sync>,
    },
    /// A stored document does not match the expected schema.
    #[error("invalid `{collection}` document `{id}`: {message}")]
    Validation {
        /// Collection holding the document.
        collection: Collection,
        /// Offending document.
        id: String,
        /// Every rule the document broke.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Construct a not-found error for `id` inside `collection`.
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        StorageError::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Construct a permission error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        StorageError::PermissionDenied {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}

/// Stand-in source for unavailability that has no underlying error value.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Degraded(pub &'static str);
