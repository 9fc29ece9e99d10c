mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchDocumentStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::NotFound { collection, id } => StorageError::not_found(collection, id),
            CouchDaoError::Forbidden { .. } => StorageError::permission_denied(err.to_string()),
            err => StorageError::unavailable(err.to_string(), err),
        }
    }
}
