mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoDocumentStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::NotFound { collection, id } => StorageError::not_found(collection, id),
            err if err.is_permission_denied() => StorageError::permission_denied(err.to_string()),
            err => StorageError::unavailable(err.to_string(), err),
        }
    }
}
