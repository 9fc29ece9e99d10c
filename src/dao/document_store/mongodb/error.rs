use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

use crate::dao::document_store::Collection;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Server error code returned when the authenticated user lacks a privilege.
const UNAUTHORIZED_CODE: i32 = 13;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// A required setting is absent from the environment.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Connection string as configured.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings sent before giving up.
        attempts: u32,
        /// Last driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Indexed collection.
        collection: Collection,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The addressed document does not exist.
    #[error("document `{id}` not found in `{collection}`")]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Identifier that matched nothing.
        id: String,
    },
    /// A find or cursor read failed.
    #[error("failed to read `{collection}`")]
    Read {
        /// Collection being read.
        collection: Collection,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An insert or update failed.
    #[error("failed to write `{id}` in `{collection}`")]
    Write {
        /// Collection being written.
        collection: Collection,
        /// Document being written.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the server rejected the operation for lack of privileges.
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            MongoDaoError::Read { source, .. } | MongoDaoError::Write { source, .. } => source,
            _ => return false,
        };
        matches!(source.kind.as_ref(), ErrorKind::Command(command) if command.code == UNAUTHORIZED_CODE)
    }
}
