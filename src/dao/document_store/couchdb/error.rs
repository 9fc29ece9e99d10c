use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::document_store::Collection;

/// Result alias of the CouchDB backend.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// CouchDB backend failures.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required setting is absent from the environment.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The server address cannot carry document paths.
    #[error("invalid CouchDB url `{url}`: {reason}")]
    InvalidUrl {
        /// Address as configured.
        url: String,
        /// Why it was refused.
        reason: String,
    },
    /// The HTTP client could not be configured.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The league database is missing and could not be created.
    #[error("CouchDB database `{database}` unavailable ({status})")]
    Database {
        /// Database name.
        database: String,
        /// Status of the last request.
        status: StatusCode,
    },
    /// No response from the server.
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        /// Requested path.
        path: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// Any other non-success status.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    Status {
        /// Requested path.
        path: String,
        /// Returned status.
        status: StatusCode,
    },
    /// Credentials missing or insufficient.
    #[error("CouchDB denied access to `{path}` ({status})")]
    Forbidden {
        /// Requested path.
        path: String,
        /// 401 or 403.
        status: StatusCode,
    },
    /// A concurrent writer replaced the revision we based our write on.
    #[error("CouchDB revision conflict on `{path}`")]
    Conflict {
        /// Contended document path.
        path: String,
    },
    /// The addressed document does not exist.
    #[error("document `{id}` not found in `{collection}`")]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Identifier that matched nothing.
        id: String,
    },
    /// The response body is not the expected JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    Decode {
        /// Requested path.
        path: String,
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// A stored row is not a JSON object with `_id`.
    #[error("malformed CouchDB row in `{path}`")]
    Malformed {
        /// Requested path.
        path: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
}

impl CouchDaoError {
    /// Classify a non-success status returned for `path`.
    pub fn from_status(path: String, status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Forbidden { path, status },
            StatusCode::CONFLICT => Self::Conflict { path },
            status => Self::Status { path, status },
        }
    }
}
