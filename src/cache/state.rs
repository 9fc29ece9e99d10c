use crate::dao::storage::{StorageError, StorageResult};

/// Observable state of a cached read.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// No value yet; a fetch is in flight.
    Loading,
    /// The last fetch failed and no earlier value is available.
    Error(StorageError),
    /// A value is available, possibly stale while a refresh runs.
    Success(T),
}

impl<T> QueryState<T> {
    /// Whether the state is [`QueryState::Loading`].
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    /// Borrow the value, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the successful value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(err) => QueryState::Error(err),
            QueryState::Success(value) => QueryState::Success(f(value)),
        }
    }

    /// Settled result, or `None` while loading.
    pub fn into_result(self) -> Option<StorageResult<T>> {
        match self {
            QueryState::Loading => None,
            QueryState::Error(err) => Some(Err(err)),
            QueryState::Success(value) => Some(Ok(value)),
        }
    }
}

impl<T> From<StorageResult<T>> for QueryState<T> {
    fn from(result: StorageResult<T>) -> Self {
        match result {
            Ok(value) => QueryState::Success(value),
            Err(err) => QueryState::Error(err),
        }
    }
}
