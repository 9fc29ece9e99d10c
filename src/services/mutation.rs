//! Write-side counterpart of the resource hooks.

use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    cache::{QueryCache, ResourceType},
    error::ServiceError,
};

/// Progress of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState<T> {
    /// Not started.
    Idle,
    /// Write in progress.
    Pending,
    /// Write stored; affected cache entries were invalidated.
    Success(T),
    /// Write failed; the message is the error's display form.
    Error(String),
}

/// Handle tracking one write action and the cache entries it affects.
pub struct Mutation<T> {
    name: &'static str,
    invalidates: &'static [ResourceType],
    state: watch::Sender<MutationState<T>>,
}

impl<T: Clone + Send + Sync> Mutation<T> {
    /// Create an idle mutation invalidating `invalidates` on success.
    pub fn new(name: &'static str, invalidates: &'static [ResourceType]) -> Self {
        let (state, _rx) = watch::channel(MutationState::Idle);
        Self {
            name,
            invalidates,
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> MutationState<T> {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<T>> {
        self.state.subscribe()
    }

    /// Run `work`, then invalidate the affected resources when it succeeds.
    ///
    /// A mutation runs once at a time; a second call while pending fails with
    /// [`ServiceError::InvalidState`] without running `work`.
    pub async fn run<F, Fut>(&self, cache: &QueryCache, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let started = self.state.send_if_modified(|state| {
            if matches!(state, MutationState::Pending) {
                false
            } else {
                *state = MutationState::Pending;
                true
            }
        });
        if !started {
            return Err(ServiceError::InvalidState(format!(
                "{} is already in progress",
                self.name
            )));
        }

        match work().await {
            Ok(value) => {
                for resource in self.invalidates {
                    cache.invalidate(*resource);
                }
                debug!(mutation = self.name, "mutation succeeded");
                self.state.send_replace(MutationState::Success(value.clone()));
                Ok(value)
            }
            Err(err) => {
                warn!(mutation = self.name, error = %err, "mutation failed");
                self.state.send_replace(MutationState::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Return to [`MutationState::Idle`] unless a write is in progress.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, MutationState::Pending | MutationState::Idle) {
                false
            } else {
                *state = MutationState::Idle;
                true
            }
        });
    }
}
