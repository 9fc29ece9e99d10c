use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    cache::ResourceType,
    dao::{document_store::DocumentStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnect to the document store and keep the shared state in degraded mode when it is unavailable.
///
/// Leaving degraded mode drops every cached entry so reads see the recovered store.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                install(&state, store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded().await {
                                info!("storage healthy again; leaving degraded mode");
                                recover(&state).await;
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(health_err) => {
                            warn!(error = %health_err, "storage health check failed");
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match store.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "storage reconnection succeeded after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "storage reconnect first attempt failed; entering degraded mode"
                                            );
                                            state.update_degraded(true).await;
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                recover(&state).await;
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted storage reconnect attempts; staying in degraded mode"
                                );
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Swap in a freshly connected store; entries cached from the previous one are dropped.
async fn install(state: &SharedState, store: Arc<dyn DocumentStore>) {
    state.set_store(store).await;
    invalidate_all(state);
}

fn invalidate_all(state: &SharedState) {
    for resource in ResourceType::ALL {
        state.cache().invalidate(resource);
    }
}

async fn recover(state: &SharedState) {
    if !state.is_degraded().await {
        return;
    }
    state.update_degraded(false).await;
    invalidate_all(state);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            document_store::{Collection, Document, memory::MemoryDocumentStore},
            storage::Degraded,
        },
        services::resources,
        state::AppState,
    };

    #[tokio::test(start_paused = true)]
    async fn installs_store_after_failed_attempts() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicUsize::new(0));
        let store = MemoryDocumentStore::new();

        let counter = attempts.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            let store = store.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable("refused", Degraded("refused")))
                } else {
                    Ok(Arc::new(store) as Arc<dyn DocumentStore>)
                }
            }
        }));

        sleep(Duration::from_secs(4)).await;
        assert!(!state.is_degraded().await);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn outage_enters_and_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryDocumentStore::new();
        let handle = store.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let store = store.clone();
            async move { Ok(Arc::new(store) as Arc<dyn DocumentStore>) }
        }));

        sleep(Duration::from_millis(10)).await;
        assert!(!state.is_degraded().await);

        handle.set_offline(true);
        sleep(HEALTH_POLL_INTERVAL + Duration::from_millis(10)).await;
        assert!(state.is_degraded().await);

        handle.set_offline(false);
        sleep(HEALTH_POLL_INTERVAL * 2).await;
        assert!(!state.is_degraded().await);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn reconnecting_from_scratch_drops_cached_entries() {
        let state = AppState::new(AppConfig::default());
        let first = MemoryDocumentStore::new();
        first.seed(Collection::Teams, Document::new("t1", json!({"name": "Alpha"})));
        let second = MemoryDocumentStore::new();
        second.seed(Collection::Teams, Document::new("t1", json!({"name": "Bravo"})));

        let outage = first.clone();
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = connects.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let store = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                first.clone()
            } else {
                second.clone()
            };
            async move { Ok(Arc::new(store) as Arc<dyn DocumentStore>) }
        }));

        sleep(Duration::from_millis(10)).await;
        let teams = resources::teams().read(&state).await.unwrap();
        assert_eq!(teams[0].name, "Alpha");

        outage.set_offline(true);
        sleep(Duration::from_secs(20)).await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert!(!state.is_degraded().await);

        let teams = resources::teams().read(&state).await.unwrap();
        assert_eq!(teams[0].name, "Bravo");
        task.abort();
    }
}
