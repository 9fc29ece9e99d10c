pub mod promotion;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, RwLock, watch};

use crate::{
    cache::QueryCache,
    config::AppConfig,
    dao::{
        document_store::DocumentStore,
        models::{InsightEntity, SettingsEntity},
    },
    dto::admin::PromotionResponse,
    error::ServiceError,
    services::{
        admin_service::SETTINGS_INVALIDATES,
        insights::{INSIGHT_INVALIDATES, InsightGenerator, TemplateInsightGenerator},
        mutation::Mutation,
        promotion::PROMOTION_INVALIDATES,
    },
};

/// Reference-counted handle to the application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Central application state holding the store handle, the read cache and collaborators.
pub struct AppState {
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    cache: QueryCache,
    config: AppConfig,
    insight_generator: Arc<dyn InsightGenerator>,
    degraded: watch::Sender<bool>,
    promotion_gate: Mutex<()>,
    settings_mutation: Mutation<SettingsEntity>,
    insight_mutations: DashMap<String, Arc<Mutation<InsightEntity>>>,
    promotion_mutations: DashMap<String, Arc<Mutation<PromotionResponse>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_generator(config, Arc::new(TemplateInsightGenerator))
    }

    /// Same as [`AppState::new`] with a custom insight generator.
    pub fn with_generator(
        config: AppConfig,
        insight_generator: Arc<dyn InsightGenerator>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            cache: QueryCache::new(config.cache.clone()),
            config,
            insight_generator,
            degraded: degraded_tx,
            promotion_gate: Mutex::new(()),
            settings_mutation: Mutation::new("update settings", SETTINGS_INVALIDATES),
            insight_mutations: DashMap::new(),
            promotion_mutations: DashMap::new(),
        })
    }

    /// Build a state with the store already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> SharedState {
        let state = Self::new(config);
        state.set_store(store).await;
        state
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Shared read cache.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Collaborator producing match summaries.
    pub fn insight_generator(&self) -> Arc<dyn InsightGenerator> {
        self.insight_generator.clone()
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if self.store.read().await.is_none() {
            return true;
        }
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Serialize promotions inside this process.
    pub async fn promotion_gate(&self) -> MutexGuard<'_, ()> {
        self.promotion_gate.lock().await
    }

    /// The league settings update shared by every request.
    pub fn settings_mutation(&self) -> &Mutation<SettingsEntity> {
        &self.settings_mutation
    }

    /// Summary generation for one match, created on first use.
    pub fn insight_mutation(&self, match_id: &str) -> Arc<Mutation<InsightEntity>> {
        let entry = self
            .insight_mutations
            .entry(match_id.to_owned())
            .or_insert_with(|| Arc::new(Mutation::new("generate match insight", INSIGHT_INVALIDATES)));
        Arc::clone(entry.value())
    }

    /// Admin promotion of one user, created on first use.
    pub fn promotion_mutation(&self, user_id: &str) -> Arc<Mutation<PromotionResponse>> {
        let entry = self
            .promotion_mutations
            .entry(user_id.to_owned())
            .or_insert_with(|| Arc::new(Mutation::new("promote to admin", PROMOTION_INVALIDATES)));
        Arc::clone(entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document_store::memory::MemoryDocumentStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state.set_store(Arc::new(MemoryDocumentStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.update_degraded(true).await;
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn mutation_handles_are_kept_per_target() {
        let state = AppState::new(AppConfig::default());
        assert!(Arc::ptr_eq(&state.insight_mutation("m1"), &state.insight_mutation("m1")));
        assert!(!Arc::ptr_eq(&state.insight_mutation("m1"), &state.insight_mutation("m2")));
        assert!(Arc::ptr_eq(
            &state.promotion_mutation("fan"),
            &state.promotion_mutation("fan")
        ));

        let err = state
            .settings_mutation()
            .run(state.cache(), || async { Err(ServiceError::Degraded) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert!(matches!(
            state.settings_mutation().state(),
            crate::services::mutation::MutationState::Error(_)
        ));
    }
}
