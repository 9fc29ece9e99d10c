//! Read hooks binding each league resource to a cache key and a store fetch.
//!
//! A [`Hook`] is built per call and resolved against the shared state, either
//! awaiting the value ([`Hook::read`]) or taking a non-blocking snapshot
//! ([`Hook::observe`]).

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    cache::{CacheKey, QueryState, ResourceType},
    dao::{
        document_store::{DocumentStore, Query, SortOrder},
        models::{
            Entity, InsightEntity, InsightKind, MatchEntity, PlayoffMatchEntity, SETTINGS_ID,
            SettingsEntity, TeamEntity, UserEntity,
        },
        storage::{Degraded, StorageError, StorageResult},
    },
    services::views,
    state::AppState,
};

type Fetch<T> =
    Arc<dyn Fn(Arc<dyn DocumentStore>) -> BoxFuture<'static, StorageResult<T>> + Send + Sync>;

/// One resource read: a cache key plus the store fetch that fills it.
pub struct Hook<T> {
    key: CacheKey,
    fetch: Fetch<T>,
}

impl<T: Send + Sync + 'static> Hook<T> {
    fn new<F>(key: CacheKey, fetch: F) -> Self
    where
        F: Fn(Arc<dyn DocumentStore>) -> BoxFuture<'static, StorageResult<T>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            key,
            fetch: Arc::new(fetch),
        }
    }

    /// Cache key this hook reads.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Resolve the resource, waiting for a fetch when nothing is cached.
    pub async fn read(&self, state: &AppState) -> StorageResult<Arc<T>> {
        let store = state.store().await.ok_or_else(degraded)?;
        let fetch = self.fetch.clone();
        state
            .cache()
            .read(self.key.clone(), move || fetch(store.clone()))
            .await
    }

    /// Snapshot of the resource without waiting.
    pub async fn observe(&self, state: &AppState) -> QueryState<Arc<T>> {
        let Some(store) = state.store().await else {
            return QueryState::Error(degraded());
        };
        let fetch = self.fetch.clone();
        state
            .cache()
            .observe(self.key.clone(), move || fetch(store.clone()))
    }
}

fn degraded() -> StorageError {
    StorageError::unavailable("no document store installed", Degraded("degraded mode"))
}

fn get_entity<E: Entity>(store: &dyn DocumentStore, id: &str) -> BoxFuture<'static, StorageResult<E>> {
    let pending = store.get(E::COLLECTION, id);
    Box::pin(async move { E::from_document(pending.await?) })
}

fn query_entities<E: Entity>(
    store: &dyn DocumentStore,
    query: Query,
) -> BoxFuture<'static, StorageResult<Vec<E>>> {
    let pending = store.query(E::COLLECTION, query);
    Box::pin(async move {
        pending
            .await?
            .into_iter()
            .map(E::from_document)
            .collect()
    })
}

/// Every team, sorted alphabetically without regard to case.
pub fn teams() -> Hook<Vec<TeamEntity>> {
    Hook::new(CacheKey::all(ResourceType::Teams), |store| {
        let pending = query_entities::<TeamEntity>(store.as_ref(), Query::all());
        Box::pin(async move {
            let mut teams = pending.await?;
            views::sort_by_name(&mut teams, |team| team.name.as_str());
            Ok(teams)
        })
    })
}

/// A single team.
pub fn team(id: &str) -> Hook<TeamEntity> {
    let id = id.to_owned();
    Hook::new(CacheKey::with_params(ResourceType::Teams, &id), move |store| {
        get_entity(store.as_ref(), &id)
    })
}

/// Every match, ordered by date.
pub fn matches() -> Hook<Vec<MatchEntity>> {
    Hook::new(CacheKey::all(ResourceType::Matches), |store| {
        query_entities(
            store.as_ref(),
            Query::all().order_by("date", SortOrder::Ascending),
        )
    })
}

/// Matches where `team_id` plays on either side, ordered by date.
pub fn team_matches(team_id: &str) -> Hook<Vec<MatchEntity>> {
    let team_id = team_id.to_owned();
    Hook::new(
        CacheKey::with_params(ResourceType::Matches, &("team", &team_id)),
        move |store| {
            let by_date = Query::all().order_by("date", SortOrder::Ascending);
            let home = query_entities::<MatchEntity>(
                store.as_ref(),
                by_date.clone().where_eq("team1Id", team_id.as_str()),
            );
            let away = query_entities::<MatchEntity>(
                store.as_ref(),
                by_date.where_eq("team2Id", team_id.as_str()),
            );
            Box::pin(async move {
                let mut all = home.await?;
                all.extend(
                    away.await?
                        .into_iter()
                        .filter(|fixture| fixture.team1_id != fixture.team2_id),
                );
                all.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
                Ok(all)
            })
        },
    )
}

/// A single match.
pub fn match_detail(id: &str) -> Hook<MatchEntity> {
    let id = id.to_owned();
    Hook::new(CacheKey::with_params(ResourceType::Matches, &id), move |store| {
        get_entity(store.as_ref(), &id)
    })
}

/// League settings; a missing document yields defaults named `default_name`.
pub fn settings(default_name: &str) -> Hook<SettingsEntity> {
    let default_name = default_name.to_owned();
    Hook::new(CacheKey::all(ResourceType::Settings), move |store| {
        let pending = get_entity::<SettingsEntity>(store.as_ref(), SETTINGS_ID);
        let default_name = default_name.clone();
        Box::pin(async move {
            match pending.await {
                Err(StorageError::NotFound { .. }) => Ok(SettingsEntity::fallback(default_name)),
                other => other,
            }
        })
    })
}

/// Insights generated for a match, oldest first. Empty when none exist.
pub fn match_insights(match_id: &str) -> Hook<Vec<InsightEntity>> {
    let match_id = match_id.to_owned();
    Hook::new(
        CacheKey::with_params(ResourceType::Insights, &("match", &match_id)),
        move |store| {
            let pending = query_entities::<InsightEntity>(
                store.as_ref(),
                Query::all()
                    .where_eq("type", "match")
                    .where_eq("relatedId", match_id.as_str())
                    .order_by("createdAt", SortOrder::Ascending),
            );
            Box::pin(async move {
                let mut insights = pending.await?;
                insights.retain(|insight| insight.kind == InsightKind::Match);
                Ok(insights)
            })
        },
    )
}

/// Playoff bracket ordered by round, then match number.
pub fn playoff_matches() -> Hook<Vec<PlayoffMatchEntity>> {
    Hook::new(CacheKey::all(ResourceType::PlayoffMatches), |store| {
        query_entities(
            store.as_ref(),
            Query::all()
                .order_by("round", SortOrder::Ascending)
                .order_by("matchNumber", SortOrder::Ascending),
        )
    })
}

/// A single user account.
pub fn user(id: &str) -> Hook<UserEntity> {
    let id = id.to_owned();
    Hook::new(CacheKey::with_params(ResourceType::Users, &id), move |store| {
        get_entity(store.as_ref(), &id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::document_store::{Collection, Document, memory::MemoryDocumentStore},
        state::SharedState,
    };
    use serde_json::json;

    async fn seeded() -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        store.seed(Collection::Teams, Document::new("t1", json!({"name": "Bravo"})));
        store.seed(Collection::Teams, Document::new("t2", json!({"name": "alpha"})));
        for (id, home, away, date) in [
            ("m2", "t2", "t1", "2024-05-02"),
            ("m1", "t1", "t2", "2024-05-01"),
            ("m3", "t2", "t3", "2024-05-03"),
        ] {
            store.seed(
                Collection::Matches,
                Document::new(
                    id,
                    json!({
                        "team1Id": home, "team2Id": away,
                        "team1Name": home, "team2Name": away,
                        "date": date, "location": "Field", "completed": false
                    }),
                ),
            );
        }
        let state = AppState::with_store(AppConfig::default(), Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn teams_are_sorted_case_insensitively() {
        let (state, _) = seeded().await;
        let teams = teams().read(&state).await.unwrap();
        let names: Vec<_> = teams.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Bravo"]);
    }

    #[tokio::test]
    async fn team_matches_cover_both_sides_in_date_order() {
        let (state, _) = seeded().await;
        let fixtures = team_matches("t1").read(&state).await.unwrap();
        let ids: Vec<_> = fixtures.iter().map(|fixture| fixture.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn missing_settings_fall_back_to_default_name() {
        let (state, _) = seeded().await;
        let settings = settings("Sunday League").read(&state).await.unwrap();
        assert_eq!(settings.league_name, "Sunday League");
        assert_eq!(settings.id, SETTINGS_ID);
    }

    #[tokio::test]
    async fn insights_for_unknown_match_are_empty() {
        let (state, _) = seeded().await;
        let insights = match_insights("m1").read(&state).await.unwrap();
        assert!(insights.is_empty());
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let (state, store) = seeded().await;
        matches().read(&state).await.unwrap();
        matches().read(&state).await.unwrap();
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn observe_reports_loading_then_success() {
        let (state, _) = seeded().await;
        let hook = team("t1");
        assert!(hook.observe(&state).await.is_loading());
        hook.read(&state).await.unwrap();
        let snapshot = hook.observe(&state).await;
        assert_eq!(snapshot.data().map(|team| team.name.as_str()), Some("Bravo"));
    }

    #[tokio::test]
    async fn missing_team_is_an_error_state() {
        let (state, _) = seeded().await;
        let err = team("nope").read(&state).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(matches!(
            team("nope").observe(&state).await,
            QueryState::Error(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn degraded_state_reports_unavailable() {
        let state = AppState::new(AppConfig::default());
        let err = teams().read(&state).await.unwrap_err();
        assert!(err.is_transient());
    }
}
