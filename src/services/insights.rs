//! Match summaries: the generation collaborator and the mutation storing its output.

use futures::future::BoxFuture;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;
use uuid::Uuid;

use crate::{
    cache::ResourceType,
    dao::models::{Entity, InsightEntity, InsightKind, MatchEntity},
    error::ServiceError,
    services::{mutation::Mutation, resources},
    state::SharedState,
};

/// Resources a stored insight makes stale.
pub const INSIGHT_INVALIDATES: &[ResourceType] = &[ResourceType::Insights];

/// Errors raised while producing a summary.
#[derive(Debug, Error)]
pub enum InsightError {
    /// The generator could not be reached.
    #[cfg(feature = "http-insights")]
    #[error("insight generator request failed")]
    Request(#[from] reqwest::Error),
    /// The generator answered with a non-success status.
    #[error("insight generator answered {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// The generator returned no text.
    #[error("insight generator returned an empty summary")]
    Empty,
}

impl From<InsightError> for ServiceError {
    fn from(err: InsightError) -> Self {
        ServiceError::Collaborator(err.to_string())
    }
}

/// Produces a short text summary of a completed match.
pub trait InsightGenerator: Send + Sync {
    /// Summarize `fixture`.
    fn generate(&self, fixture: &MatchEntity) -> BoxFuture<'static, Result<String, InsightError>>;
}

/// Deterministic summary built from the score alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInsightGenerator;

impl InsightGenerator for TemplateInsightGenerator {
    fn generate(&self, fixture: &MatchEntity) -> BoxFuture<'static, Result<String, InsightError>> {
        let summary = template_summary(fixture);
        Box::pin(async move { summary })
    }
}

fn template_summary(fixture: &MatchEntity) -> Result<String, InsightError> {
    let (score1, score2) = fixture.final_score().ok_or(InsightError::Empty)?;
    let venue = if fixture.location.trim().is_empty() {
        String::new()
    } else {
        format!(" at {}", fixture.location)
    };
    let verdict = match score1.cmp(&score2) {
        std::cmp::Ordering::Greater => format!(
            "{} beat {} {}-{}{}.",
            fixture.team1_name, fixture.team2_name, score1, score2, venue
        ),
        std::cmp::Ordering::Less => format!(
            "{} beat {} {}-{}{}.",
            fixture.team2_name, fixture.team1_name, score2, score1, venue
        ),
        std::cmp::Ordering::Equal => format!(
            "{} and {} drew {}-{}{}.",
            fixture.team1_name, fixture.team2_name, score1, score2, venue
        ),
    };
    let goals = score1.saturating_add(score2);
    let tempo = match goals {
        0 => "A tight defensive battle with no goals.",
        1..=2 => "A closely contested game.",
        _ => "An open game with plenty of chances.",
    };
    Ok(format!("{verdict} {tempo}"))
}

#[cfg(feature = "http-insights")]
pub use self::http::HttpInsightGenerator;

#[cfg(feature = "http-insights")]
mod http {
    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde::Deserialize;

    use super::{InsightError, InsightGenerator};
    use crate::dao::models::MatchEntity;

    const GENERATOR_URL_ENV: &str = "INSIGHT_GENERATOR_URL";

    #[derive(Deserialize)]
    struct GeneratedInsight {
        content: String,
    }

    /// Generator backed by a remote service receiving the match as JSON.
    #[derive(Clone)]
    pub struct HttpInsightGenerator {
        client: Client,
        url: String,
    }

    impl HttpInsightGenerator {
        /// Generator posting to `url`.
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                client: Client::new(),
                url: url.into(),
            }
        }

        /// Generator configured by `INSIGHT_GENERATOR_URL`, if set.
        pub fn from_env() -> Option<Self> {
            std::env::var(GENERATOR_URL_ENV)
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(Self::new)
        }
    }

    impl InsightGenerator for HttpInsightGenerator {
        fn generate(
            &self,
            fixture: &MatchEntity,
        ) -> BoxFuture<'static, Result<String, InsightError>> {
            let request = self.client.post(&self.url).json(fixture);
            Box::pin(async move {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(InsightError::Status {
                        status: status.as_u16(),
                    });
                }
                let body: GeneratedInsight = response.json().await?;
                let content = body.content.trim().to_owned();
                if content.is_empty() {
                    return Err(InsightError::Empty);
                }
                Ok(content)
            })
        }
    }
}

/// Generate and store a summary for a completed match.
///
/// The match must exist and be completed. On success every cached insight
/// list is invalidated.
pub async fn generate_match_insight(
    state: &SharedState,
    mutation: &Mutation<InsightEntity>,
    match_id: &str,
) -> Result<InsightEntity, ServiceError> {
    mutation
        .run(state.cache(), || async {
            let store = state.require_store().await?;
            let fixture = resources::match_detail(match_id).read(state).await?;
            if !fixture.completed {
                return Err(ServiceError::InvalidState(format!(
                    "match `{match_id}` is not completed yet"
                )));
            }

            let content = state.insight_generator().generate(&fixture).await?;
            let created_at = OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .map_err(|err| ServiceError::InvalidState(format!("clock: {err}")))?;
            let insight = InsightEntity {
                id: Uuid::new_v4().to_string(),
                kind: InsightKind::Match,
                related_id: fixture.id.clone(),
                content,
                created_at,
            };
            store
                .insert(InsightEntity::COLLECTION, insight.to_document())
                .await?;
            info!(match_id, insight_id = %insight.id, "match insight stored");
            Ok(insight)
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::document_store::{Collection, Document, DocumentStore, Query, memory::MemoryDocumentStore},
        services::mutation::MutationState,
        state::AppState,
    };

    fn fixture(completed: bool, score: Option<(i64, i64)>) -> MatchEntity {
        MatchEntity {
            id: "m1".into(),
            team1_id: "t1".into(),
            team2_id: "t2".into(),
            team1_name: "Rovers".into(),
            team2_name: "United".into(),
            date: "2024-05-01".into(),
            location: "North Field".into(),
            completed,
            score1: score.map(|(a, _)| a),
            score2: score.map(|(_, b)| b),
        }
    }

    async fn state_with(fixture: &MatchEntity) -> (SharedState, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        store.seed(Collection::Matches, fixture.to_document());
        store.seed(Collection::Teams, Document::new("t1", json!({"name": "Rovers"})));
        let state = AppState::with_store(AppConfig::default(), Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn template_names_the_winner() {
        let summary = TemplateInsightGenerator
            .generate(&fixture(true, Some((1, 3))))
            .await
            .unwrap();
        assert!(summary.starts_with("United beat Rovers 3-1 at North Field."));
    }

    #[tokio::test]
    async fn template_handles_extreme_scores() {
        let summary = TemplateInsightGenerator
            .generate(&fixture(true, Some((i64::MAX, 1))))
            .await
            .unwrap();
        assert!(summary.ends_with("An open game with plenty of chances."));
    }

    #[tokio::test]
    async fn template_requires_final_score() {
        let err = TemplateInsightGenerator
            .generate(&fixture(false, None))
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::Empty));
    }

    #[tokio::test]
    async fn stored_insight_invalidates_cached_lists() {
        let completed = fixture(true, Some((2, 2)));
        let (state, _) = state_with(&completed).await;
        let before = resources::match_insights("m1").read(&state).await.unwrap();
        assert!(before.is_empty());

        let mutation = Mutation::new("generate insight", INSIGHT_INVALIDATES);
        let insight = generate_match_insight(&state, &mutation, "m1").await.unwrap();
        assert_eq!(insight.related_id, "m1");
        assert!(matches!(mutation.state(), MutationState::Success(_)));

        let after = resources::match_insights("m1").read(&state).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].content, insight.content);
    }

    #[tokio::test]
    async fn upcoming_match_is_rejected() {
        let (state, store) = state_with(&fixture(false, None)).await;
        let mutation = Mutation::new("generate insight", INSIGHT_INVALIDATES);
        let err = generate_match_insight(&state, &mutation, "m1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let stored = store
            .query(Collection::Insights, Query::all())
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let (state, _) = state_with(&fixture(true, Some((1, 0)))).await;
        let mutation = Mutation::new("generate insight", INSIGHT_INVALIDATES);
        let err = generate_match_insight(&state, &mutation, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
