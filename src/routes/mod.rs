use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod league;
pub mod sse;
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(league::router())
        .merge(users::router())
        .merge(admin::router(state.clone()))
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            document_store::{Collection, Document, memory::MemoryDocumentStore},
            models::SettingsEntity,
        },
        services::{auth::USER_ID_HEADER, mutation::MutationState},
        state::AppState,
    };

    const CODE: &str = "kickoff";

    fn league() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store.seed(Collection::Teams, Document::new("t2", json!({"name": "rovers"})));
        store.seed(Collection::Teams, Document::new("t1", json!({"name": "Athletic"})));
        store.seed(
            Collection::Matches,
            Document::new(
                "m1",
                json!({
                    "team1Id": "t1", "team2Id": "t2",
                    "team1Name": "Athletic", "team2Name": "rovers",
                    "date": "2025-03-01", "location": "North Park",
                    "completed": true, "score1": 2, "score2": 1
                }),
            ),
        );
        store.seed(
            Collection::Users,
            Document::new("boss", json!({"email": "boss@league.test", "role": "admin", "active": true})),
        );
        store.seed(
            Collection::Users,
            Document::new("fan", json!({"email": "fan@league.test", "role": "user", "active": true})),
        );
        store
    }

    async fn app() -> Router<()> {
        let config = AppConfig {
            promotion_code: Some(CODE.into()),
            ..AppConfig::default()
        };
        router(AppState::with_store(config, Arc::new(league())).await)
    }

    async fn send(
        app: Router<()>,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn teams_are_listed_alphabetically() {
        let (status, body) = send(app().await, Method::GET, "/teams", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body["teams"]
            .as_array()
            .unwrap()
            .iter()
            .map(|team| team["name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["Athletic", "rovers"]);
    }

    #[tokio::test]
    async fn match_page_offers_summary_only_to_admins() {
        let (status, body) = send(app().await, Method::GET, "/matches/m1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], "2 - 1");
        assert_eq!(body["showGenerateSummary"], false);

        let (_, body) = send(app().await, Method::GET, "/matches/m1", Some("boss"), None).await;
        assert_eq!(body["showGenerateSummary"], true);

        let (status, _) = send(app().await, Method::GET, "/matches/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn promotion_requires_identity_and_code() {
        let app = app().await;
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/users/me/promote",
            None,
            Some(json!({"code": CODE})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/users/me/promote",
            Some("fan"),
            Some(json!({"code": "KICKOFF"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/users/me/promote",
            Some("fan"),
            Some(json!({"code": CODE})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        let (status, _) = send(
            app,
            Method::PUT,
            "/admin/settings",
            Some("fan"),
            Some(json!({"season": "2025"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_reject_regular_users() {
        let app = app().await;
        let (status, _) = send(
            app.clone(),
            Method::PUT,
            "/admin/settings",
            Some("fan"),
            Some(json!({"season": "2025"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(app.clone(), Method::POST, "/admin/matches/m1/insights", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(app, Method::POST, "/admin/matches/m1/insights", Some("boss"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["relatedId"], "m1");
    }

    #[tokio::test]
    async fn overlapping_settings_update_is_a_conflict() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(league())).await;
        let app = router(state.clone());
        let (release, hold) = tokio::sync::oneshot::channel::<()>();
        let mut progress = state.settings_mutation().subscribe();

        let held = state.clone();
        let running = tokio::spawn(async move {
            held.settings_mutation()
                .run(held.cache(), move || async move {
                    let _ = hold.await;
                    Ok(SettingsEntity::fallback("Held"))
                })
                .await
        });
        progress
            .wait_for(|state| matches!(state, MutationState::Pending))
            .await
            .unwrap();

        let update = json!({"season": "2025"});
        let (status, body) = send(
            app.clone(),
            Method::PUT,
            "/admin/settings",
            Some("boss"),
            Some(update.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("in progress"));

        release.send(()).unwrap();
        running.await.unwrap().unwrap();
        let (status, body) =
            send(app, Method::PUT, "/admin/settings", Some("boss"), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["season"], "2025");
    }

    #[tokio::test]
    async fn reads_fail_with_503_while_degraded() {
        let app = router(AppState::new(AppConfig::default()));
        let (status, body) = send(app.clone(), Method::GET, "/teams", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].is_string());

        let (status, body) = send(app, Method::GET, "/healthcheck", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }
}
