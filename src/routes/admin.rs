//! Admin-only endpoints.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{post, put},
};
use axum_valid::Valid;

use crate::{
    dao::models::InsightEntity,
    dto::{admin::UpdateSettingsRequest, league::SettingsResponse},
    error::AppError,
    services::{
        admin_service,
        auth::{AuthContext, USER_ID_HEADER},
        insights,
    },
    state::SharedState,
};

/// Admin-only league management endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/settings", put(update_settings))
        .route("/admin/matches/{id}/insights", post(generate_insight))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    params(("X-User-Id" = String, Header, description = "Authenticated admin id")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings after the update", body = SettingsResponse),
        (status = 400, description = "Empty or invalid update"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Another settings update is in progress")
    )
)]
/// Merge the given fields into the league settings.
pub async fn update_settings(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateSettingsRequest>>,
) -> Result<Json<SettingsResponse>, AppError> {
    let response =
        admin_service::update_settings(&state, state.settings_mutation(), payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/admin/matches/{id}/insights",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Completed match identifier"),
        ("X-User-Id" = String, Header, description = "Authenticated admin id")
    ),
    responses(
        (status = 200, description = "Stored summary", body = InsightEntity),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Match not completed or summary already in progress"),
        (status = 503, description = "Summary generator unavailable")
    )
)]
/// Generate and store a summary for a completed match.
pub async fn generate_insight(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<InsightEntity>, AppError> {
    let mutation = state.insight_mutation(&id);
    let insight = insights::generate_match_insight(&state, &mutation, &id).await?;
    Ok(Json(insight))
}

/// Reject callers that are not active admins.
async fn require_admin(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let auth = AuthContext::resolve(&state, user_id.as_deref()).await?;
    auth.require_admin()?;
    Ok(next.run(request).await)
}
