//! Endpoints acting on the caller.

use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::admin::{PromotionRequest, PromotionResponse},
    error::AppError,
    services::{auth::AuthContext, promotion},
    state::SharedState,
};

/// Endpoints acting on the calling user.
pub fn router() -> Router<SharedState> {
    Router::new().route("/users/me/promote", post(promote_self))
}

#[utoipa::path(
    post,
    path = "/users/me/promote",
    tag = "users",
    params(("X-User-Id" = String, Header, description = "Authenticated user id")),
    request_body = PromotionRequest,
    responses(
        (status = 200, description = "Caller promoted to admin", body = PromotionResponse),
        (status = 401, description = "Caller not authenticated"),
        (status = 403, description = "Admin limit reached or invalid code"),
        (status = 404, description = "Caller has no account"),
        (status = 409, description = "Promotion already in progress for the caller"),
        (status = 503, description = "Document store unavailable")
    )
)]
/// Promote the caller to admin using the shared promotion code.
pub async fn promote_self(
    State(state): State<SharedState>,
    auth: AuthContext,
    Valid(Json(payload)): Valid<Json<PromotionRequest>>,
) -> Result<Json<PromotionResponse>, AppError> {
    let user_id = auth.require_user()?;
    let mutation = state.promotion_mutation(user_id);
    let response = promotion::promote(&state, &mutation, user_id, &payload.code).await?;
    Ok(Json(response))
}
