//! Public league pages.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::league::{
        MatchCard, MatchPageResponse, PlayoffsResponse, SettingsResponse, StandingsResponse,
        TeamListResponse, TeamPageResponse,
    },
    error::AppError,
    services::{auth::AuthContext, public_service},
    state::SharedState,
};

/// Public read-only league pages.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/teams", get(get_teams))
        .route("/teams/{id}", get(get_team))
        .route("/matches", get(get_matches))
        .route("/matches/{id}", get(get_match))
        .route("/standings", get(get_standings))
        .route("/playoffs", get(get_playoffs))
}

#[utoipa::path(
    get,
    path = "/settings",
    tag = "league",
    responses(
        (status = 200, description = "League settings", body = SettingsResponse),
        (status = 503, description = "Document store unavailable")
    )
)]
/// Return the league settings, or defaults when none are stored.
pub async fn get_settings(
    State(state): State<SharedState>,
) -> Result<Json<SettingsResponse>, AppError> {
    Ok(Json(public_service::get_settings(&state).await?))
}

#[utoipa::path(
    get,
    path = "/teams",
    tag = "league",
    responses(
        (status = 200, description = "Teams sorted by name", body = TeamListResponse),
        (status = 503, description = "Document store unavailable")
    )
)]
/// Return every team in alphabetical order.
pub async fn get_teams(State(state): State<SharedState>) -> Result<Json<TeamListResponse>, AppError> {
    Ok(Json(public_service::get_teams(&state).await?))
}

#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "league",
    params(("id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team with roster and fixtures", body = TeamPageResponse),
        (status = 404, description = "Unknown team")
    )
)]
/// Return one team with its players and fixtures.
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<TeamPageResponse>, AppError> {
    Ok(Json(public_service::get_team(&state, &id).await?))
}

#[utoipa::path(
    get,
    path = "/matches",
    tag = "league",
    responses((status = 200, description = "Fixtures by date", body = [MatchCard]))
)]
/// Return every fixture ordered by date.
pub async fn get_matches(State(state): State<SharedState>) -> Result<Json<Vec<MatchCard>>, AppError> {
    Ok(Json(public_service::get_matches(&state).await?))
}

#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "league",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = Option<String>, Header, description = "Authenticated user id")
    ),
    responses(
        (status = 200, description = "Match with its insights", body = MatchPageResponse),
        (status = 404, description = "Unknown match")
    )
)]
/// Return a match with its stored insights.
///
/// Admin callers also learn whether a summary can be generated.
pub async fn get_match(
    State(state): State<SharedState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<MatchPageResponse>, AppError> {
    Ok(Json(public_service::get_match(&state, &auth, &id).await?))
}

#[utoipa::path(
    get,
    path = "/standings",
    tag = "league",
    responses((status = 200, description = "League table", body = StandingsResponse))
)]
/// Return the league table computed from completed matches.
pub async fn get_standings(
    State(state): State<SharedState>,
) -> Result<Json<StandingsResponse>, AppError> {
    Ok(Json(public_service::get_standings(&state).await?))
}

#[utoipa::path(
    get,
    path = "/playoffs",
    tag = "league",
    responses((status = 200, description = "Playoff bracket", body = PlayoffsResponse))
)]
/// Return the playoff bracket.
pub async fn get_playoffs(
    State(state): State<SharedState>,
) -> Result<Json<PlayoffsResponse>, AppError> {
    Ok(Json(public_service::get_playoffs(&state).await?))
}
