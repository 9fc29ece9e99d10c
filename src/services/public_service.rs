//! Service helpers assembling the public league pages from resource hooks.

use crate::{
    dao::models::InsightEntity,
    dto::league::{
        MatchCard, MatchPageResponse, PlayoffsResponse, SettingsResponse, StandingsResponse,
        TeamListResponse, TeamPageResponse,
    },
    error::ServiceError,
    services::{
        auth::AuthContext,
        resources,
        standings::{self, PointsRule},
        views,
    },
    state::SharedState,
};

/// League settings, or defaults when none are stored.
pub async fn get_settings(state: &SharedState) -> Result<SettingsResponse, ServiceError> {
    let settings = resources::settings(&state.config().default_league_name)
        .read(state)
        .await?;
    Ok(SettingsResponse::from(settings.as_ref()))
}

/// Alphabetical team list.
pub async fn get_teams(state: &SharedState) -> Result<TeamListResponse, ServiceError> {
    let teams = resources::teams().read(state).await?;
    Ok(views::team_list(&teams))
}

/// Team detail with its fixtures.
pub async fn get_team(state: &SharedState, team_id: &str) -> Result<TeamPageResponse, ServiceError> {
    let team = resources::team(team_id).read(state).await?;
    let fixtures = resources::team_matches(team_id).read(state).await?;
    Ok(views::team_page(&team, &fixtures))
}

/// Every fixture, by date.
pub async fn get_matches(state: &SharedState) -> Result<Vec<MatchCard>, ServiceError> {
    let fixtures = resources::matches().read(state).await?;
    Ok(fixtures.iter().map(views::match_card).collect())
}

/// Match detail with its insights and the caller's summary control.
pub async fn get_match(
    state: &SharedState,
    auth: &AuthContext,
    match_id: &str,
) -> Result<MatchPageResponse, ServiceError> {
    let fixture = resources::match_detail(match_id).read(state).await?;
    let insights: Vec<InsightEntity> = resources::match_insights(match_id)
        .read(state)
        .await?
        .as_ref()
        .clone();
    Ok(views::match_page(&fixture, insights, auth.is_admin))
}

/// League table under the stored points rule.
pub async fn get_standings(state: &SharedState) -> Result<StandingsResponse, ServiceError> {
    let settings = resources::settings(&state.config().default_league_name)
        .read(state)
        .await?;
    let teams = resources::teams().read(state).await?;
    let fixtures = resources::matches().read(state).await?;

    Ok(StandingsResponse {
        league_name: settings.league_name.clone(),
        season: settings.season.clone(),
        rows: standings::compute(&teams, &fixtures, PointsRule::from(settings.as_ref())),
    })
}

/// Playoff bracket grouped by round.
pub async fn get_playoffs(state: &SharedState) -> Result<PlayoffsResponse, ServiceError> {
    let fixtures = resources::playoff_matches().read(state).await?;
    Ok(views::playoff_bracket(&fixtures))
}
