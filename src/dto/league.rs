//! Read-side views of teams, fixtures, standings and the bracket.

use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    dao::models::{InsightEntity, PlayerEntity, SettingsEntity, TeamEntity},
    services::standings::{DEFAULT_POINTS_FOR_DRAW, DEFAULT_POINTS_FOR_WIN},
};

/// Team entry of the public team list.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    /// Team id.
    pub id: String,
    /// Club name.
    pub name: String,
    /// Badge image location.
    pub logo_url: Option<String>,
}

impl From<&TeamEntity> for TeamSummary {
    fn from(team: &TeamEntity) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            logo_url: team.logo_url.clone(),
        }
    }
}

/// Alphabetical team list; `notice` is set when there are no teams.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamListResponse {
    /// Teams sorted by name.
    pub teams: Vec<TeamSummary>,
    /// Shown instead of an empty list.
    pub notice: Option<String>,
}

/// Display-ready projection of a league match.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchCard {
    /// Match id.
    pub id: String,
    /// Home team id.
    pub team1_id: String,
    /// Home team name.
    pub team1_name: String,
    /// Away team id.
    pub team2_id: String,
    /// Away team name.
    pub team2_name: String,
    /// Kick-off date.
    pub date: String,
    /// Venue.
    pub location: String,
    /// Whether the match was played.
    pub completed: bool,
    /// `"2 - 1"` once completed, `"vs"` before.
    pub score: String,
    /// `"Final Score"` or `"Upcoming Match"`.
    pub label: String,
}

/// Team detail page: roster plus every fixture of the team.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPageResponse {
    /// Team id.
    pub id: String,
    /// Club name.
    pub name: String,
    /// Badge image location.
    pub logo_url: Option<String>,
    /// Roster.
    pub players: Vec<PlayerEntity>,
    /// Fixtures involving the team, by date.
    pub matches: Vec<MatchCard>,
}

/// Match detail page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchPageResponse {
    /// The fixture.
    #[serde(flatten)]
    pub card: MatchCard,
    /// Stored summaries, newest first.
    pub insights: Vec<InsightEntity>,
    /// Whether the caller may request a generated summary.
    pub show_generate_summary: bool,
}

/// One line of the league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    /// 1-based rank.
    pub position: usize,
    /// Team id.
    pub team_id: String,
    /// Club name.
    pub team_name: String,
    /// Completed matches.
    pub played: u32,
    /// Wins.
    pub won: u32,
    /// Draws.
    pub drawn: u32,
    /// Losses.
    pub lost: u32,
    /// Goals scored.
    pub goals_for: i64,
    /// Goals conceded.
    pub goals_against: i64,
    /// Scored minus conceded.
    pub goal_difference: i64,
    /// Table points under the current rule.
    pub points: u32,
}

/// League table with the settings it was computed under.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    /// League title.
    pub league_name: String,
    /// Season label.
    pub season: Option<String>,
    /// Table rows, ranked.
    pub rows: Vec<StandingRow>,
}

/// Display-ready playoff fixture; undecided sides read `"TBD"`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffCard {
    /// Fixture id.
    pub id: String,
    /// Slot within the round.
    pub match_number: u32,
    /// First team, or `"TBD"`.
    pub team1_name: String,
    /// Second team, or `"TBD"`.
    pub team2_name: String,
    /// Whether the tie was played.
    pub completed: bool,
    /// `"2 - 1"` once completed, `"vs"` before.
    pub score: String,
    /// `"Final Score"` or `"Upcoming Match"`.
    pub label: String,
}

/// Playoff fixtures of one round.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffRound {
    /// Round number.
    pub round: u32,
    /// Ties in slot order.
    pub matches: Vec<PlayoffCard>,
}

/// Playoff bracket, rounds ascending.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayoffsResponse {
    /// Rounds in order.
    pub rounds: Vec<PlayoffRound>,
}

/// Public league settings.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    /// League title.
    pub league_name: String,
    /// Season label.
    pub season: Option<String>,
    /// Effective points per win.
    pub points_for_win: u32,
    /// Effective points per draw.
    pub points_for_draw: u32,
}

impl From<&SettingsEntity> for SettingsResponse {
    fn from(settings: &SettingsEntity) -> Self {
        Self {
            league_name: settings.league_name.clone(),
            season: settings.season.clone(),
            points_for_win: settings.points_for_win.unwrap_or(DEFAULT_POINTS_FOR_WIN),
            points_for_draw: settings.points_for_draw.unwrap_or(DEFAULT_POINTS_FOR_DRAW),
        }
    }
}
