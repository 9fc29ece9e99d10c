//! League table computed from completed matches.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::{
    dao::models::{MatchEntity, SettingsEntity, TeamEntity},
    dto::league::StandingRow,
};

/// Points for a win when settings do not say otherwise.
pub const DEFAULT_POINTS_FOR_WIN: u32 = 3;
/// Points for a draw when settings do not say otherwise.
pub const DEFAULT_POINTS_FOR_DRAW: u32 = 1;

/// Points awarded per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRule {
    /// Points for each win.
    pub win: u32,
    /// Points for each draw.
    pub draw: u32,
}

impl Default for PointsRule {
    fn default() -> Self {
        Self {
            win: DEFAULT_POINTS_FOR_WIN,
            draw: DEFAULT_POINTS_FOR_DRAW,
        }
    }
}

impl From<&SettingsEntity> for PointsRule {
    fn from(settings: &SettingsEntity) -> Self {
        Self {
            win: settings.points_for_win.unwrap_or(DEFAULT_POINTS_FOR_WIN),
            draw: settings.points_for_draw.unwrap_or(DEFAULT_POINTS_FOR_DRAW),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    name: String,
    played: u32,
    won: u32,
    drawn: u32,
    lost: u32,
    goals_for: i64,
    goals_against: i64,
}

impl Tally {
    fn record(&mut self, scored: i64, conceded: i64) {
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        let column = match scored.cmp(&conceded) {
            Ordering::Greater => &mut self.won,
            Ordering::Equal => &mut self.drawn,
            Ordering::Less => &mut self.lost,
        };
        *column = column.saturating_add(1);
    }

    /// Saturates instead of overflowing on extreme point rules.
    fn points(&self, rule: PointsRule) -> u32 {
        self.won
            .saturating_mul(rule.win)
            .saturating_add(self.drawn.saturating_mul(rule.draw))
    }
}

/// Build the league table.
///
/// Every team appears, even without a completed match. Rows are ordered by
/// points, goal difference and goals scored, then by name ignoring case.
/// Matches referencing an unknown team still count for it, named after the
/// match document.
pub fn compute(teams: &[TeamEntity], matches: &[MatchEntity], rule: PointsRule) -> Vec<StandingRow> {
    let mut table: IndexMap<String, Tally> = teams
        .iter()
        .map(|team| {
            (
                team.id.clone(),
                Tally {
                    name: team.name.clone(),
                    ..Tally::default()
                },
            )
        })
        .collect();

    for fixture in matches {
        let Some((score1, score2)) = fixture.final_score() else {
            continue;
        };
        table
            .entry(fixture.team1_id.clone())
            .or_insert_with(|| Tally {
                name: fixture.team1_name.clone(),
                ..Tally::default()
            })
            .record(score1, score2);
        table
            .entry(fixture.team2_id.clone())
            .or_insert_with(|| Tally {
                name: fixture.team2_name.clone(),
                ..Tally::default()
            })
            .record(score2, score1);
    }

    let mut rows: Vec<StandingRow> = table
        .into_iter()
        .map(|(team_id, tally)| StandingRow {
            position: 0,
            team_id,
            points: tally.points(rule),
            goal_difference: tally.goals_for.saturating_sub(tally.goals_against),
            team_name: tally.name,
            played: tally.played,
            won: tally.won,
            drawn: tally.drawn,
            lost: tally.lost,
            goals_for: tally.goals_for,
            goals_against: tally.goals_against,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()))
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.position = index + 1;
    }
    rows
}
