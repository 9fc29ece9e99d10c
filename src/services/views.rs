//! Display projections shared by the league pages.

use indexmap::IndexMap;

use crate::{
    dao::models::{InsightEntity, MatchEntity, PlayoffMatchEntity, TeamEntity},
    dto::league::{
        MatchCard, MatchPageResponse, PlayoffCard, PlayoffRound, PlayoffsResponse, TeamListResponse,
        TeamPageResponse, TeamSummary,
    },
};

const EMPTY_TEAMS_NOTICE: &str = "No teams found";
const UPCOMING_LABEL: &str = "Upcoming Match";
const FINAL_LABEL: &str = "Final Score";
const UNDECIDED_TEAM: &str = "TBD";

/// Sort alphabetically ignoring case; names equal up to case keep a stable order.
pub fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| {
        let (a, b) = (name(a), name(b));
        a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
    });
}

/// Score text and label of a fixture.
pub fn score_line(final_score: Option<(i64, i64)>) -> (String, &'static str) {
    match final_score {
        Some((score1, score2)) => (format!("{score1} - {score2}"), FINAL_LABEL),
        None => ("vs".to_owned(), UPCOMING_LABEL),
    }
}

/// Team list page; teams are expected in display order.
pub fn team_list(teams: &[TeamEntity]) -> TeamListResponse {
    TeamListResponse {
        teams: teams.iter().map(TeamSummary::from).collect(),
        notice: teams.is_empty().then(|| EMPTY_TEAMS_NOTICE.to_owned()),
    }
}

/// Card for one league match.
pub fn match_card(fixture: &MatchEntity) -> MatchCard {
    let (score, label) = score_line(fixture.final_score());
    MatchCard {
        id: fixture.id.clone(),
        team1_id: fixture.team1_id.clone(),
        team1_name: fixture.team1_name.clone(),
        team2_id: fixture.team2_id.clone(),
        team2_name: fixture.team2_name.clone(),
        date: fixture.date.clone(),
        location: fixture.location.clone(),
        completed: fixture.completed,
        score,
        label: label.to_owned(),
    }
}

/// Only admins may ask for a summary, and only once the match is over.
pub fn show_generate_summary(is_admin: bool, fixture: &MatchEntity) -> bool {
    is_admin && fixture.completed
}

/// Match detail page.
pub fn match_page(
    fixture: &MatchEntity,
    insights: Vec<InsightEntity>,
    is_admin: bool,
) -> MatchPageResponse {
    MatchPageResponse {
        card: match_card(fixture),
        insights,
        show_generate_summary: show_generate_summary(is_admin, fixture),
    }
}

/// Team detail page.
pub fn team_page(team: &TeamEntity, fixtures: &[MatchEntity]) -> TeamPageResponse {
    TeamPageResponse {
        id: team.id.clone(),
        name: team.name.clone(),
        logo_url: team.logo_url.clone(),
        players: team.players.clone(),
        matches: fixtures
            .iter()
            .filter(|fixture| fixture.involves(&team.id))
            .map(match_card)
            .collect(),
    }
}

/// Group playoff fixtures by round, keeping the order they arrive in.
pub fn playoff_bracket(fixtures: &[PlayoffMatchEntity]) -> PlayoffsResponse {
    let mut rounds: IndexMap<u32, Vec<PlayoffCard>> = IndexMap::new();
    for fixture in fixtures {
        let final_score = if fixture.completed {
            fixture.score1.zip(fixture.score2)
        } else {
            None
        };
        let (score, label) = score_line(final_score);
        rounds.entry(fixture.round).or_default().push(PlayoffCard {
            id: fixture.id.clone(),
            match_number: fixture.match_number,
            team1_name: side_name(fixture.team1_name.as_deref()),
            team2_name: side_name(fixture.team2_name.as_deref()),
            completed: fixture.completed,
            score,
            label: label.to_owned(),
        });
    }

    PlayoffsResponse {
        rounds: rounds
            .into_iter()
            .map(|(round, matches)| PlayoffRound { round, matches })
            .collect(),
    }
}

fn side_name(name: Option<&str>) -> String {
    name.filter(|name| !name.trim().is_empty())
        .unwrap_or(UNDECIDED_TEAM)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn team(name: &str) -> TeamEntity {
        TeamEntity {
            id: name.to_lowercase(),
            name: name.into(),
            logo_url: None,
            players: Vec::new(),
        }
    }

    #[test]
    fn names_sort_without_regard_to_case() {
        let mut teams = vec![team("Bravo"), team("alpha")];
        sort_by_name(&mut teams, |team| team.name.as_str());
        let names: Vec<_> = teams.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Bravo"]);
    }

    #[test]
    fn empty_team_list_carries_notice() {
        assert_eq!(team_list(&[]).notice.as_deref(), Some("No teams found"));
        assert!(team_list(&[team("alpha")]).notice.is_none());
    }

    #[test]
    fn upcoming_match_renders_vs() {
        let card = match_card(&fixture(false, None));
        assert_eq!(card.score, "vs");
        assert_eq!(card.label, "Upcoming Match");
    }

    #[test]
    fn completed_match_renders_final_score() {
        let card = match_card(&fixture(true, Some((2, 1))));
        assert_eq!(card.score, "2 - 1");
        assert_eq!(card.label, "Final Score");
    }

    #[test]
    fn generate_summary_needs_admin_and_completed_match() {
        let done = fixture(true, Some((0, 0)));
        let pending = fixture(false, None);
        assert!(show_generate_summary(true, &done));
        assert!(!show_generate_summary(false, &done));
        assert!(!show_generate_summary(true, &pending));

        let page = match_page(&pending, Vec::new(), true);
        assert!(page.insights.is_empty());
        assert!(!page.show_generate_summary);
    }

    #[test]
    fn playoff_rounds_group_and_fill_undecided_sides() {
        let entry = |id: &str, round: u32, number: u32, team1: Option<&str>| PlayoffMatchEntity {
            id: id.into(),
            round,
            match_number: number,
            team1_id: team1.map(str::to_lowercase),
            team2_id: None,
            team1_name: team1.map(str::to_owned),
            team2_name: None,
            completed: false,
            score1: None,
            score2: None,
        };
        let bracket = playoff_bracket(&[
            entry("p1", 1, 1, Some("Rovers")),
            entry("p2", 1, 2, Some("United")),
            entry("p3", 2, 1, None),
        ]);

        assert_eq!(bracket.rounds.len(), 2);
        assert_eq!(bracket.rounds[0].matches.len(), 2);
        assert_eq!(bracket.rounds[1].matches[0].team1_name, "TBD");
        assert_eq!(bracket.rounds[0].matches[0].score, "vs");
    }
}
