//! Fixed aggregate reports. Grouping happens in SQL; each report is a
//! template composed with an empty filter specification, except top-5
//! consistency which binds its rank cutoff.

use anyhow::{Context, Result};
use rusqlite::types::Value;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterSpec};
use crate::query::QueryTemplate;

use super::PageOutput;

/// Rank at or above which a week counts toward top-5 consistency.
pub const TOP_RANK_CUTOFF: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Top5Consistency,
    AvgPointsPerSeason,
    FirstPlaceVotes,
    MultiSeasonPlayers,
    PositionDistribution,
    HomeVsAway,
    MostUsedVenues,
    RankVsPerformance,
}

impl Report {
    pub const ALL: [Report; 8] = [
        Report::Top5Consistency,
        Report::AvgPointsPerSeason,
        Report::FirstPlaceVotes,
        Report::MultiSeasonPlayers,
        Report::PositionDistribution,
        Report::HomeVsAway,
        Report::MostUsedVenues,
        Report::RankVsPerformance,
    ];

    /// Accepts the slug or the report's position in the menu (1-8).
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if let Ok(n) = s.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        Self::ALL.iter().copied().find(|r| r.slug() == s)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Report::Top5Consistency => "top5-consistency",
            Report::AvgPointsPerSeason => "avg-points",
            Report::FirstPlaceVotes => "first-place-votes",
            Report::MultiSeasonPlayers => "multi-season-players",
            Report::PositionDistribution => "position-distribution",
            Report::HomeVsAway => "home-vs-away",
            Report::MostUsedVenues => "most-used-venues",
            Report::RankVsPerformance => "rank-vs-performance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Report::Top5Consistency => "Teams Maintaining Top 5 Rankings Across Seasons",
            Report::AvgPointsPerSeason => "Average Ranking Points per Team by Season",
            Report::FirstPlaceVotes => "First-Place Votes by Team Across All Weeks",
            Report::MultiSeasonPlayers => "Players Appearing in Multiple Seasons",
            Report::PositionDistribution => "Player Position Distribution Across Teams",
            Report::HomeVsAway => "Home vs Away Games Per Team",
            Report::MostUsedVenues => "Most Used Venues",
            Report::RankVsPerformance => "Ranking Improvement vs Game Performance",
        }
    }

    pub fn template(&self) -> QueryTemplate {
        match self {
            Report::Top5Consistency => QueryTemplate::new(
                "SELECT
                    r.team_id,
                    t.name AS team_name,
                    r.season_id,
                    s.year,
                    COUNT(*) AS top5_weeks
                 FROM rankings r
                 JOIN teams t ON r.team_id = t.team_id
                 JOIN seasons s ON r.season_id = s.season_id",
                "GROUP BY r.team_id, r.season_id
                 ORDER BY top5_weeks DESC",
            ),
            Report::AvgPointsPerSeason => QueryTemplate::new(
                "SELECT
                    r.team_id,
                    t.name AS team_name,
                    s.year,
                    AVG(r.points) AS avg_points
                 FROM rankings r
                 JOIN teams t ON r.team_id = t.team_id
                 JOIN seasons s ON r.season_id = s.season_id",
                "GROUP BY r.team_id, s.year
                 ORDER BY avg_points DESC",
            ),
            Report::FirstPlaceVotes => QueryTemplate::new(
                "SELECT
                    t.name AS team_name,
                    SUM(r.fp_votes) AS total_fp_votes
                 FROM rankings r
                 JOIN teams t ON r.team_id = t.team_id",
                "GROUP BY t.name
                 HAVING SUM(r.fp_votes) > 0
                 ORDER BY total_fp_votes DESC",
            ),
            Report::MultiSeasonPlayers => QueryTemplate::new(
                "SELECT
                    p.player_id,
                    p.first_name,
                    p.last_name,
                    COUNT(DISTINCT ps.season_id) AS seasons_played
                 FROM player_statistics ps
                 JOIN players p ON ps.player_id = p.player_id",
                "GROUP BY p.player_id
                 HAVING COUNT(DISTINCT ps.season_id) > 1
                 ORDER BY seasons_played DESC",
            ),
            Report::PositionDistribution => QueryTemplate::new(
                "SELECT
                    p.position,
                    t.name AS team_name,
                    COUNT(*) AS player_count
                 FROM players p
                 JOIN teams t ON p.team_id = t.team_id",
                "GROUP BY p.position, t.name
                 ORDER BY p.position",
            ),
            Report::HomeVsAway => QueryTemplate::new(
                "SELECT
                    team_id,
                    team_name,
                    SUM(CASE WHEN is_home = 1 THEN 1 ELSE 0 END) AS home_games,
                    SUM(CASE WHEN is_home = 0 THEN 1 ELSE 0 END) AS away_games
                 FROM team_game_counts",
                "GROUP BY team_id, team_name
                 ORDER BY home_games DESC",
            ),
            Report::MostUsedVenues => {
                QueryTemplate::new("SELECT * FROM most_used_venues", "ORDER BY games_hosted DESC")
            }
            Report::RankVsPerformance => QueryTemplate::new(
                "SELECT
                    r.team_id,
                    t.name AS team_name,
                    r.week,
                    r.rank,
                    gs.points_scored
                 FROM rankings r
                 JOIN teams t ON r.team_id = t.team_id
                 LEFT JOIN game_scores gs
                    ON gs.team_id = r.team_id
                    AND gs.season_id = r.season_id
                    AND gs.week = r.week",
                "ORDER BY r.team_id, r.week",
            ),
        }
    }

    fn filters(&self) -> Result<FilterSpec> {
        Ok(match self {
            Report::Top5Consistency => FilterSpec::new().with(Filter::new(
                "r.rank <= ?",
                vec![Value::Integer(TOP_RANK_CUTOFF)],
            )?),
            _ => FilterSpec::new(),
        })
    }

    fn empty_note(&self) -> &'static str {
        match self {
            Report::HomeVsAway => "No data in team_game_counts.",
            Report::MostUsedVenues => "No data in most_used_venues.",
            Report::RankVsPerformance => "No ranking or game data available.",
            _ => "No data for this report.",
        }
    }
}

pub fn render(store: &dyn RelationalStore, report: Report) -> Result<PageOutput> {
    let mut page = PageOutput::new(report.title());
    let table = store
        .run(&report.template().compose(&report.filters()?))
        .with_context(|| format!("Failed to run report {}", report.slug()))?;
    if table.is_empty() {
        page.push_note(report.empty_note());
    }
    page.push_section(report.title(), table);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::RecordingStore;

    #[test]
    fn report_lookup_by_slug_or_number() {
        assert_eq!(Report::from_str("home-vs-away"), Some(Report::HomeVsAway));
        assert_eq!(Report::from_str("1"), Some(Report::Top5Consistency));
        assert_eq!(Report::from_str("8"), Some(Report::RankVsPerformance));
        assert_eq!(Report::from_str("0"), None);
        assert_eq!(Report::from_str("9"), None);
        assert_eq!(Report::from_str("nope"), None);
    }

    #[test]
    fn top5_binds_cutoff_before_group_by() {
        let store = RecordingStore::new();
        render(&store, Report::Top5Consistency).unwrap();
        let (sql, params) = store.statements().remove(0);
        assert!(sql.contains("WHERE r.rank <= ? GROUP BY r.team_id, r.season_id"));
        assert_eq!(params, vec![Value::Integer(5)]);
    }

    #[test]
    fn every_report_has_matching_placeholders() {
        for report in Report::ALL {
            let q = report.template().compose(&report.filters().unwrap());
            assert_eq!(q.placeholder_count(), q.params.len(), "{}", report.slug());
        }
    }

    #[test]
    fn empty_report_gets_a_note() {
        let store = RecordingStore::new();
        let page = render(&store, Report::HomeVsAway).unwrap();
        assert_eq!(page.notes, vec!["No data in team_game_counts.".to_string()]);
        assert_eq!(page.sections.len(), 1);
    }
}
