use anyhow::{Context, Result};
use rusqlite::types::Value;
use tracing::warn;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec, Selection};
use crate::query::QueryTemplate;

use super::{choices, PageOutput};

pub const TEAMS: QueryTemplate = QueryTemplate::new(
    "SELECT
        t.team_id,
        t.market,
        t.name AS team_name,
        t.alias,
        c.name AS conference,
        d.name AS division,
        v.name AS venue,
        v.city,
        v.state,
        v.capacity
     FROM teams t
     LEFT JOIN conferences c ON t.conference_id = c.conference_id
     LEFT JOIN divisions d   ON t.division_id   = d.division_id
     LEFT JOIN venues v      ON t.venue_id      = v.venue_id",
    "ORDER BY conference, division, market, team_name",
);

pub const ROSTER: QueryTemplate = QueryTemplate::new(
    "SELECT
        p.player_id,
        p.first_name,
        p.last_name,
        p.position,
        p.eligibility,
        p.status,
        p.height,
        p.weight
     FROM players p",
    "ORDER BY p.position, p.last_name, p.first_name",
);

pub const DIVISIONS_LOOKUP: &str = "SELECT name FROM divisions ORDER BY name";

/// Selections on the teams explorer.
#[derive(Debug, Clone, Default)]
pub struct TeamsSelection {
    pub conference: Selection,
    pub division: Selection,
    pub state: Selection,
    pub search: Option<String>,
    /// Team whose roster is listed under the teams table.
    pub roster_team: Option<String>,
}

impl FilterSource for TeamsSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new()
            .with(Filter::selected("c.name = ?", &self.conference)?)
            .with(Filter::selected("d.name = ?", &self.division)?)
            .with(Filter::selected("v.state = ?", &self.state)?)
            .with(Filter::search(
                "(t.name LIKE ? OR t.market LIKE ? OR t.alias LIKE ?)",
                self.search.as_deref(),
            )?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &TeamsSelection) -> Result<PageOutput> {
    let mut page = PageOutput::new("Teams Explorer");

    // Divisions are optional; without the lookup the division filter is dropped.
    let mut selection = selection.clone();
    if !selection.division.is_all() {
        if let Err(e) = choices(store, DIVISIONS_LOOKUP) {
            warn!("Division lookup unavailable, ignoring division filter: {e}");
            page.push_note(format!(
                "Division filter \"{}\" ignored: divisions are unavailable.",
                selection.division
            ));
            selection.division = Selection::All;
        }
    }

    let teams = store
        .run(&TEAMS.compose(&selection.filter_spec()?))
        .context("Failed to load teams")?;

    if teams.is_empty() {
        page.push_section("Teams", teams);
        page.push_note("No teams found with the selected filters.");
        return Ok(page);
    }

    let roster_team = selection.roster_team.as_deref().and_then(|id| {
        let listed = teams
            .column("team_id")
            .iter()
            .any(|v| v.to_string() == id);
        if !listed {
            page.push_note(format!("Team {id} is not in the filtered teams list."));
        }
        listed.then(|| id.to_string())
    });
    page.push_section("Teams", teams);

    if let Some(team_id) = roster_team {
        let filters =
            FilterSpec::new().with(Filter::new("p.team_id = ?", vec![Value::Text(team_id.clone())])?);
        let roster = store
            .run(&ROSTER.compose(&filters))
            .with_context(|| format!("Failed to load roster for team {team_id}"))?;
        page.push_section("Roster", roster);
    }

    Ok(page)
}
