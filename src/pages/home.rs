use anyhow::{Context, Result};
use rusqlite::types::Value;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterSpec};
use crate::query::QueryTemplate;

use super::PageOutput;

pub const TEAMS: QueryTemplate = QueryTemplate::new(
    "SELECT
        t.team_id,
        t.market,
        t.name AS team_name,
        t.alias,
        c.name AS conference,
        d.name AS division
     FROM teams t
     LEFT JOIN conferences c ON t.conference_id = c.conference_id
     LEFT JOIN divisions d   ON t.division_id   = d.division_id",
    "ORDER BY c.name, d.name, t.market, t.name",
);

pub const PLAYERS: QueryTemplate = QueryTemplate::new(
    "SELECT
        p.player_id,
        p.first_name,
        p.last_name,
        p.position,
        p.status,
        p.eligibility,
        t.market,
        t.name AS team_name
     FROM players p
     LEFT JOIN teams t ON p.team_id = t.team_id",
    "ORDER BY t.market, t.name, p.last_name, p.first_name",
);

pub const SEASONS: QueryTemplate = QueryTemplate::new(
    "SELECT season_id, year, status, type_code, start_date, end_date
     FROM seasons",
    "ORDER BY year DESC",
);

/// Roster status code of players currently on a team.
pub const ACTIVE_STATUS: &str = "ACT";

/// Teams overview, active players and the seasons summary.
pub fn render(store: &dyn RelationalStore) -> Result<PageOutput> {
    let mut page = PageOutput::new("Home Dashboard");

    let teams = store
        .run(&TEAMS.compose(&FilterSpec::new()))
        .context("Failed to load teams overview")?;
    page.push_section("Teams & Conferences", teams);

    let active = FilterSpec::new().with(Filter::new(
        "p.status = ?",
        vec![Value::Text(ACTIVE_STATUS.to_string())],
    )?);
    let players = store
        .run(&PLAYERS.compose(&active))
        .context("Failed to load active players")?;
    page.push_section("Active Players", players);

    let seasons = store
        .run(&SEASONS.compose(&FilterSpec::new()))
        .context("Failed to load seasons")?;
    page.push_section("Seasons", seasons);

    Ok(page)
}
