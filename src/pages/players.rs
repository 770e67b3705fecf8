use anyhow::{Context, Result};

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec, Selection};
use crate::query::QueryTemplate;

use super::PageOutput;

pub const PLAYERS: QueryTemplate = QueryTemplate::new(
    "SELECT
        p.player_id,
        p.first_name,
        p.last_name,
        p.position,
        p.status,
        p.eligibility,
        p.height,
        p.weight,
        t.market,
        t.name AS team_name
     FROM players p
     LEFT JOIN teams t ON p.team_id = t.team_id",
    "ORDER BY t.market, t.name, p.last_name, p.first_name",
);

#[derive(Debug, Clone, Default)]
pub struct PlayersSelection {
    pub position: Selection,
    pub status: Selection,
    pub eligibility: Selection,
    pub search: Option<String>,
}

impl FilterSource for PlayersSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new()
            .with(Filter::selected("p.position = ?", &self.position)?)
            .with(Filter::selected("p.status = ?", &self.status)?)
            .with(Filter::selected("p.eligibility = ?", &self.eligibility)?)
            .with(Filter::search(
                "(p.first_name || ' ' || p.last_name LIKE ? OR t.name LIKE ? OR t.market LIKE ?)",
                self.search.as_deref(),
            )?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &PlayersSelection) -> Result<PageOutput> {
    let mut page = PageOutput::new("Players Explorer");
    let players = store
        .run(&PLAYERS.compose(&selection.filter_spec()?))
        .context("Failed to load players")?;
    page.push_section("Players", players);
    Ok(page)
}
