use anyhow::{bail, ensure, Context, Result};
use rusqlite::types::Value;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec, Selection};
use crate::query::QueryTemplate;

use super::PageOutput;

pub const RANKINGS: QueryTemplate = QueryTemplate::new(
    "SELECT
        r.week,
        r.effective_time,
        t.market,
        t.name AS team_name,
        r.rank,
        r.points,
        r.fp_votes,
        r.wins,
        r.losses,
        r.ties
     FROM rankings r
     JOIN teams t ON r.team_id = t.team_id",
    "ORDER BY r.week, r.rank",
);

pub const SEASON_YEARS: QueryTemplate =
    QueryTemplate::new("SELECT season_id, year FROM seasons", "ORDER BY year DESC");

/// The AP poll ranks 25 teams.
pub const MIN_RANK: i64 = 1;
pub const MAX_RANK: i64 = 25;

#[derive(Debug, Clone)]
pub struct RankingsSelection {
    /// Season year; the latest season when unset.
    pub year: Option<i64>,
    pub week: Selection,
    pub min_rank: i64,
    pub max_rank: i64,
    pub team: Option<String>,
}

impl Default for RankingsSelection {
    fn default() -> Self {
        RankingsSelection {
            year: None,
            week: Selection::All,
            min_rank: MIN_RANK,
            max_rank: MAX_RANK,
            team: None,
        }
    }
}

impl RankingsSelection {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_RANK..=MAX_RANK).contains(&self.min_rank),
            "Min rank must be between {MIN_RANK} and {MAX_RANK}, got {}",
            self.min_rank
        );
        ensure!(
            (self.min_rank..=MAX_RANK).contains(&self.max_rank),
            "Max rank must be between {} and {MAX_RANK}, got {}",
            self.min_rank,
            self.max_rank
        );
        Ok(())
    }
}

/// Filters that follow the season restriction.
impl FilterSource for RankingsSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new()
            .with(Filter::new(
                "r.rank BETWEEN ? AND ?",
                vec![Value::Integer(self.min_rank), Value::Integer(self.max_rank)],
            )?)
            .with(Filter::selected_integer("r.week = ?", &self.week)?)
            .with(Filter::search(
                "(t.name LIKE ? OR t.market LIKE ?)",
                self.team.as_deref(),
            )?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &RankingsSelection) -> Result<PageOutput> {
    selection.validate()?;
    let mut page = PageOutput::new("Rankings - AP Poll");

    let seasons = store
        .run(&SEASON_YEARS.compose(&FilterSpec::new()))
        .context("Failed to load seasons")?;
    if seasons.is_empty() {
        page.push_note("No seasons found - cannot show rankings.");
        return Ok(page);
    }

    let row = match selection.year {
        Some(year) => match seasons
            .column("year")
            .iter()
            .position(|v| v.as_i64() == Some(year))
        {
            Some(i) => i,
            None => bail!("No season found for year {year}"),
        },
        None => 0,
    };
    let season_id = seasons
        .get(row, "season_id")
        .context("Seasons lookup returned no season_id column")?;
    let year = seasons
        .get(row, "year")
        .map(|v| v.to_string())
        .unwrap_or_default();

    let filters = FilterSpec::new()
        .with(Filter::new("r.season_id = ?", vec![Value::from(season_id)])?)
        .chain(selection.filter_spec()?);

    let rankings = store
        .run(&RANKINGS.compose(&filters))
        .with_context(|| format!("Failed to load rankings for {year}"))?;
    page.push_section(format!("AP Poll {year}"), rankings);
    Ok(page)
}
