use anyhow::{Context, Result};

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec};
use crate::query::QueryTemplate;

use super::PageOutput;

pub const COACHES: QueryTemplate = QueryTemplate::new(
    "SELECT
        c.coach_id,
        c.full_name,
        c.position,
        t.market,
        t.name AS team_name,
        t.alias
     FROM coaches c
     LEFT JOIN teams t ON c.team_id = t.team_id",
    "ORDER BY c.full_name",
);

#[derive(Debug, Clone, Default)]
pub struct CoachesSelection {
    pub search: Option<String>,
}

impl FilterSource for CoachesSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new().with(Filter::search(
            "(c.full_name LIKE ? OR t.name LIKE ? OR t.market LIKE ?)",
            self.search.as_deref(),
        )?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &CoachesSelection) -> Result<PageOutput> {
    let mut page = PageOutput::new("Coaches");
    let coaches = store
        .run(&COACHES.compose(&selection.filter_spec()?))
        .context("Failed to load coaches")?;
    page.push_section("Coaches", coaches);
    Ok(page)
}
