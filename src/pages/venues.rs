use anyhow::{Context, Result};

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec, Selection};
use crate::query::QueryTemplate;

use super::PageOutput;

pub const VENUES: QueryTemplate = QueryTemplate::new(
    "SELECT
        venue_id,
        name,
        city,
        state,
        country,
        capacity,
        surface,
        roof_type,
        latitude,
        longitude
     FROM venues",
    "ORDER BY state, city, name",
);

#[derive(Debug, Clone, Default)]
pub struct VenuesSelection {
    pub state: Selection,
    pub roof_type: Selection,
}

impl FilterSource for VenuesSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new()
            .with(Filter::selected("state = ?", &self.state)?)
            .with(Filter::selected("roof_type = ?", &self.roof_type)?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &VenuesSelection) -> Result<PageOutput> {
    let mut page = PageOutput::new("Venue Directory");
    let venues = store
        .run(&VENUES.compose(&selection.filter_spec()?))
        .context("Failed to load venues")?;
    page.push_section("Venues", venues);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{vtext, RecordingStore};

    #[test]
    fn roof_type_alone_binds_one_value() {
        let store = RecordingStore::new();
        let selection = VenuesSelection {
            state: "all".into(),
            roof_type: "dome".into(),
        };
        render(&store, &selection).unwrap();

        let (sql, params) = store.statements().remove(0);
        assert!(sql.ends_with("FROM venues WHERE roof_type = ? ORDER BY state, city, name"));
        assert_eq!(params, vec![vtext("dome")]);
    }
}
