use anyhow::{Context, Result};
use rusqlite::types::Value;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSource, FilterSpec, Selection};
use crate::query::QueryTemplate;

use super::home::SEASONS;
use super::rankings::RANKINGS;
use super::PageOutput;

pub const WEEKS: QueryTemplate =
    QueryTemplate::new("SELECT DISTINCT week FROM rankings", "ORDER BY week");

#[derive(Debug, Clone, Default)]
pub struct SeasonsSelection {
    pub year: Selection,
    pub status: Selection,
    /// Season to show rankings for; the first filtered season when unset.
    /// Must be one of the filtered seasons.
    pub season_id: Option<String>,
    pub week: Selection,
}

impl FilterSource for SeasonsSelection {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec::new()
            .with(Filter::selected_integer("year = ?", &self.year)?)
            .with(Filter::selected("status = ?", &self.status)?))
    }
}

pub fn render(store: &dyn RelationalStore, selection: &SeasonsSelection) -> Result<PageOutput> {
    let mut page = PageOutput::new("Season & Rankings Viewer");

    let all = store
        .run(&SEASONS.compose(&FilterSpec::new()))
        .context("Failed to load seasons")?;
    let no_seasons = all.is_empty();
    page.push_section("Seasons", all);
    if no_seasons {
        page.push_note("No seasons found in the database.");
        return Ok(page);
    }

    let filtered = store
        .run(&SEASONS.compose(&selection.filter_spec()?))
        .context("Failed to load filtered seasons")?;

    let row = match &selection.season_id {
        Some(id) => {
            let listed = filtered
                .column("season_id")
                .iter()
                .position(|v| v.to_string() == *id);
            if listed.is_none() {
                page.push_note(format!("Season {id} is not in the filtered seasons list."));
            }
            listed
        }
        None => {
            if filtered.is_empty() {
                page.push_note("No seasons match the selected filters.");
            }
            (!filtered.is_empty()).then_some(0)
        }
    };
    let chosen = row.and_then(|i| {
        let id = filtered.get(i, "season_id")?;
        let year = filtered.get(i, "year").map(|v| v.to_string()).unwrap_or_default();
        let kind = filtered
            .get(i, "type_code")
            .map(|v| v.to_string())
            .unwrap_or_default();
        Some((Value::from(id), format!("{year} ({kind})")))
    });
    page.push_section("Filtered Seasons", filtered);

    let Some((season_id, label)) = chosen else {
        return Ok(page);
    };

    let in_season = FilterSpec::new().with(Filter::new("season_id = ?", vec![season_id.clone()])?);
    let weeks = store
        .run(&WEEKS.compose(&in_season))
        .context("Failed to load ranking weeks")?;
    if weeks.is_empty() {
        page.push_note("No rankings for this season.");
        return Ok(page);
    }

    let filters = FilterSpec::new()
        .with(Filter::new("r.season_id = ?", vec![season_id.clone()])?)
        .with(Filter::selected_integer("r.week = ?", &selection.week)?);
    let rankings = store
        .run(&RANKINGS.compose(&filters))
        .with_context(|| format!("Failed to load rankings for {label}"))?;
    page.push_section(format!("Rankings {label}"), rankings);

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Scalar;
    use crate::pages::testing::{table, text, vtext, RecordingStore};

    fn seasons() -> crate::db::models::ResultTable {
        table(
            &["season_id", "year", "status", "type_code"],
            vec![vec![text("s2024"), Scalar::Integer(2024), text("closed"), text("REG")]],
        )
    }

    #[test]
    fn empty_database_stops_after_seasons() {
        let store = RecordingStore::new();
        let page = render(&store, &SeasonsSelection::default()).unwrap();
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.notes, vec!["No seasons found in the database.".to_string()]);
        assert_eq!(store.statements().len(), 1);
    }

    #[test]
    fn year_filter_binds_an_integer() {
        let store = RecordingStore::new().answer("FROM seasons", seasons());
        let selection = SeasonsSelection {
            year: "2024".into(),
            status: "closed".into(),
            ..Default::default()
        };
        render(&store, &selection).unwrap();

        let filtered = &store.statements()[1];
        assert!(filtered.0.contains("WHERE year = ? AND status = ? ORDER BY year DESC"));
        assert_eq!(filtered.1, vec![Value::Integer(2024), vtext("closed")]);
    }

    #[test]
    fn season_without_weeks_is_a_note() {
        let store = RecordingStore::new().answer("FROM seasons", seasons());
        let page = render(&store, &SeasonsSelection::default()).unwrap();
        assert_eq!(page.notes, vec!["No rankings for this season.".to_string()]);
        let (sql, params) = store.find("SELECT DISTINCT week").unwrap();
        assert!(sql.ends_with("WHERE season_id = ? ORDER BY week"));
        assert_eq!(params, vec![vtext("s2024")]);
        assert!(store.find("FROM rankings r").is_none());
    }

    #[test]
    fn explicit_season_must_be_listed() {
        let store = RecordingStore::new().answer("FROM seasons", seasons());
        let selection = SeasonsSelection {
            season_id: Some("s1999".into()),
            ..Default::default()
        };
        let page = render(&store, &selection).unwrap();
        assert_eq!(
            page.notes,
            vec!["Season s1999 is not in the filtered seasons list.".to_string()]
        );
        assert!(store.find("SELECT DISTINCT week").is_none());
        assert!(store.find("FROM rankings r").is_none());
    }

    #[test]
    fn explicit_listed_season_is_labelled_from_its_row() {
        let store = RecordingStore::new()
            .answer("FROM seasons", seasons())
            .answer("SELECT DISTINCT week", table(&["week"], vec![vec![Scalar::Integer(1)]]));
        let selection = SeasonsSelection {
            season_id: Some("s2024".into()),
            ..Default::default()
        };
        let page = render(&store, &selection).unwrap();
        assert!(page.section("Rankings 2024 (REG)").is_some());
        assert!(page.notes.is_empty());
    }

    #[test]
    fn rankings_for_first_filtered_season() {
        let store = RecordingStore::new()
            .answer("FROM seasons", seasons())
            .answer("SELECT DISTINCT week", table(&["week"], vec![vec![Scalar::Integer(1)]]));
        let selection = SeasonsSelection {
            week: "1".into(),
            ..Default::default()
        };
        let page = render(&store, &selection).unwrap();

        assert!(page.section("Rankings 2024 (REG)").is_some());
        let (sql, params) = store.find("FROM rankings r").unwrap();
        assert!(sql.contains("WHERE r.season_id = ? AND r.week = ?"));
        assert_eq!(params, vec![vtext("s2024"), Value::Integer(1)]);
    }
}
