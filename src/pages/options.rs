use anyhow::{Context, Result};
use rusqlite::types::Value;
use serde::Serialize;
use tracing::warn;

use crate::db::RelationalStore;
use crate::query::filters::{Filter, FilterError, FilterSpec, ALL};
use crate::query::{ComposedQuery, QueryTemplate};

use super::distinct_values;
use super::teams::DIVISIONS_LOOKUP;

/// Weeks ranked in one season.
pub const RANKING_WEEKS: QueryTemplate = QueryTemplate::new(
    "SELECT DISTINCT r.week
     FROM rankings r
     JOIN seasons s ON r.season_id = s.season_id",
    "ORDER BY r.week",
);

/// Choice list for one filter field. Every entry is a value the matching
/// subcommand flag accepts.
#[derive(Debug, Clone, Serialize)]
pub struct FieldOptions {
    pub field: &'static str,
    pub choices: Vec<String>,
}

/// Pages that take filter selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPage {
    Teams,
    Players,
    Seasons,
    /// Week choices belong to `year`, or to the latest season when unset.
    Rankings { year: Option<i64> },
    Venues,
}

struct Lookup {
    field: &'static str,
    query: ComposedQuery,
    /// Failure degrades to just `All` instead of failing the page.
    optional: bool,
    /// Offer the `All` sentinel ahead of the values.
    with_all: bool,
}

impl Lookup {
    fn new(field: &'static str, sql: &'static str) -> Self {
        Lookup {
            field,
            query: ComposedQuery::fixed(sql),
            optional: false,
            with_all: true,
        }
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn values_only(mut self) -> Self {
        self.with_all = false;
        self
    }
}

impl FilterPage {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "teams" => Some(FilterPage::Teams),
            "players" => Some(FilterPage::Players),
            "seasons" => Some(FilterPage::Seasons),
            "rankings" => Some(FilterPage::Rankings { year: None }),
            "venues" => Some(FilterPage::Venues),
            _ => None,
        }
    }

    fn lookups(&self) -> Result<Vec<Lookup>, FilterError> {
        Ok(match self {
            FilterPage::Teams => vec![
                Lookup::new("conference", "SELECT name FROM conferences ORDER BY name"),
                Lookup::new("division", DIVISIONS_LOOKUP).optional(),
                Lookup::new("state", "SELECT DISTINCT state FROM venues ORDER BY state"),
            ],
            FilterPage::Players => vec![
                Lookup::new("position", "SELECT DISTINCT position FROM players ORDER BY position"),
                Lookup::new("status", "SELECT DISTINCT status FROM players ORDER BY status"),
                Lookup::new(
                    "eligibility",
                    "SELECT DISTINCT eligibility FROM players ORDER BY eligibility",
                ),
            ],
            FilterPage::Seasons => vec![
                Lookup::new("year", "SELECT DISTINCT year FROM seasons ORDER BY year DESC"),
                Lookup::new("status", "SELECT DISTINCT status FROM seasons ORDER BY status"),
            ],
            FilterPage::Rankings { year } => {
                let season = match year {
                    Some(y) => Filter::new("s.year = ?", vec![Value::Integer(*y)])?,
                    None => Filter::new("s.year = (SELECT MAX(year) FROM seasons)", vec![])?,
                };
                // the rankings page always shows one season, so no `All` year
                vec![
                    Lookup::new("year", "SELECT DISTINCT year FROM seasons ORDER BY year DESC")
                        .values_only(),
                    Lookup {
                        field: "week",
                        query: RANKING_WEEKS.compose(&FilterSpec::new().with(season)),
                        optional: false,
                        with_all: true,
                    },
                ]
            }
            FilterPage::Venues => vec![
                Lookup::new("state", "SELECT DISTINCT state FROM venues ORDER BY state"),
                Lookup::new(
                    "roof_type",
                    "SELECT DISTINCT roof_type FROM venues ORDER BY roof_type",
                ),
            ],
        })
    }
}

/// Read the choice lists for every filter field of `page`. An optional
/// lookup that fails degrades to just `All`.
pub fn filter_options(store: &dyn RelationalStore, page: FilterPage) -> Result<Vec<FieldOptions>> {
    let mut out = Vec::new();
    for lookup in page.lookups()? {
        let values = match distinct_values(store, &lookup.query) {
            Ok(v) => v,
            Err(e) if lookup.optional => {
                warn!("Optional lookup for {} failed: {e}", lookup.field);
                Vec::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to load {} options", lookup.field))
            }
        };
        let mut choices = Vec::with_capacity(values.len() + 1);
        if lookup.with_all {
            choices.push(ALL.to_string());
        }
        choices.extend(values);
        out.push(FieldOptions {
            field: lookup.field,
            choices,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Scalar;
    use crate::pages::testing::{table, text, RecordingStore};

    #[test]
    fn choices_start_with_all_and_skip_nulls() {
        let store = RecordingStore::new().answer(
            "FROM venues",
            table(&["state"], vec![vec![Scalar::Null], vec![text("AL")], vec![text("TX")]]),
        );
        let opts = filter_options(&store, FilterPage::Venues).unwrap();
        assert_eq!(opts[0].field, "state");
        assert_eq!(opts[0].choices, vec!["All", "AL", "TX"]);
    }

    #[test]
    fn optional_division_lookup_degrades() {
        let store = RecordingStore::new().fail_on("FROM divisions");
        let opts = filter_options(&store, FilterPage::Teams).unwrap();
        let division = opts.iter().find(|o| o.field == "division").unwrap();
        assert_eq!(division.choices, vec!["All"]);
    }

    #[test]
    fn required_lookup_failure_propagates() {
        let store = RecordingStore::new().fail_on("FROM conferences");
        assert!(filter_options(&store, FilterPage::Teams).is_err());
    }

    #[test]
    fn rankings_years_have_no_all_choice() {
        let store = RecordingStore::new().answer(
            "FROM seasons ORDER BY year DESC",
            table(&["year"], vec![vec![Scalar::Integer(2024)], vec![Scalar::Integer(2023)]]),
        );
        let opts = filter_options(&store, FilterPage::Rankings { year: None }).unwrap();
        assert_eq!(opts[0].field, "year");
        assert_eq!(opts[0].choices, vec!["2024", "2023"]);
    }

    #[test]
    fn ranking_weeks_follow_the_chosen_season() {
        let store = RecordingStore::new();
        filter_options(&store, FilterPage::Rankings { year: Some(2023) }).unwrap();
        let (sql, params) = store.find("SELECT DISTINCT r.week").unwrap();
        assert!(sql.ends_with("WHERE s.year = ? ORDER BY r.week"));
        assert_eq!(params, vec![Value::Integer(2023)]);

        let store = RecordingStore::new();
        filter_options(&store, FilterPage::Rankings { year: None }).unwrap();
        let (sql, params) = store.find("SELECT DISTINCT r.week").unwrap();
        assert!(sql.contains("WHERE s.year = (SELECT MAX(year) FROM seasons)"));
        assert!(params.is_empty());
    }
}
