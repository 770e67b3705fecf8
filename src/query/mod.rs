pub mod filters;

use rusqlite::types::Value;
use tracing::debug;

use filters::{count_placeholders, FilterSpec};

/// SQL text plus the parameters bound to its placeholders, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ComposedQuery {
    /// A query with no bound parameters.
    pub fn fixed(sql: impl Into<String>) -> Self {
        ComposedQuery {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }
}

/// A page's fixed SELECT (columns and joins, no WHERE) and its ORDER BY.
#[derive(Debug, Clone, Copy)]
pub struct QueryTemplate {
    pub base: &'static str,
    pub order_by: &'static str,
}

impl QueryTemplate {
    pub const fn new(base: &'static str, order_by: &'static str) -> Self {
        QueryTemplate { base, order_by }
    }

    pub fn compose(&self, filters: &FilterSpec) -> ComposedQuery {
        compose(self.base, self.order_by, filters)
    }
}

/// Build the final statement from a base SELECT, an ORDER BY clause and the
/// filters. Only active filters contribute, in the order given; with none
/// active the statement carries no WHERE at all.
pub fn compose(base: &str, order_by: &str, filters: &FilterSpec) -> ComposedQuery {
    let mut predicates: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    for filter in filters.iter().filter(|f| f.is_active()) {
        predicates.push(filter.template());
        params.extend(filter.values().iter().cloned());
    }

    let mut sql = base.trim_end().to_string();
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    let order_by = order_by.trim();
    if !order_by.is_empty() {
        sql.push(' ');
        sql.push_str(order_by);
    }

    debug!(
        predicates = predicates.len(),
        params = params.len(),
        "composed query"
    );

    ComposedQuery { sql, params }
}

#[cfg(test)]
mod tests {
    use super::filters::{Filter, FilterSpec, Selection};
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn position_filter_scenario() {
        let filters = FilterSpec::new()
            .with(Filter::selected("status = ?", &Selection::All).unwrap())
            .with(Filter::selected("position = ?", &"QB".into()).unwrap());
        let q = compose("SELECT * FROM players", "ORDER BY last_name", &filters);
        assert_eq!(q.sql, "SELECT * FROM players WHERE position = ? ORDER BY last_name");
        assert_eq!(q.params, vec![text("QB")]);
    }

    #[test]
    fn all_inactive_has_no_where() {
        let filters = FilterSpec::new()
            .with(Filter::selected("status = ?", &Selection::All).unwrap())
            .with(Filter::selected("position = ?", &Selection::All).unwrap())
            .with(Filter::search("(first_name LIKE ?)", None).unwrap());
        let q = compose("SELECT * FROM players", "ORDER BY last_name", &filters);
        assert_eq!(q.sql, "SELECT * FROM players ORDER BY last_name");
        assert!(q.params.is_empty());
        assert!(!q.sql.contains("WHERE"));
    }

    #[test]
    fn empty_spec_has_no_where() {
        let q = compose("SELECT * FROM venues", "", &FilterSpec::new());
        assert_eq!(q.sql, "SELECT * FROM venues");
        assert!(q.params.is_empty());
    }

    #[test]
    fn three_column_search_binds_three_wrapped_terms() {
        let filters = FilterSpec::new().with(
            Filter::search("(name LIKE ? OR market LIKE ? OR alias LIKE ?)", Some("Tide")).unwrap(),
        );
        let q = compose("SELECT * FROM teams", "ORDER BY name", &filters);
        assert_eq!(
            q.sql,
            "SELECT * FROM teams WHERE (name LIKE ? OR market LIKE ? OR alias LIKE ?) ORDER BY name"
        );
        assert_eq!(q.params, vec![text("%Tide%"); 3]);
    }

    #[test]
    fn k_active_filters_give_k_minus_one_ands() {
        let filters = FilterSpec::new()
            .with(Filter::selected("a = ?", &"1".into()).unwrap())
            .with(Filter::selected("b = ?", &Selection::All).unwrap())
            .with(Filter::new("c BETWEEN ? AND ?", vec![Value::Integer(1), Value::Integer(5)]).unwrap())
            .with(Filter::search("(d LIKE ? OR e LIKE ?)", Some("x")).unwrap());
        let q = compose("SELECT * FROM t", "ORDER BY a", &filters);

        let where_clause = q
            .sql
            .split(" WHERE ")
            .nth(1)
            .and_then(|rest| rest.split(" ORDER BY ").next())
            .unwrap();
        // the BETWEEN predicate carries its own AND
        assert_eq!(where_clause.matches(" AND ").count(), (3 - 1) + 1);
        assert_eq!(q.params.len(), 1 + 2 + 2);
        assert_eq!(q.placeholder_count(), q.params.len());
    }

    #[test]
    fn params_follow_placeholder_order() {
        let filters = FilterSpec::new()
            .with(Filter::selected("state = ?", &"AL".into()).unwrap())
            .with(Filter::new("rank BETWEEN ? AND ?", vec![Value::Integer(3), Value::Integer(9)]).unwrap())
            .with(Filter::selected("roof_type = ?", &"dome".into()).unwrap());
        let q = compose("SELECT * FROM v", "", &filters);
        assert_eq!(
            q.sql,
            "SELECT * FROM v WHERE state = ? AND rank BETWEEN ? AND ? AND roof_type = ?"
        );
        assert_eq!(
            q.params,
            vec![text("AL"), Value::Integer(3), Value::Integer(9), text("dome")]
        );
    }

    #[test]
    fn compose_is_idempotent() {
        let filters = FilterSpec::new()
            .with(Filter::selected("position = ?", &"WR".into()).unwrap())
            .with(Filter::search("(name LIKE ?)", Some("Smith")).unwrap());
        let a = compose("SELECT * FROM players", "ORDER BY last_name", &filters);
        let b = compose("SELECT * FROM players", "ORDER BY last_name", &filters);
        assert_eq!(a, b);
    }

    #[test]
    fn injection_text_stays_in_params() {
        let hostile = "' OR '1'='1";
        let filters = FilterSpec::new()
            .with(Filter::selected("position = ?", &hostile.into()).unwrap())
            .with(Filter::search("(name LIKE ? OR market LIKE ?)", Some(hostile)).unwrap());
        let q = compose("SELECT * FROM players", "ORDER BY last_name", &filters);
        assert_eq!(
            q.sql,
            "SELECT * FROM players WHERE position = ? AND (name LIKE ? OR market LIKE ?) ORDER BY last_name"
        );
        assert!(!q.sql.contains("'1'='1"));
        assert_eq!(q.params[0], text(hostile));
        assert_eq!(q.params[1], text("%' OR '1'='1%"));
    }

    #[test]
    fn multiline_base_is_trimmed_before_where() {
        let template = QueryTemplate::new(
            "
            SELECT venue_id, name
            FROM venues
            ",
            "ORDER BY name",
        );
        let q = template.compose(&FilterSpec::new().with(Filter::selected("state = ?", &"TX".into()).unwrap()));
        assert!(q.sql.ends_with("FROM venues WHERE state = ? ORDER BY name"));
    }
}
