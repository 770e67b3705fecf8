use rusqlite::types::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label of the "no restriction" choice offered for every filter field.
pub const ALL: &str = "All";

/// A user's choice for one filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v.as_str()),
        }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        value.map(Selection::from).unwrap_or_default()
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
            Selection::All
        } else {
            Selection::Only(trimmed.to_string())
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::from(value.to_string())
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Selection::from(s))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("predicate `{template}` has {placeholders} placeholder(s) but {values} value(s)")]
    PlaceholderMismatch {
        template: String,
        placeholders: usize,
        values: usize,
    },
    #[error("`{value}` is not a whole number")]
    NotInteger { value: String },
}

/// One optional predicate: SQL fragment, the values bound to its `?`s, and
/// whether the caller actually selected it.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    template: String,
    values: Vec<Value>,
    active: bool,
}

impl Filter {
    /// An always-active filter.
    pub fn new(template: impl Into<String>, values: Vec<Value>) -> Result<Self, FilterError> {
        let template = template.into();
        let placeholders = count_placeholders(&template);
        if placeholders != values.len() {
            return Err(FilterError::PlaceholderMismatch {
                template,
                placeholders,
                values: values.len(),
            });
        }
        Ok(Filter {
            template,
            values,
            active: true,
        })
    }

    /// Equality-style filter driven by a selection; `All` leaves it inactive.
    pub fn selected(template: impl Into<String>, selection: &Selection) -> Result<Self, FilterError> {
        match selection.as_deref() {
            Some(v) => Filter::new(template, vec![Value::Text(v.to_string())]),
            None => Ok(Filter::inactive(template)),
        }
    }

    /// Like `selected`, but binds the choice as an integer.
    pub fn selected_integer(
        template: impl Into<String>,
        selection: &Selection,
    ) -> Result<Self, FilterError> {
        match selection.as_deref() {
            Some(v) => {
                let n: i64 = v.parse().map_err(|_| FilterError::NotInteger {
                    value: v.to_string(),
                })?;
                Filter::new(template, vec![Value::Integer(n)])
            }
            None => Ok(Filter::inactive(template)),
        }
    }

    /// Free-text search. Every placeholder in the template receives `%term%`.
    /// Blank terms leave the filter inactive.
    pub fn search(template: impl Into<String>, term: Option<&str>) -> Result<Self, FilterError> {
        let template = template.into();
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => {
                let like = format!("%{t}%");
                let n = count_placeholders(&template);
                Filter::new(template, vec![Value::Text(like); n])
            }
            None => Ok(Filter::inactive(template)),
        }
    }

    /// A filter that never contributes to the query.
    pub fn inactive(template: impl Into<String>) -> Self {
        let template = template.into();
        let n = count_placeholders(&template);
        Filter {
            template,
            values: vec![Value::Null; n],
            active: false,
        }
    }

    pub fn deactivate(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Ordered list of filters for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    filters: Vec<Filter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Append another spec's filters after this one's.
    pub fn chain(mut self, other: FilterSpec) -> Self {
        self.filters.extend(other.filters);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn active_count(&self) -> usize {
        self.filters.iter().filter(|f| f.active).count()
    }
}

impl FromIterator<Filter> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        FilterSpec {
            filters: iter.into_iter().collect(),
        }
    }
}

/// Current selections of one page, turned into a filter specification.
pub trait FilterSource {
    fn filter_spec(&self) -> Result<FilterSpec, FilterError>;
}

/// Count `?` placeholders outside `'string'` literals and `"quoted"`
/// identifiers. Doubled quotes inside either toggle twice and cancel out.
pub fn count_placeholders(sql: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for ch in sql.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '?') => count += 1,
            _ => {}
        }
    }
    count
}
