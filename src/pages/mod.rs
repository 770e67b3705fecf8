pub mod analysis;
pub mod coaches;
pub mod home;
pub mod options;
pub mod players;
pub mod rankings;
pub mod seasons;
pub mod teams;
pub mod venues;

use serde::Serialize;

use crate::db::models::ResultTable;
use crate::db::{RelationalStore, StoreError};
use crate::query::filters::ALL;
use crate::query::ComposedQuery;

/// One titled table on a page.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub table: ResultTable,
}

/// Everything one page renders: its sections in display order, plus notes
/// such as empty-state messages and fallbacks that were applied.
#[derive(Debug, Clone, Serialize)]
pub struct PageOutput {
    pub title: String,
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl PageOutput {
    pub fn new(title: impl Into<String>) -> Self {
        PageOutput {
            title: title.into(),
            sections: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn push_section(&mut self, title: impl Into<String>, table: ResultTable) {
        self.sections.push(Section {
            title: title.into(),
            table,
        });
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn section(&self, title: &str) -> Option<&ResultTable> {
        self.sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| &s.table)
    }
}

/// Run a single-column lookup and return its non-null values.
pub fn distinct_values(
    store: &dyn RelationalStore,
    query: &ComposedQuery,
) -> Result<Vec<String>, StoreError> {
    let table = store.run(query)?;
    Ok(table
        .rows()
        .iter()
        .filter_map(|r| r.get(0))
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect())
}

/// Lookup values as choices, headed by the `All` sentinel.
pub fn choices(store: &dyn RelationalStore, sql: &str) -> Result<Vec<String>, StoreError> {
    let mut out = vec![ALL.to_string()];
    out.extend(distinct_values(store, &ComposedQuery::fixed(sql))?);
    Ok(out)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use rusqlite::types::Value;

    use crate::db::models::{ResultTable, Row, Scalar};
    use crate::db::{RelationalStore, StoreError};

    /// Store double that records every statement and answers from a script.
    /// Statements with no scripted answer get an empty table.
    #[derive(Default)]
    pub struct RecordingStore {
        pub executed: RefCell<Vec<(String, Vec<Value>)>>,
        answers: Vec<(&'static str, ResultTable)>,
        failing: Vec<&'static str>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer any statement containing `needle` with `table`.
        pub fn answer(mut self, needle: &'static str, table: ResultTable) -> Self {
            self.answers.push((needle, table));
            self
        }

        /// Fail any statement containing `needle`.
        pub fn fail_on(mut self, needle: &'static str) -> Self {
            self.failing.push(needle);
            self
        }

        pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
            self.executed.borrow().clone()
        }

        pub fn find(&self, needle: &str) -> Option<(String, Vec<Value>)> {
            self.statements().into_iter().find(|(sql, _)| sql.contains(needle))
        }
    }

    impl RelationalStore for RecordingStore {
        fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultTable, StoreError> {
            self.executed
                .borrow_mut()
                .push((sql.to_string(), params.to_vec()));
            if self.failing.iter().any(|n| sql.contains(n)) {
                return Err(StoreError::Query {
                    sql: sql.to_string(),
                    source: rusqlite::Error::InvalidQuery,
                });
            }
            Ok(self
                .answers
                .iter()
                .find(|(needle, _)| sql.contains(needle))
                .map(|(_, t)| t.clone())
                .unwrap_or_default())
        }
    }

    pub fn table(columns: &[&str], rows: Vec<Vec<Scalar>>) -> ResultTable {
        ResultTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter().map(Row::new).collect(),
        )
    }

    pub fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    pub fn vtext(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}
