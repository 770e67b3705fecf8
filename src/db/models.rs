use chrono::NaiveDate;
use rusqlite::types::{Value, ValueRef};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Scalar {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Scalar::Null,
            ValueRef::Integer(i) => Scalar::Integer(i),
            ValueRef::Real(f) => Scalar::Real(f),
            ValueRef::Text(bytes) => {
                let s = String::from_utf8_lossy(bytes).into_owned();
                // SQLite keeps dates as TEXT
                if s.len() == 10 {
                    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                        return Scalar::Date(d);
                    }
                }
                Scalar::Text(s)
            }
            ValueRef::Blob(b) => Scalar::Text(format!("<{} bytes>", b.len())),
        }
    }
}

/// Feed a looked-up cell back into a later query as a bound parameter.
impl From<&Scalar> for Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Integer(i) => Value::Integer(*i),
            Scalar::Real(r) => Value::Real(*r),
            Scalar::Text(s) => Value::Text(s.clone()),
            Scalar::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Real(r) => write!(f, "{r}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// One result row; values line up with `ResultTable::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Scalar>,
}

impl Row {
    pub fn new(values: Vec<Scalar>) -> Self {
        Row { values }
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.values.get(index)
    }
}

/// Rectangular query output: columns in SELECT order, rows in store order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        ResultTable { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Vec<&Scalar> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().filter_map(|r| r.get(idx)).collect(),
            None => Vec::new(),
        }
    }
}

struct RowObject<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.columns.iter().zip(self.row.values.iter()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RowObjects<'a>(&'a ResultTable);

impl Serialize for RowObjects<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.rows.len()))?;
        for row in &self.0.rows {
            seq.serialize_element(&RowObject {
                columns: &self.0.columns,
                row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("ResultTable", 2)?;
        st.serialize_field("columns", &self.columns)?;
        st.serialize_field("rows", &RowObjects(self))?;
        st.end()
    }
}

/// Stats returned by `gridiron info`.
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub relations: Vec<RelationCount>,
    pub db_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationCount {
    pub name: String,
    pub kind: String,
    pub rows: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultTable {
        ResultTable::new(
            vec!["team_name".into(), "rank".into(), "effective".into()],
            vec![
                Row::new(vec![
                    Scalar::Text("Crimson Tide".into()),
                    Scalar::Integer(1),
                    Scalar::from(ValueRef::Text(b"2024-09-01")),
                ]),
                Row::new(vec![Scalar::Text("Buckeyes".into()), Scalar::Integer(2), Scalar::Null]),
            ],
        )
    }

    #[test]
    fn iso_dates_become_date_cells() {
        let t = sample();
        assert_eq!(
            t.get(0, "effective"),
            Some(&Scalar::Date(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()))
        );
        assert_eq!(
            Scalar::from(ValueRef::Text(b"2024-09-01T12:00:00Z")),
            Scalar::Text("2024-09-01T12:00:00Z".into())
        );
    }

    #[test]
    fn column_lookup_by_name() {
        let t = sample();
        assert_eq!(t.column_index("rank"), Some(1));
        assert_eq!(
            t.column("rank").into_iter().filter_map(Scalar::as_i64).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(t.column("missing").is_empty());
        assert_eq!(t.get(5, "rank"), None);
    }

    #[test]
    fn json_rows_keep_select_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"columns":["team_name","rank","effective"],"rows":[{"team_name":"Crimson Tide","rank":1,"effective":"2024-09-01"},{"team_name":"Buckeyes","rank":2,"effective":null}]}"#
        );
    }
}
