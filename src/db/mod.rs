pub mod models;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::query::ComposedQuery;
use models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open database {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("query failed: {source}\n  sql: {sql}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Anything that can run one parameterized statement and hand back rows.
pub trait RelationalStore {
    /// Run `sql` with `params` bound positionally.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultTable, StoreError>;

    fn run(&self, query: &ComposedQuery) -> Result<ResultTable, StoreError> {
        self.execute(&query.sql, &query.params)
    }
}

/// Where and how to reach the SQLite file.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub read_only: bool,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

    /// Config for dashboard queries: a missing file is an error, not a new database.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            read_only: true,
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn read_write(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            read_only: false,
            ..Self::read_only(path)
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// SQLite-backed store. Every statement gets its own connection, dropped
/// before the call returns.
pub struct SqliteStore {
    config: StoreConfig,
}

impl SqliteStore {
    pub fn new(config: StoreConfig) -> Self {
        SqliteStore { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Default database path: ~/.gridiron/gridiron.db
    pub fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".gridiron").join("gridiron.db"))
    }

    fn connect(&self, read_only: bool) -> Result<Connection, StoreError> {
        let path = &self.config.path;
        let connect_err = |source: rusqlite::Error| StoreError::Connect {
            path: path.clone(),
            source,
        };

        let flags = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };

        let conn = Connection::open_with_flags(path, flags).map_err(connect_err)?;
        conn.busy_timeout(self.config.busy_timeout)
            .map_err(connect_err)?;
        Ok(conn)
    }

    /// Create the base tables if missing. Opens read-write regardless of config.
    pub fn init_schema(&self) -> Result<()> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let conn = self.connect(false)?;
        schema::create_schema(&conn)?;

        info!("Initialized schema: {}", self.config.path.display());
        Ok(())
    }

    /// Row counts for every base table and every external view that exists.
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.connect(self.config.read_only)?;

        let mut relations = Vec::new();
        let expected = schema::BASE_TABLES
            .iter()
            .map(|name| (*name, "table"))
            .chain(schema::EXTERNAL_VIEWS.iter().map(|name| (*name, "view")));

        for (name, kind) in expected {
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE name = ?1 AND type = ?2",
                rusqlite::params![name, kind],
                |r| r.get(0),
            )?;
            if !exists {
                continue;
            }
            // name comes from the fixed lists above
            let rows: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |r| r.get(0))
                .with_context(|| format!("Failed to count rows in {name}"))?;
            relations.push(RelationCount {
                name: name.to_string(),
                kind: kind.to_string(),
                rows,
            });
        }

        let db_size_bytes = std::fs::metadata(&self.config.path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(DbStats {
            relations,
            db_size_bytes,
        })
    }

    /// Schema version recorded by `init`, if any.
    pub fn schema_version(&self) -> Option<String> {
        let conn = self.connect(true).ok()?;
        conn.query_row(
            "SELECT value FROM gridiron_meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .ok()
    }
}

impl RelationalStore for SqliteStore {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultTable, StoreError> {
        debug!(params = params.len(), "executing: {}", sql);

        let conn = self.connect(self.config.read_only)?;
        let query_err = |source: rusqlite::Error| StoreError::Query {
            sql: sql.to_string(),
            source,
        };

        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(query_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(query_err)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Scalar::from(row.get_ref(i).map_err(query_err)?));
            }
            results.push(Row::new(values));
        }

        debug!(rows = results.len(), "query returned");
        Ok(ResultTable::new(columns, results))
    }
}
