use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::{SqliteStore, StoreConfig};

/// `[store]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
}

/// `[display]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct DisplaySection {
    pub max_rows: Option<usize>,
    pub max_column_width: Option<usize>,
}

/// Top-level gridiron config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct GridironConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub display: DisplaySection,
}

pub const DEFAULT_MAX_ROWS: usize = 200;
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 32;

impl GridironConfig {
    /// Load config from ~/.gridiron/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(GridironConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config.toml")
    }

    /// Resolve the database path: CLI flag / env var > config file > default.
    pub fn resolve_db_path(&self, cli_flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_flag {
            return Ok(path.to_path_buf());
        }
        if let Some(ref path) = self.store.path {
            return Ok(expand_home(path));
        }
        SqliteStore::default_db_path()
    }

    /// Store config for dashboard (read-only) queries.
    pub fn store_config(&self, db_path: PathBuf) -> StoreConfig {
        let config = StoreConfig::read_only(db_path);
        match self.store.busy_timeout_ms {
            Some(ms) => config.with_busy_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    pub fn max_rows(&self) -> usize {
        self.display.max_rows.unwrap_or(DEFAULT_MAX_ROWS)
    }

    pub fn max_column_width(&self) -> usize {
        self.display.max_column_width.unwrap_or(DEFAULT_MAX_COLUMN_WIDTH)
    }

    /// Display the effective config.
    pub fn display(&self, db_path: &Path) -> String {
        let mut lines = Vec::new();
        lines.push("[store]".to_string());
        lines.push(format!("  path = \"{}\"", db_path.display()));
        lines.push(format!(
            "  busy_timeout_ms = {}",
            self.store
                .busy_timeout_ms
                .unwrap_or(StoreConfig::DEFAULT_BUSY_TIMEOUT.as_millis() as u64)
        ));
        lines.push("[display]".to_string());
        lines.push(format!("  max_rows = {}", self.max_rows()));
        lines.push(format!("  max_column_width = {}", self.max_column_width()));
        lines.join("\n")
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Path to the config file: ~/.gridiron/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".gridiron").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.gridiron/config.toml
# Database path resolution order: --db flag > GRIDIRON_DB env var > store.path

[store]
# path = "~/.gridiron/gridiron.db"
# busy_timeout_ms = 5000

[display]
# max_rows = 200
# max_column_width = 32
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}
