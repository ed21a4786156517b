//! Configuration loaded from `sqlweave.toml`.
//!
//! ```toml
//! database_url = "postgres://localhost/app"
//! dialect = "postgres"
//! log = "sqlweave=debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::Dialect;

pub const CONFIG_FILE: &str = "sqlweave.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeaveConfig {
    pub database_url: Option<String>,
    /// Dialect for dry runs. A connection URL's scheme takes precedence.
    pub dialect: Option<Dialect>,
    /// `tracing-subscriber` filter directive.
    pub log: Option<String>,
}

impl WeaveConfig {
    /// `./sqlweave.toml`, else `<config_dir>/sqlweave/config.toml`, else defaults.
    pub fn load() -> WeaveResult<Self> {
        match Self::locate() {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("sqlweave").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn from_path(path: &Path) -> WeaveResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            WeaveError::Config(msg) => WeaveError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> WeaveResult<Self> {
        toml::from_str(content).map_err(|e| WeaveError::Config(e.to_string()))
    }

    /// Dialect implied by the URL, then the configured one, then the default.
    pub fn effective_dialect(&self, url: Option<&str>) -> Dialect {
        url.or(self.database_url.as_deref())
            .and_then(Dialect::from_url)
            .or(self.dialect)
            .unwrap_or_default()
    }
}
