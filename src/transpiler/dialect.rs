use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::WeaveError;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySQL,
    SQLite,
}

impl Dialect {
    pub fn generator(&self) -> Arc<dyn SqlGenerator> {
        match self {
            Dialect::Postgres => Arc::new(PostgresGenerator),
            Dialect::MySQL => Arc::new(MysqlGenerator),
            Dialect::SQLite => Arc::new(SqliteGenerator),
        }
    }

    /// Pick the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?;
        match scheme {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySQL),
            "sqlite" => Some(Dialect::SQLite),
            _ => None,
        }
    }

    pub fn all() -> [Dialect; 3] {
        [Dialect::Postgres, Dialect::MySQL, Dialect::SQLite]
    }
}

impl std::str::FromStr for Dialect {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySQL),
            "sqlite" | "sqlite3" => Ok(Dialect::SQLite),
            other => Err(WeaveError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.generator().name())
    }
}
