//! Database execution for compiled queries.
//!
//! A [`Connection`] runs prepared [`Statement`]s. [`Query`] gains fetch
//! operations here; results are cached until the next mutation, so asking for
//! the rows twice runs the statement once.

pub mod pool;
pub mod row;
pub mod statement;

use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{Query, Record, StatementKind, Value};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::SqlGenerator;

pub use pool::SqlxConnection;
pub use row::Row;
pub use statement::Statement;

/// Something that can run statements.
pub trait Connection: Debug {
    /// Dialect used to compile queries bound to this connection.
    fn generator(&self) -> Arc<dyn SqlGenerator>;

    /// Run a row-returning statement.
    fn fetch(&self, statement: &Statement) -> WeaveResult<Vec<Row>>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, statement: &Statement) -> WeaveResult<u64>;
}

impl Query {
    fn connection(&self) -> WeaveResult<&Arc<dyn Connection>> {
        self.connection.as_ref().ok_or(WeaveError::NotConnected)
    }

    /// Compile and rewrite placeholders into the dialect's positional style.
    pub fn statement(&self) -> WeaveResult<Statement> {
        let compiled = self.compile()?;
        Statement::prepare(&compiled.sql, self.generator()).bind(&compiled.params)
    }

    /// Every row. Cached until the next mutation.
    pub fn all(&self) -> WeaveResult<Vec<Row>> {
        if let Some(rows) = self.results.borrow().as_ref() {
            return Ok(rows.clone());
        }
        let connection = self.connection()?;
        let statement = self.statement()?;
        let rows = connection.fetch(&statement)?;
        debug!(rows = rows.len(), "fetched");
        *self.results.borrow_mut() = Some(rows.clone());
        Ok(rows)
    }

    /// First row, if any.
    pub fn one(&self) -> WeaveResult<Option<Row>> {
        Ok(self.all()?.into_iter().next())
    }

    /// First column of every row.
    pub fn column(&self) -> WeaveResult<Vec<Value>> {
        Ok(self
            .all()?
            .into_iter()
            .map(|row| row.into_values().into_iter().next().unwrap_or(Value::Null))
            .collect())
    }

    /// First column of the first row.
    pub fn scalar(&self) -> WeaveResult<Value> {
        let row = self.one()?.ok_or(WeaveError::RowNotFound)?;
        Ok(row.into_values().into_iter().next().unwrap_or(Value::Null))
    }

    /// Number of rows the query would return, via [`Query::count_query`].
    pub fn count(&self) -> WeaveResult<u64> {
        let value = self.count_query().scalar()?;
        value
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| WeaveError::Execution(format!("COUNT(*) returned {}", value)))
    }

    /// Run the statement once per compiled state and return the affected
    /// row count. A SELECT is fetched and reports its row count.
    pub fn execute(&self) -> WeaveResult<u64> {
        if let Some(affected) = self.affected.get() {
            return Ok(affected);
        }
        let affected = match self.kind() {
            StatementKind::Select => self.all()?.len() as u64,
            _ => {
                let connection = self.connection()?;
                let statement = self.statement()?;
                connection.execute(&statement)?
            }
        };
        debug!(kind = %self.kind(), affected, "executed");
        self.affected.set(Some(affected));
        Ok(affected)
    }

    /// Affected row count of the last [`Query::execute`], if it ran since the
    /// last mutation.
    pub fn affected_row_count(&self) -> Option<u64> {
        self.affected.get()
    }

    /// Every row deserialized into `R`.
    pub fn all_as<R: Record>(&self) -> WeaveResult<Vec<R>> {
        self.all()?.iter().map(|row| row.hydrate()).collect()
    }

    /// The first row deserialized into `R`.
    pub fn one_as<R: Record>(&self) -> WeaveResult<R> {
        self.one()?.ok_or(WeaveError::RowNotFound)?.hydrate()
    }
}
