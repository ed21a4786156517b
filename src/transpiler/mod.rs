//! SQL transpiler for the query tree.
//!
//! Converts a [`Query`] into a SQL string with `:name` placeholders and the
//! parameter bag that fills them.

pub mod alias;
pub mod custom;
pub mod dialect;
pub mod dml;
pub mod expression;
pub mod fields;
pub mod join;
pub mod params;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::debug;

use crate::ast::{Query, StatementKind};
use crate::error::WeaveResult;

pub use dialect::Dialect;
pub use params::{ParameterBag, ParameterBinder};
pub use traits::{escape_identifier, SqlGenerator};

/// Output of a compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    pub sql: String,
    pub params: ParameterBag,
}

/// Compile `query` with its own dialect.
pub fn compile(query: &Query) -> WeaveResult<Compiled> {
    let mut compiler = Compiler::new(query.generator(), query.bound_params());
    compiler.reserve_nested(query)?;
    let sql = compiler.statement(query)?;
    let params = compiler.binder.finish();
    debug!(kind = %query.kind(), params = params.len(), "compiled {}", sql);
    Ok(Compiled { sql, params })
}

/// Alias context for field qualification inside one statement.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Alias of the primary table.
    pub alias: Option<String>,
    /// More than one table is visible, so unqualified fields get `alias.`.
    pub multi: bool,
}

impl Scope {
    pub fn new(alias: Option<String>, multi: bool) -> Self {
        Self { alias, multi }
    }

    /// The prefix to put on an unqualified field, if any.
    pub fn qualifier(&self) -> Option<&str> {
        if self.multi {
            self.alias.as_deref()
        } else {
            None
        }
    }
}

/// State threaded through one compilation, including nested subqueries.
pub struct Compiler<'g> {
    pub(crate) generator: &'g dyn SqlGenerator,
    pub(crate) binder: ParameterBinder,
}

impl<'g> Compiler<'g> {
    pub fn new(generator: &'g dyn SqlGenerator, params: &ParameterBag) -> Self {
        Self {
            generator,
            binder: ParameterBinder::new(params),
        }
    }

    /// Take in the user parameters of every nested query before anything is
    /// lifted, so generated `pN` names step around them.
    pub fn reserve_nested(&mut self, query: &Query) -> WeaveResult<()> {
        for nested in query.subqueries() {
            self.binder.merge(nested.bound_params())?;
            self.reserve_nested(nested)?;
        }
        Ok(())
    }

    /// Compile one statement. Subqueries re-enter here with their own scope.
    pub fn statement(&mut self, query: &Query) -> WeaveResult<String> {
        match query.kind() {
            StatementKind::Select => dml::select::build_select(self, query),
            StatementKind::Insert => dml::insert::build_insert(self, query),
            StatementKind::Update => dml::update::build_update(self, query),
            StatementKind::Delete => dml::delete::build_delete(self, query),
        }
    }

    /// `( <statement> )`. Merging is a no-op once [`Compiler::reserve_nested`] ran.
    pub fn subquery(&mut self, query: &Query) -> WeaveResult<String> {
        self.binder.merge(query.bound_params())?;
        Ok(format!("({})", self.statement(query)?))
    }
}
