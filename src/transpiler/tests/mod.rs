//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT, INSERT, UPDATE, DELETE statements
//! - `dialects`: dialect-specific rendering (MySQL, SQLite)
//! - `operators`: arity checking, folding and literal handling per operator
//! - `precedence`: parenthesization for every pair of binary operators

mod core;
mod operators;

use crate::ast::{Expr, LOOSEST};
use crate::error::WeaveResult;
use crate::transpiler::{Compiler, Dialect, ParameterBag, Scope};

/// Compile a lone expression at the top level.
pub(super) fn render_with(dialect: Dialect, expr: &Expr) -> WeaveResult<(String, ParameterBag)> {
    let generator = dialect.generator();
    let mut compiler = Compiler::new(generator.as_ref(), &ParameterBag::new());
    let sql = compiler.expr(expr, &Scope::default(), LOOSEST)?;
    Ok((sql, compiler.binder.finish()))
}

pub(super) fn render(expr: &Expr) -> String {
    render_with(Dialect::Postgres, expr).unwrap().0
}

pub(super) fn x() -> Expr {
    Expr::field("x")
}

pub(super) fn y() -> Expr {
    Expr::field("y")
}

pub(super) fn z() -> Expr {
    Expr::field("z")
}
