//! DELETE SQL generation.

use crate::ast::{Query, LOOSEST};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::alias;
use crate::transpiler::dml::{table_sql, target_table};
use crate::transpiler::{Compiler, Scope};

/// Generate DELETE SQL.
///
/// A non-empty WHERE condition is mandatory; pass [`Expr::truth`](crate::ast::Expr::truth)
/// to delete every row.
pub fn build_delete(cx: &mut Compiler, query: &Query) -> WeaveResult<String> {
    let table = target_table(&query.from, "DELETE FROM")?;
    if query.from.len() > 1 || !query.joins.is_empty() {
        return Err(WeaveError::invalid("DELETE takes exactly one table"));
    }
    let filter = query.filter.as_ref().ok_or_else(|| {
        WeaveError::invalid("DELETE without WHERE; use an explicit TRUE condition to delete every row")
    })?;
    if filter.is_vacuous() {
        return Err(WeaveError::invalid(
            "DELETE with an empty WHERE; use an explicit TRUE condition to delete every row",
        ));
    }

    let aliases = alias::resolve(query)?;
    let scope = Scope::new(aliases.primary.clone(), aliases.multi);

    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&table_sql(cx, table, aliases.primary.as_deref())?);
    sql.push_str(" WHERE ");
    sql.push_str(&cx.expr(filter, &scope, LOOSEST)?);
    Ok(sql)
}
