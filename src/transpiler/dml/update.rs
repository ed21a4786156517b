//! UPDATE SQL generation.

use crate::ast::{Query, LOOSEST};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::alias;
use crate::transpiler::dml::{table_sql, target_table};
use crate::transpiler::{Compiler, Scope};

/// Generate UPDATE SQL.
///
/// Extra FROM tables render as `UPDATE t SET ... FROM a, b`; WHERE is optional.
pub fn build_update(cx: &mut Compiler, query: &Query) -> WeaveResult<String> {
    let table = target_table(&query.from, "UPDATE")?;
    if !query.joins.is_empty() {
        return Err(WeaveError::invalid(
            "UPDATE does not take joins; add extra tables to FROM",
        ));
    }
    if query.assignments.is_empty() {
        return Err(WeaveError::invalid("UPDATE without assignments"));
    }

    let aliases = alias::resolve(query)?;
    let scope = Scope::new(aliases.primary.clone(), aliases.multi);
    let primary = aliases.from.first().cloned().flatten();

    let mut sql = String::from("UPDATE ");
    sql.push_str(&table_sql(cx, table, primary.as_deref())?);

    let mut assignments = Vec::with_capacity(query.assignments.len());
    for (field, value) in &query.assignments {
        let column = cx.generator.quote_identifier(field);
        assignments.push(format!("{} = {}", column, cx.expr(value, &scope, LOOSEST)?));
    }
    sql.push_str(" SET ");
    sql.push_str(&assignments.join(", "));

    if query.from.len() > 1 {
        let mut others = Vec::with_capacity(query.from.len() - 1);
        for (table, alias) in query.from.iter().zip(&aliases.from).skip(1) {
            others.push(table_sql(cx, table, alias.as_deref())?);
        }
        sql.push_str(" FROM ");
        sql.push_str(&others.join(", "));
    }

    if let Some(filter) = &query.filter {
        sql.push_str(" WHERE ");
        sql.push_str(&cx.expr(filter, &scope, LOOSEST)?);
    }
    Ok(sql)
}
