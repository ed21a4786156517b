//! INSERT SQL generation.

use crate::ast::{InsertSource, Query, LOOSEST};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::dml::target_table;
use crate::transpiler::{Compiler, Scope};

/// Generate INSERT SQL.
pub fn build_insert(cx: &mut Compiler, query: &Query) -> WeaveResult<String> {
    let table = target_table(&query.from, "INSERT INTO")?;
    let mut sql = format!("INSERT INTO {}", cx.dotted(table.name().unwrap_or_default()));
    let scope = Scope::default();

    let source = query
        .insert
        .as_ref()
        .ok_or_else(|| WeaveError::invalid("INSERT without values"))?;

    match source {
        InsertSource::Exprs(pairs) => {
            if pairs.is_empty() {
                return Err(WeaveError::invalid("INSERT without values"));
            }
            let mut values = Vec::with_capacity(pairs.len());
            for (_, expr) in pairs {
                values.push(cx.expr(expr, &scope, LOOSEST)?);
            }
            let columns = column_list(cx, pairs.iter().map(|(field, _)| field.as_str()));
            sql.push_str(&format!(" ({}) VALUES ({})", columns, values.join(", ")));
        }
        InsertSource::Values(pairs) => {
            if pairs.is_empty() {
                return Err(WeaveError::invalid("INSERT without values"));
            }
            let values: Vec<String> = pairs
                .iter()
                .map(|(_, value)| format!(":{}", cx.binder.lift(value.clone())))
                .collect();
            let columns = column_list(cx, pairs.iter().map(|(field, _)| field.as_str()));
            sql.push_str(&format!(" ({}) VALUES ({})", columns, values.join(", ")));
        }
        InsertSource::Rows { fields, rows } => {
            if rows.is_empty() {
                return Err(WeaveError::invalid("INSERT without rows"));
            }
            let fields: Vec<&str> = if !fields.is_empty() {
                fields.iter().map(String::as_str).collect()
            } else {
                table
                    .meta
                    .as_ref()
                    .map(|meta| meta.attributes.iter().map(String::as_str).collect())
                    .unwrap_or_default()
            };
            let width = if fields.is_empty() {
                rows.iter().map(Vec::len).max().unwrap_or(0)
            } else {
                fields.len()
            };

            let mut tuples = Vec::with_capacity(rows.len());
            for (index, row) in rows.iter().enumerate() {
                if row.len() > width {
                    return Err(WeaveError::RowTooLong {
                        row: index,
                        len: row.len(),
                        expected: width,
                    });
                }
                let mut values = row
                    .iter()
                    .map(|value| cx.inline_literal(value))
                    .collect::<WeaveResult<Vec<_>>>()?;
                values.resize(width, "NULL".to_string());
                tuples.push(format!("({})", values.join(", ")));
            }

            if !fields.is_empty() {
                sql.push_str(&format!(" ({})", column_list(cx, fields.into_iter())));
            }
            sql.push_str(" VALUES ");
            sql.push_str(&tuples.join(", "));
        }
        InsertSource::Select { fields, query: select } => {
            if !fields.is_empty() {
                sql.push_str(&format!(" ({})", column_list(cx, fields.iter().map(String::as_str))));
            }
            cx.binder.merge(select.bound_params())?;
            sql.push(' ');
            sql.push_str(&cx.statement(select)?);
        }
    }
    Ok(sql)
}

fn column_list<'a>(cx: &Compiler, fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(|field| cx.generator.quote_identifier(field))
        .collect::<Vec<_>>()
        .join(", ")
}
