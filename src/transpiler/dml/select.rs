//! SELECT SQL generation.

use crate::ast::{Direction, Expr, Nulls, OrderSpec, Query, SelectItem, TableRef, LOOSEST};
use crate::error::WeaveResult;
use crate::transpiler::alias::{self, Aliases};
use crate::transpiler::dml::table_sql;
use crate::transpiler::fields;
use crate::transpiler::join::build_join;
use crate::transpiler::{Compiler, Scope};

/// Generate SELECT SQL.
pub fn build_select(cx: &mut Compiler, query: &Query) -> WeaveResult<String> {
    let aliases = alias::resolve(query)?;
    let scope = Scope::new(aliases.primary.clone(), aliases.multi);

    let mut sql = if query.distinct {
        String::from("SELECT DISTINCT ")
    } else {
        String::from("SELECT ")
    };
    sql.push_str(&select_list(cx, query, &aliases, &scope)?);

    if !query.from.is_empty() {
        let tables = query
            .from
            .iter()
            .zip(&aliases.from)
            .map(|(table, alias)| table_sql(cx, table, alias.as_deref()))
            .collect::<WeaveResult<Vec<_>>>()?;
        sql.push_str(" FROM ");
        sql.push_str(&tables.join(", "));
    }

    for (join, alias) in query.joins.iter().zip(&aliases.joins) {
        sql.push_str(&build_join(
            cx,
            join,
            alias.as_deref(),
            aliases.primary.as_deref(),
            &scope,
        )?);
    }

    if let Some(filter) = &query.filter {
        sql.push_str(" WHERE ");
        sql.push_str(&cx.expr(filter, &scope, LOOSEST)?);
    }

    if !query.groups.is_empty() {
        let groups = query
            .groups
            .iter()
            .map(|group| cx.expr(group, &scope, LOOSEST))
            .collect::<WeaveResult<Vec<_>>>()?;
        sql.push_str(" GROUP BY ");
        sql.push_str(&groups.join(", "));
    }

    if let Some(having) = &query.having {
        sql.push_str(" HAVING ");
        sql.push_str(&cx.expr(having, &scope, LOOSEST)?);
    }

    if !query.orders.is_empty() {
        let orders = query
            .orders
            .iter()
            .map(|order| order_item(cx, order, &scope))
            .collect::<WeaveResult<Vec<_>>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&orders.join(", "));
    }

    sql.push_str(&cx.generator.limit_offset(query.limit, query.offset));
    Ok(sql)
}

fn is_wildcard(fields: &[SelectItem]) -> bool {
    match fields {
        [] => true,
        [SelectItem { expr: Expr::Field { name, alias: None }, alias: None }] => name.trim() == "*",
        _ => false,
    }
}

fn select_list(cx: &mut Compiler, query: &Query, aliases: &Aliases, scope: &Scope) -> WeaveResult<String> {
    if is_wildcard(&query.fields) {
        return Ok(expand_wildcard(cx, query, aliases));
    }
    let items = query
        .fields
        .iter()
        .map(|item| select_item(cx, item, scope))
        .collect::<WeaveResult<Vec<_>>>()?;
    Ok(items.join(", "))
}

fn select_item(cx: &mut Compiler, item: &SelectItem, scope: &Scope) -> WeaveResult<String> {
    let (sql, alias) = match &item.expr {
        Expr::Field { name, alias } => {
            let token = fields::parse_field(name)?;
            let alias = item.alias.as_deref().or(alias.as_deref()).or(token.alias);
            (cx.field_name(token.name, scope), alias)
        }
        expr => (cx.expr(expr, scope, LOOSEST)?, item.alias.as_deref()),
    };
    Ok(match alias {
        Some(alias) => format!("{} AS {}", sql, cx.alias_name(alias)),
        None => sql,
    })
}

/// Expand `*` from table metadata. Columns already seen under another table
/// are re-aliased `table_column` so fetched rows keep every value.
fn expand_wildcard(cx: &Compiler, query: &Query, aliases: &Aliases) -> String {
    let tables: Vec<(&TableRef, Option<&str>)> = query
        .from
        .iter()
        .zip(aliases.from.iter().map(Option::as_deref))
        .chain(
            query
                .joins
                .iter()
                .map(|join| &join.table)
                .zip(aliases.joins.iter().map(Option::as_deref)),
        )
        .collect();

    let has_meta = tables
        .iter()
        .any(|(table, _)| table.meta.as_ref().is_some_and(|m| !m.attributes.is_empty()));
    if !has_meta {
        return "*".to_string();
    }

    let mut seen: Vec<&str> = Vec::new();
    let mut columns = Vec::new();
    for (table, alias) in tables {
        let label = alias.or(table.name()).unwrap_or("sub");
        let qualifier = aliases.multi.then(|| cx.generator.quote_identifier(label));
        match table.meta.as_ref().filter(|m| !m.attributes.is_empty()) {
            Some(meta) => {
                for attr in &meta.attributes {
                    let column = match &qualifier {
                        Some(q) => format!("{}.{}", q, cx.generator.quote_identifier(attr)),
                        None => cx.generator.quote_identifier(attr),
                    };
                    if seen.contains(&attr.as_str()) {
                        let renamed = format!("{}_{}", label, attr);
                        columns.push(format!("{} AS {}", column, cx.generator.quote_identifier(&renamed)));
                    } else {
                        seen.push(attr);
                        columns.push(column);
                    }
                }
            }
            None => columns.push(match &qualifier {
                Some(q) => format!("{}.*", q),
                None => "*".to_string(),
            }),
        }
    }
    columns.join(", ")
}

/// `expr [DESC] [NULLS FIRST|LAST]`, or a null sort key in front when the
/// dialect lacks NULLS ordering.
fn order_item(cx: &mut Compiler, order: &OrderSpec, scope: &Scope) -> WeaveResult<String> {
    let target = cx.expr(&order.expr, scope, LOOSEST)?;
    let direction = match order.direction {
        Direction::Asc => "",
        Direction::Desc => " DESC",
    };
    Ok(match order.nulls {
        None => format!("{}{}", target, direction),
        Some(nulls) if cx.generator.supports_nulls_last() => {
            let nulls = match nulls {
                Nulls::First => "FIRST",
                Nulls::Last => "LAST",
            };
            format!("{}{} NULLS {}", target, direction, nulls)
        }
        Some(Nulls::Last) => {
            format!("{}, {}{}", cx.generator.null_sort_key(&target), target, direction)
        }
        Some(Nulls::First) => {
            format!("{} DESC, {}{}", cx.generator.null_sort_key(&target), target, direction)
        }
    })
}
