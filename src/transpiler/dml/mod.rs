//! DML (Data Manipulation Language) SQL generation.
//!
//! This module contains functions for generating SELECT, INSERT, UPDATE and
//! DELETE statements.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use crate::ast::{TableRef, TableSource};
use crate::error::{WeaveError, WeaveResult};

use super::Compiler;

/// Render a FROM/JOIN target. The alias is dropped when it equals the table name.
pub fn table_sql(cx: &mut Compiler, table: &TableRef, alias: Option<&str>) -> WeaveResult<String> {
    match &table.source {
        TableSource::Table(name) => {
            let quoted = cx.dotted(name);
            match alias {
                Some(alias) if alias != name => {
                    Ok(format!("{} {}", quoted, cx.alias_name(alias)))
                }
                _ => Ok(quoted),
            }
        }
        TableSource::Subquery(query) => {
            let sql = cx.subquery(query)?;
            let alias = alias.unwrap_or("sub");
            Ok(format!("{} {}", sql, cx.alias_name(alias)))
        }
    }
}

/// The single named table a write statement targets.
pub(crate) fn target_table<'q>(tables: &'q [TableRef], verb: &str) -> WeaveResult<&'q TableRef> {
    let table = tables
        .first()
        .ok_or_else(|| WeaveError::invalid(format!("{} needs a target table", verb)))?;
    if table.name().is_none() {
        return Err(WeaveError::invalid(format!("cannot {} a subquery", verb)));
    }
    Ok(table)
}
