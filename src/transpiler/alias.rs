//! Table alias assignment.
//!
//! Aliases are only introduced when they are needed: more than one FROM
//! table, any join, or a subquery source (which always needs a name).

use tracing::trace;

use crate::ast::{Query, TableRef, TableSource};
use crate::error::{WeaveError, WeaveResult};

/// Alias decisions for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    /// Alias used to qualify unqualified fields.
    pub primary: Option<String>,
    /// One entry per FROM table.
    pub from: Vec<Option<String>>,
    /// One entry per join.
    pub joins: Vec<Option<String>>,
    /// Several tables are visible.
    pub multi: bool,
}

/// Assign aliases to every table of `query`.
///
/// Explicit aliases are reserved first; generated ones use the short table
/// name (`sub` for subqueries) with a numeric suffix on collision.
pub fn resolve(query: &Query) -> WeaveResult<Aliases> {
    let from = query.tables();
    let tables: Vec<&TableRef> = from
        .iter()
        .chain(query.joins().iter().map(|join| &join.table))
        .collect();
    let multi = from.len() > 1 || !query.joins().is_empty();

    let mut taken: Vec<String> = Vec::with_capacity(tables.len());
    let mut assigned: Vec<Option<String>> = vec![None; tables.len()];

    for (slot, table) in assigned.iter_mut().zip(&tables) {
        if let Some(alias) = &table.alias {
            if taken.contains(alias) {
                return Err(WeaveError::DuplicateAlias(alias.clone()));
            }
            taken.push(alias.clone());
            *slot = Some(alias.clone());
        }
    }

    for (slot, table) in assigned.iter_mut().zip(&tables) {
        let is_subquery = matches!(table.source, TableSource::Subquery(_));
        if slot.is_some() || !(multi || is_subquery) {
            continue;
        }
        let alias = unique(base_name(table), &taken);
        taken.push(alias.clone());
        *slot = Some(alias);
    }

    let joins = assigned.split_off(from.len());
    let primary = assigned.first().cloned().flatten();
    trace!(?primary, multi, "resolved aliases");

    Ok(Aliases {
        primary,
        from: assigned,
        joins,
        multi,
    })
}

/// `schema.users` -> `users`, subquery -> `sub`.
fn base_name(table: &TableRef) -> String {
    match &table.source {
        TableSource::Table(name) => name
            .rsplit('.')
            .next()
            .unwrap_or(name)
            .trim_matches(['"', '`'])
            .to_string(),
        TableSource::Subquery(_) => "sub".to_string(),
    }
}

fn unique(base: String, taken: &[String]) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JoinOn, TableRef};

    #[test]
    fn test_single_table_needs_no_alias() {
        let mut q = Query::new();
        q.from("users");
        let aliases = resolve(&q).unwrap();
        assert_eq!(aliases.primary, None);
        assert!(!aliases.multi);
    }

    #[test]
    fn test_self_join_gets_suffix() {
        let mut q = Query::new();
        q.from("app.users").join(
            "users",
            "LEFT",
            Some(JoinOn::from(vec![("manager_id", "id")])),
        );
        let aliases = resolve(&q).unwrap();
        assert_eq!(aliases.from, vec![Some("users".to_string())]);
        assert_eq!(aliases.joins, vec![Some("users1".to_string())]);
    }

    #[test]
    fn test_explicit_alias_is_reserved_first() {
        let mut q = Query::new();
        q.from("users").join(TableRef::table("teams").alias("users"), "CROSS", None);
        let aliases = resolve(&q).unwrap();
        assert_eq!(aliases.primary.as_deref(), Some("users1"));
        assert_eq!(aliases.joins, vec![Some("users".to_string())]);
    }

    #[test]
    fn test_duplicate_explicit_alias() {
        let mut q = Query::new();
        q.from(TableRef::table("a").alias("x"))
            .add_from(TableRef::table("b").alias("x"));
        assert!(matches!(resolve(&q), Err(WeaveError::DuplicateAlias(a)) if a == "x"));
    }

    #[test]
    fn test_subquery_always_aliased() {
        let mut inner = Query::new();
        inner.from("users");
        let mut q = Query::new();
        q.from(TableRef::subquery(inner));
        assert_eq!(resolve(&q).unwrap().primary.as_deref(), Some("sub"));
    }
}
