//! Statement tests against the default (Postgres) dialect.

use pretty_assertions::assert_eq;

use crate::ast::{Expr, FieldValue, JoinOn, OrderSpec, Query, TableMeta, TableRef, Value};
use crate::error::WeaveError;

fn users_meta() -> TableMeta {
    TableMeta::new("users").with_attributes(["id", "name", "team_id"])
}

fn teams_meta() -> TableMeta {
    TableMeta::new("teams").with_attributes(["id", "title"])
}

#[test]
fn test_simple_select() {
    let mut q = Query::new();
    q.select(["id", "name"])
        .from("users")
        .filter(Expr::fields([
            ("name", FieldValue::from("ann")),
            ("active", FieldValue::Null),
        ]))
        .order_by(OrderSpec::desc("created_at"))
        .limit(10);
    assert_eq!(
        q.sql().unwrap(),
        "SELECT id, name FROM users WHERE name = :p1 AND active IS NULL ORDER BY created_at DESC LIMIT 10"
    );
    assert_eq!(q.params().unwrap().get("p1"), Some(&Value::from("ann")));
}

#[test]
fn test_select_without_fields_is_wildcard() {
    let mut q = Query::new();
    q.from("users");
    assert_eq!(q.sql().unwrap(), "SELECT * FROM users");
}

#[test]
fn test_select_aliases() {
    let mut q = Query::new();
    q.select(["name AS n", "email e", "COUNT(*) AS total"])
        .select_expr(Expr::func("lower", [Expr::field("name")]), Some("lower_name"))
        .from("users");
    assert_eq!(
        q.sql().unwrap(),
        "SELECT name AS n, email AS e, COUNT(*) AS total, LOWER(name) AS lower_name FROM users"
    );
}

#[test]
fn test_malformed_field() {
    let mut q = Query::new();
    q.select(["name AS"]).from("users");
    assert!(matches!(q.sql(), Err(WeaveError::MalformedField(_))));

    q.select(["COUNT(*"]);
    assert!(matches!(q.sql(), Err(WeaveError::MalformedField(_))));
}

#[test]
fn test_reserved_table_is_quoted() {
    let mut q = Query::new();
    q.select(["course.title", "user.name"])
        .from("course")
        .join("user", "left", Some(vec![("creator", "id")].into()));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT course.title, \"user\".name FROM course LEFT JOIN \"user\" ON course.creator = \"user\".id"
    );
}

#[test]
fn test_unqualified_fields_get_primary_alias() {
    let mut q = Query::new();
    q.select(["title"])
        .from("course")
        .join(
            "user",
            "inner",
            Some(JoinOn::Expr(Expr::eq(Expr::field("creator"), Expr::field("user.id")))),
        )
        .filter(Expr::eq(Expr::field("published"), Expr::lit(true)));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT course.title FROM course INNER JOIN \"user\" ON course.creator = \"user\".id WHERE course.published = TRUE"
    );
}

#[test]
fn test_self_join_aliases() {
    let mut q = Query::new();
    q.select(["name", "users1.name AS manager"])
        .from("users")
        .join("users", "left outer", Some(vec![("manager_id", "id")].into()));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT users.name, users1.name AS manager FROM users LEFT OUTER JOIN users users1 ON users.manager_id = users1.id"
    );
}

#[test]
fn test_explicit_alias() {
    let mut q = Query::new();
    q.select(["u.name", "t.title"])
        .from(TableRef::table("users").alias("u"))
        .join(TableRef::table("teams").alias("t"), "inner", Some(vec![("team_id", "id")].into()));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT u.name, t.title FROM users u INNER JOIN teams t ON u.team_id = t.id"
    );
}

#[test]
fn test_join_condition_rules() {
    let mut q = Query::new();
    q.from("users").join("tags", "cross", None);
    assert_eq!(q.sql().unwrap(), "SELECT * FROM users CROSS JOIN tags");

    let mut q = Query::new();
    q.from("users").join("tags", "CROSS", Some(vec![("id", "user_id")].into()));
    assert!(matches!(q.sql(), Err(WeaveError::JoinCondition { .. })));

    let mut q = Query::new();
    q.from("users").join("teams", "left", None);
    assert!(matches!(q.sql(), Err(WeaveError::JoinCondition { .. })));

    let mut q = Query::new();
    q.from("users").join("teams", "sideways", None);
    assert!(matches!(q.sql(), Err(WeaveError::InvalidJoinType(_))));
}

#[test]
fn test_natural_join() {
    let mut q = Query::new();
    q.from("users").join("profiles", "natural left", None);
    assert_eq!(q.sql().unwrap(), "SELECT * FROM users NATURAL LEFT JOIN profiles");
}

#[test]
fn test_wildcard_expansion_from_meta() {
    let mut q = Query::new();
    q.from(users_meta())
        .join(teams_meta(), "left", Some(vec![("team_id", "id")].into()));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT users.id, users.name, users.team_id, teams.id AS teams_id, teams.title \
         FROM users LEFT JOIN teams ON users.team_id = teams.id"
    );
}

#[test]
fn test_wildcard_single_table_meta() {
    let mut q = Query::new();
    q.select(["*"]).from(users_meta());
    assert_eq!(q.sql().unwrap(), "SELECT id, name, team_id FROM users");
}

#[test]
fn test_wildcard_mixed_meta() {
    let mut q = Query::new();
    q.from(users_meta()).join("logins", "inner", Some(vec![("id", "user_id")].into()));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT users.id, users.name, users.team_id, logins.* FROM users INNER JOIN logins ON users.id = logins.user_id"
    );
}

#[test]
fn test_multiple_from_tables() {
    let mut q = Query::new();
    q.select(["name", "teams.title"])
        .from("users")
        .add_from("teams")
        .filter(Expr::eq(Expr::field("team_id"), Expr::field("teams.id")));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT users.name, teams.title FROM users, teams WHERE users.team_id = teams.id"
    );
}

#[test]
fn test_subquery_in_filter_merges_params() {
    let mut inner = Query::new();
    inner
        .select(["user_id"])
        .from("orders")
        .filter(Expr::binary(">", Expr::field("total"), Expr::param("min")))
        .bind("min", 100);

    let mut q = Query::new();
    q.select(["name"])
        .from("users")
        .filter(Expr::op("IN", [Expr::field("id"), Expr::subquery(inner.clone())]));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT name FROM users WHERE id IN (SELECT user_id FROM orders WHERE total > :min)"
    );
    assert_eq!(q.params().unwrap().get("min"), Some(&Value::Int(100)));

    q.bind("min", 5);
    assert!(matches!(q.sql(), Err(WeaveError::ParamConflict(name)) if name == "min"));
}

#[test]
fn test_generated_names_step_around_subquery_params() {
    let mut inner = Query::new();
    inner
        .select(["id"])
        .from("teams")
        .filter(Expr::eq(Expr::field("size"), Expr::param("p1")))
        .bind("p1", 5);

    let mut q = Query::new();
    q.select(["id"]).from("users").filter(Expr::and([
        Expr::fields([("name", FieldValue::from("Dilbert"))]),
        Expr::op("IN", [Expr::field("team_id"), Expr::subquery(inner)]),
    ]));

    let compiled = q.compile().unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT id FROM users WHERE name = :p2 AND team_id IN (SELECT id FROM teams WHERE size = :p1)"
    );
    assert_eq!(compiled.params.get("p1"), Some(&Value::Int(5)));
    assert_eq!(compiled.params.get("p2"), Some(&Value::from("Dilbert")));
}

#[test]
fn test_subquery_as_table() {
    let mut inner = Query::new();
    inner.select(["user_id", "SUM(total) AS spent"]).from("orders").group_by("user_id");

    let mut q = Query::new();
    q.select(["user_id"])
        .from(TableRef::subquery(inner))
        .filter(Expr::binary(">", Expr::field("spent"), Expr::lit(1000)));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT user_id FROM (SELECT user_id, SUM(total) AS spent FROM orders GROUP BY user_id) sub WHERE spent > 1000"
    );
}

#[test]
fn test_exists_subquery() {
    let mut inner = Query::new();
    inner.select_expr(Expr::lit(1), None).from("orders").filter(Expr::eq(
        Expr::field("orders.user_id"),
        Expr::field("users.id"),
    ));
    let mut q = Query::new();
    q.select(["name"])
        .from("users")
        .filter(Expr::op("EXISTS", [Expr::subquery(inner)]));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT name FROM users WHERE EXISTS (SELECT 1 FROM orders WHERE orders.user_id = users.id)"
    );
}

#[test]
fn test_group_by_having() {
    let count = || Expr::func("count", [Expr::field("*")]);
    let mut q = Query::new();
    q.select(["team_id"])
        .select_expr(count(), Some("n"))
        .from("users")
        .group_by("team_id")
        .having(Expr::binary(">", count(), Expr::lit(5)));
    assert_eq!(
        q.sql().unwrap(),
        "SELECT team_id, COUNT(*) AS n FROM users GROUP BY team_id HAVING COUNT(*) > 5"
    );
}

#[test]
fn test_distinct() {
    let mut q = Query::new();
    q.select(["team_id"]).distinct(true).from("users");
    assert_eq!(q.sql().unwrap(), "SELECT DISTINCT team_id FROM users");
}

#[test]
fn test_order_nulls() {
    let mut q = Query::new();
    q.select(["name"])
        .from("users")
        .order_by(OrderSpec::asc("name").nulls_last())
        .order_by(OrderSpec::desc("id").nulls_first());
    assert_eq!(
        q.sql().unwrap(),
        "SELECT name FROM users ORDER BY name NULLS LAST, id DESC NULLS FIRST"
    );
}

#[test]
fn test_order_by_str() {
    let mut q = Query::new();
    q.from("users").order_by_str("created_at desc nulls last").unwrap();
    assert_eq!(
        q.sql().unwrap(),
        "SELECT * FROM users ORDER BY created_at DESC NULLS LAST"
    );
    assert!(q.order_by_str("name upward").is_err());
}

#[test]
fn test_limit_offset() {
    let mut q = Query::new();
    q.from("users").offset(20);
    assert_eq!(q.sql().unwrap(), "SELECT * FROM users OFFSET 20");
    q.limit(10);
    assert_eq!(q.sql().unwrap(), "SELECT * FROM users LIMIT 10 OFFSET 20");
}

#[test]
fn test_insert_values_are_bound() {
    let mut q = Query::new();
    q.insert_into("users")
        .values([("name", Value::from("ann")), ("age", Value::from(30))]);
    assert_eq!(q.sql().unwrap(), "INSERT INTO users (name, age) VALUES (:p1, :p2)");
    let params = q.params().unwrap();
    assert_eq!(params.get("p1"), Some(&Value::from("ann")));
    assert_eq!(params.get("p2"), Some(&Value::Int(30)));
}

#[test]
fn test_insert_exprs() {
    let mut q = Query::new();
    q.insert_into("events").value_exprs([
        ("kind", Expr::lit("'login'")),
        ("created_at", Expr::op("CURRENT_TIMESTAMP", [])),
    ]);
    assert_eq!(
        q.sql().unwrap(),
        "INSERT INTO events (kind, created_at) VALUES ('login', CURRENT_TIMESTAMP)"
    );
}

#[test]
fn test_insert_rows_pads_short_rows() {
    let mut q = Query::new();
    q.insert_into("users").rows(
        ["id", "name", "email"],
        vec![
            vec![Value::from(1), Value::from("a"), Value::from("a@x.io")],
            vec![Value::from(2), Value::from("o'neil")],
        ],
    );
    assert_eq!(
        q.sql().unwrap(),
        "INSERT INTO users (id, name, email) VALUES (1, 'a', 'a@x.io'), (2, 'o''neil', NULL)"
    );
    assert!(q.params().unwrap().is_empty());
}

#[test]
fn test_insert_rows_too_long() {
    let mut q = Query::new();
    q.insert_into("users")
        .rows(["id"], vec![vec![Value::from(1)], vec![Value::from(2), Value::from(3)]]);
    assert!(matches!(
        q.sql(),
        Err(WeaveError::RowTooLong { row: 1, len: 2, expected: 1 })
    ));
}

#[test]
fn test_insert_rows_fields_from_meta() {
    let mut q = Query::new();
    q.insert_into(users_meta())
        .rows(Vec::<String>::new(), vec![vec![Value::from(1), Value::from("ann")]]);
    assert_eq!(
        q.sql().unwrap(),
        "INSERT INTO users (id, name, team_id) VALUES (1, 'ann', NULL)"
    );
}

#[test]
fn test_insert_rows_width_from_longest_row() {
    let mut q = Query::new();
    q.insert_into("pairs").rows(
        Vec::<String>::new(),
        vec![vec![Value::from(1), Value::from(2)], vec![Value::from(3)]],
    );
    assert_eq!(q.sql().unwrap(), "INSERT INTO pairs VALUES (1, 2), (3, NULL)");
}

#[test]
fn test_insert_select() {
    let mut active = Query::new();
    active
        .select(["id", "name"])
        .from("users")
        .filter(Expr::eq(Expr::field("active"), Expr::lit(true)));
    let mut q = Query::new();
    q.insert_into("archive").insert_select(["id", "name"], active);
    assert_eq!(
        q.sql().unwrap(),
        "INSERT INTO archive (id, name) SELECT id, name FROM users WHERE active = TRUE"
    );
}

#[test]
fn test_empty_insert() {
    let mut q = Query::new();
    q.insert_into("users");
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));

    q.values(Vec::<(String, Value)>::new());
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));
}

#[test]
fn test_update() {
    let mut q = Query::new();
    q.update("users")
        .set("name", Expr::lit("bob"))
        .set("visits", Expr::op("+", [Expr::field("visits"), Expr::lit(1)]))
        .filter(Expr::eq(Expr::field("id"), Expr::param("id")))
        .bind("id", 7);
    assert_eq!(
        q.sql().unwrap(),
        "UPDATE users SET name = :p1, visits = visits + 1 WHERE id = :id"
    );
    let params = q.params().unwrap();
    assert_eq!(params.names().collect::<Vec<_>>(), vec!["id", "p1"]);
}

#[test]
fn test_update_from() {
    let mut q = Query::new();
    q.update("orders")
        .add_from("users")
        .set("status", Expr::lit("'vip'"))
        .filter(Expr::eq(Expr::field("user_id"), Expr::field("users.id")));
    assert_eq!(
        q.sql().unwrap(),
        "UPDATE orders SET status = 'vip' FROM users WHERE orders.user_id = users.id"
    );
}

#[test]
fn test_update_requires_assignments() {
    let mut q = Query::new();
    q.update("users").filter(Expr::truth());
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));
}

#[test]
fn test_delete() {
    let mut q = Query::new();
    q.delete_from("sessions").filter(Expr::binary(
        "<",
        Expr::field("expires_at"),
        Expr::op("CURRENT_TIMESTAMP", []),
    ));
    assert_eq!(
        q.sql().unwrap(),
        "DELETE FROM sessions WHERE expires_at < CURRENT_TIMESTAMP"
    );
}

#[test]
fn test_delete_requires_explicit_condition() {
    let mut q = Query::new();
    q.delete_from("sessions");
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));

    q.filter(Expr::truth());
    assert_eq!(q.sql().unwrap(), "DELETE FROM sessions WHERE TRUE");
}

#[test]
fn test_delete_rejects_empty_condition() {
    let mut q = Query::new();
    q.delete_from("sessions").filter(Expr::fields(Vec::<(String, FieldValue)>::new()));
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));

    q.filter(Expr::and([]));
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));

    q.filter(Expr::and([Expr::fields(Vec::<(String, FieldValue)>::new())]));
    assert!(matches!(q.sql(), Err(WeaveError::InvalidQuery(_))));

    q.filter(Expr::op("TRUE", []));
    assert_eq!(q.sql().unwrap(), "DELETE FROM sessions WHERE TRUE");
}

#[test]
fn test_compilation_is_cached_until_mutation() {
    let mut q = Query::new();
    q.from("users").filter(Expr::eq(Expr::field("name"), Expr::lit("ann")));
    assert!(!q.is_compiled());

    let first = q.compile().unwrap();
    assert!(q.is_compiled());
    assert_eq!(q.compile().unwrap(), first);

    q.limit(1);
    assert!(!q.is_compiled());
    let second = q.compile().unwrap();
    assert_eq!(second.sql, "SELECT * FROM users WHERE name = :p1 LIMIT 1");
    assert_eq!(second.params, first.params);
}

#[test]
fn test_count_query() {
    let mut q = Query::new();
    q.select(["id", "name"])
        .from("users")
        .filter(Expr::eq(Expr::field("active"), Expr::lit(true)))
        .order_by(OrderSpec::asc("name"))
        .limit(10);
    assert_eq!(
        q.count_query().sql().unwrap(),
        "SELECT COUNT(*) FROM users WHERE active = TRUE"
    );
}

#[test]
fn test_count_query_keeps_distinct() {
    let mut q = Query::new();
    q.select(["team_id"])
        .distinct(true)
        .from("users")
        .filter(Expr::eq(Expr::field("active"), Expr::lit(true)))
        .order_by(OrderSpec::asc("team_id"))
        .limit(5);
    assert_eq!(
        q.count_query().sql().unwrap(),
        "SELECT COUNT(*) FROM (SELECT DISTINCT team_id FROM users WHERE active = TRUE) counted"
    );
}
