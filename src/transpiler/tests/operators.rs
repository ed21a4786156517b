//! Operator table behavior: arity, folding, literals and shorthand.

use pretty_assertions::assert_eq;

use super::{render, render_with, x, y, z};
use crate::ast::operators::{self, Arity};
use crate::ast::{Expr, FieldValue, Query, Value};
use crate::error::WeaveError;
use crate::transpiler::Dialect;

fn operands(count: usize) -> Vec<Expr> {
    [x(), y(), z(), Expr::field("w")]
        .into_iter()
        .cycle()
        .take(count)
        .collect()
}

fn valid_count(arity: Arity) -> usize {
    match arity {
        Arity::Nullary => 0,
        Arity::UnaryPrefix | Arity::UnaryPostfix => 1,
        Arity::BinaryFixed | Arity::InList | Arity::Variadic | Arity::VendorCustom => 2,
        Arity::Ternary => 3,
    }
}

fn invalid_counts(name: &str, arity: Arity) -> Vec<usize> {
    match arity {
        Arity::Nullary => vec![1, 2],
        Arity::UnaryPrefix | Arity::UnaryPostfix => vec![0, 2],
        Arity::BinaryFixed => vec![0, 1, 3],
        Arity::Ternary => vec![0, 2, 4],
        Arity::InList => vec![0],
        Arity::Variadic => vec![],
        Arity::VendorCustom if name == "CASE" => vec![0, 1],
        Arity::VendorCustom => vec![1, 3],
    }
}

#[test]
fn test_every_operator_accepts_its_arity() {
    for spec in operators::all() {
        let expr = Expr::op(spec.name, operands(valid_count(spec.arity)));
        let result = render_with(Dialect::Postgres, &expr);
        assert!(result.is_ok(), "{} failed: {:?}", spec.name, result.err());
    }
}

#[test]
fn test_every_operator_rejects_bad_arity() {
    for spec in operators::all() {
        for count in invalid_counts(spec.name, spec.arity) {
            let expr = Expr::op(spec.name, operands(count));
            match render_with(Dialect::Postgres, &expr) {
                Err(WeaveError::Arity { op, got, expr: text, .. }) => {
                    assert_eq!(op, spec.name);
                    assert_eq!(got, count);
                    assert!(text.starts_with('['), "{} has no rendered expression", spec.name);
                }
                other => panic!("{} with {} operands gave {:?}", spec.name, count, other),
            }
        }
    }
}

#[test]
fn test_operator_shapes() {
    assert_eq!(render(&Expr::op("current_timestamp", [])), "CURRENT_TIMESTAMP");
    assert_eq!(render(&Expr::op("IS NULL", [x()])), "x IS NULL");
    assert_eq!(render(&Expr::op("not", [x()])), "NOT x");
    assert_eq!(
        render(&Expr::op("BETWEEN", [x(), Expr::lit(18), Expr::lit(65)])),
        "x BETWEEN 18 AND 65"
    );
    assert_eq!(
        render(&Expr::op("IN", [x(), Expr::lit(1), Expr::lit(2), Expr::lit(3)])),
        "x IN (1, 2, 3)"
    );
    assert_eq!(render(&Expr::binary("REGEXP", x(), Expr::lit("'^a'"))), "x ~ '^a'");
}

#[test]
fn test_unknown_operator() {
    let err = render_with(Dialect::Postgres, &Expr::op("~~~", [x(), y()])).unwrap_err();
    assert!(matches!(err, WeaveError::UnknownOperator { op, .. } if op == "~~~"));
}

#[test]
fn test_empty_in_list_is_constant() {
    assert_eq!(render(&Expr::op("IN", [x()])), "FALSE");
    assert_eq!(render(&Expr::op("NOT IN", [x()])), "TRUE");
}

#[test]
fn test_variadic_identities() {
    assert_eq!(render(&Expr::and([])), "TRUE");
    assert_eq!(render(&Expr::or([])), "FALSE");
    assert_eq!(render(&Expr::op("+", [])), "0");
    assert_eq!(render(&Expr::op("*", [])), "1");
    assert_eq!(render(&Expr::op("||", [])), "''");
}

#[test]
fn test_variadic_short_circuit() {
    let cond = || Expr::eq(x(), Expr::lit(1));
    assert_eq!(render(&Expr::and([cond(), Expr::lit(false)])), "FALSE");
    assert_eq!(render(&Expr::or([cond(), Expr::op("TRUE", [])])), "TRUE");
    assert_eq!(render(&Expr::and([Expr::truth(), cond()])), "x = 1");
    assert_eq!(
        render(&Expr::or([Expr::lit(false), cond(), Expr::eq(y(), Expr::lit(2))])),
        "x = 1 OR y = 2"
    );
}

#[test]
fn test_folded_operand_keeps_grouping() {
    // AND collapses to its OR operand, which must stay grouped inside the outer AND.
    let inner = Expr::and([Expr::truth(), Expr::or([x(), y()])]);
    assert_eq!(render(&Expr::and([inner, z()])), "(x OR y) AND z");
}

#[test]
fn test_nested_same_operator_needs_no_parens() {
    let expr = Expr::and([Expr::and([x(), y()]), z()]);
    assert_eq!(render(&expr), "x AND y AND z");
}

#[test]
fn test_strings_are_bound() {
    let (sql, params) =
        render_with(Dialect::Postgres, &Expr::eq(Expr::field("name"), Expr::lit("ann"))).unwrap();
    assert_eq!(sql, "name = :p1");
    assert_eq!(params.get("p1"), Some(&Value::from("ann")));
}

#[test]
fn test_verbatim_literals() {
    assert_eq!(render(&Expr::eq(x(), Expr::lit("'it''s'"))), "x = 'it''s'");
    assert_eq!(render(&Expr::eq(x(), Expr::lit("(1 + 2)"))), "x = (1 + 2)");
    assert_eq!(render(&Expr::eq(x(), Expr::lit(":min"))), "x = :min");
    assert_eq!(render(&Expr::eq(x(), Expr::lit("?"))), "x = ?");
    assert_eq!(render(&Expr::eq(x(), Expr::lit(Value::Null))), "x = NULL");
    assert_eq!(render(&Expr::eq(x(), Expr::lit(1.5))), "x = 1.5");
}

#[test]
fn test_bad_literals() {
    for value in [Value::from("'open"), Value::from("(1 + 2"), Value::Float(f64::NAN)] {
        let err = render_with(Dialect::Postgres, &Expr::eq(x(), Expr::lit(value))).unwrap_err();
        assert!(matches!(err, WeaveError::InvalidValue(_)), "{:?}", err);
    }
}

#[test]
fn test_functions() {
    assert_eq!(render(&Expr::func("count", [Expr::field("*")])), "COUNT(*)");
    assert_eq!(
        render(&Expr::func("coalesce", [x(), Expr::lit(0)])),
        "COALESCE(x, 0)"
    );
    assert!(render_with(Dialect::Postgres, &Expr::func("drop table", [])).is_err());
}

#[test]
fn test_case_operator() {
    let expr = Expr::op(
        "CASE",
        [
            Expr::binary(">", x(), Expr::lit(1)),
            Expr::lit("'big'"),
            Expr::lit("'small'"),
        ],
    );
    assert_eq!(render(&expr), "CASE WHEN x > 1 THEN 'big' ELSE 'small' END");
}

#[test]
fn test_ilike_per_dialect() {
    let expr = Expr::op("ILIKE", [Expr::field("name"), Expr::param("q")]);
    assert_eq!(render(&expr), "name ILIKE :q");
    let (sql, _) = render_with(Dialect::SQLite, &expr).unwrap();
    assert_eq!(sql, "LOWER(\"name\") LIKE LOWER(:q)");
}

#[test]
fn test_unsupported_operator() {
    let expr = Expr::op("||", [x(), y()]);
    let err = render_with(Dialect::MySQL, &expr).unwrap_err();
    assert!(matches!(err, WeaveError::Unsupported { op, dialect: "mysql" } if op == "||"));
}

#[test]
fn test_shorthand_fields() {
    let expr = Expr::fields([
        ("name", FieldValue::from("ann")),
        ("deleted_at", FieldValue::Null),
        ("team_id", FieldValue::from(vec![Value::from(1), Value::from(2)])),
        ("manager_id", FieldValue::from(Vec::<Value>::new())),
    ]);
    let (sql, params) = render_with(Dialect::Postgres, &expr).unwrap();
    assert_eq!(
        sql,
        "name = :p1 AND deleted_at IS NULL AND team_id IN (:p2, :p3) AND manager_id IS NULL"
    );
    assert_eq!(params.len(), 3);
    assert_eq!(params.get("p3"), Some(&Value::Int(2)));
}

#[test]
fn test_shorthand_subquery() {
    let mut admins = Query::new();
    admins.select(["user_id"]).from("admins");
    let expr = Expr::fields([("id", FieldValue::from(admins))]);
    assert_eq!(render(&expr), "id IN (SELECT user_id FROM admins)");
}

#[test]
fn test_shorthand_single_field_in_or() {
    let expr = Expr::or([Expr::fields([("a", FieldValue::from(1))]), Expr::field("b")]);
    assert_eq!(render(&expr), "a = :p1 OR b");
}

#[test]
fn test_param_names_are_validated() {
    let err = render_with(Dialect::Postgres, &Expr::param("a; DROP")).unwrap_err();
    assert!(matches!(err, WeaveError::InvalidValue(_)));
}
