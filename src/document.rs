//! JSON query documents.
//!
//! The CLI reads queries as JSON:
//!
//! ```json
//! {
//!   "fields": ["title", "user.name AS author"],
//!   "from": "course",
//!   "joins": [{"table": "user", "type": "LEFT", "on": {"creator": "id"}}],
//!   "where": ["AND", {"published": true}, [">=", "created", ":since"]],
//!   "order": ["created DESC NULLS LAST"],
//!   "limit": 10,
//!   "params": {"since": "2024-01-01"}
//! }
//! ```
//!
//! Inside expressions a string is a field reference (`":name"` and `"?"` are
//! placeholders, `'quoted'` and `(parenthesized)` text is emitted as written),
//! other scalars are literals, `[op, ...]` applies an operator,
//! `["NAME()", ...]` calls a function, `{"$value": v}` is a literal string,
//! `{"$query": {...}}` a subquery and any other object the `{field: value}`
//! shorthand.

use serde_json::{Map, Value as Json};

use crate::ast::{
    Direction, Expr, FieldValue, JoinOn, Nulls, OrderSpec, Query, TableMeta, TableRef, Value,
};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::fields;
use crate::transpiler::Dialect;

const KEYS: &[&str] = &[
    "type", "distinct", "fields", "from", "joins", "where", "group", "having", "order", "limit",
    "offset", "values", "rows", "select", "set", "params",
];

fn err(message: impl Into<String>) -> WeaveError {
    WeaveError::Document(message.into())
}

/// Parse a JSON document into a query for `dialect`.
pub fn parse(text: &str, dialect: Dialect) -> WeaveResult<Query> {
    let json: Json = serde_json::from_str(text).map_err(|e| err(e.to_string()))?;
    build(&json, dialect)
}

/// Build a query from an already-parsed JSON document.
pub fn build(json: &Json, dialect: Dialect) -> WeaveResult<Query> {
    let doc = json
        .as_object()
        .ok_or_else(|| err("a query document must be a JSON object"))?;
    if let Some(key) = doc.keys().find(|k| !KEYS.contains(&k.as_str())) {
        return Err(err(format!("unknown key '{}'", key)));
    }

    let mut query = Query::with_dialect(dialect);
    let kind = doc.get("type").map(as_str).transpose()?.unwrap_or("select");
    match kind.to_ascii_lowercase().as_str() {
        "select" => select(&mut query, doc, dialect)?,
        "insert" => insert(&mut query, doc, dialect)?,
        "update" => update(&mut query, doc, dialect)?,
        "delete" => {
            query.delete_from(table(single_table(doc)?, dialect)?);
        }
        other => return Err(err(format!("unknown statement type '{}'", other))),
    }

    if let Some(condition) = doc.get("where") {
        query.filter(expr(condition, dialect)?);
    }
    if let Some(params) = doc.get("params") {
        for (name, value) in object(params, "params")? {
            query.bind(name.as_str(), scalar(value)?);
        }
    }
    Ok(query)
}

fn select(query: &mut Query, doc: &Map<String, Json>, dialect: Dialect) -> WeaveResult<()> {
    if let Some(fields) = doc.get("fields") {
        for item in list(fields) {
            match item {
                Json::Object(map) if map.contains_key("expr") => {
                    let target = expr(&map["expr"], dialect)?;
                    let alias = map.get("as").map(as_str).transpose()?;
                    query.select_expr(target, alias);
                }
                other => {
                    query.select_expr(expr(other, dialect)?, None);
                }
            }
        }
    }
    if doc.get("distinct").and_then(Json::as_bool).unwrap_or(false) {
        query.distinct(true);
    }
    if let Some(from) = doc.get("from") {
        for (i, entry) in list(from).into_iter().enumerate() {
            let entry = table(entry, dialect)?;
            if i == 0 {
                query.from(entry);
            } else {
                query.add_from(entry);
            }
        }
    }
    if let Some(joins) = doc.get("joins") {
        for join in list(joins) {
            let spec = object(join, "join")?;
            let kind = spec.get("type").map(as_str).transpose()?.unwrap_or("INNER");
            let on = spec.get("on").map(|on| join_on(on, dialect)).transpose()?;
            query.join(table(join, dialect)?, kind, on);
        }
    }
    if let Some(groups) = doc.get("group") {
        for group in list(groups) {
            query.group_by(expr(group, dialect)?);
        }
    }
    if let Some(having) = doc.get("having") {
        query.having(expr(having, dialect)?);
    }
    if let Some(orders) = doc.get("order") {
        for order in list(orders) {
            query.order_by(order_spec(order, dialect)?);
        }
    }
    if let Some(limit) = doc.get("limit") {
        query.limit(unsigned(limit, "limit")?);
    }
    if let Some(offset) = doc.get("offset") {
        query.offset(unsigned(offset, "offset")?);
    }
    Ok(())
}

fn insert(query: &mut Query, doc: &Map<String, Json>, dialect: Dialect) -> WeaveResult<()> {
    query.insert_into(table(single_table(doc)?, dialect)?);
    let columns = match doc.get("fields") {
        Some(fields) => list(fields)
            .into_iter()
            .map(|f| as_str(f).map(str::to_string))
            .collect::<WeaveResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    if let Some(values) = doc.get("values") {
        let values = object(values, "values")?;
        if values.values().all(is_scalar) {
            let pairs = values
                .iter()
                .map(|(k, v)| Ok((k.clone(), scalar(v)?)))
                .collect::<WeaveResult<Vec<_>>>()?;
            query.values(pairs);
        } else {
            let pairs = values
                .iter()
                .map(|(k, v)| {
                    let value = match Value::from_json(v) {
                        Some(literal) => Expr::Literal(literal),
                        None => expr(v, dialect)?,
                    };
                    Ok((k.clone(), value))
                })
                .collect::<WeaveResult<Vec<_>>>()?;
            query.value_exprs(pairs);
        }
    } else if let Some(rows) = doc.get("rows") {
        let rows = list(rows)
            .into_iter()
            .map(|row| list(row).into_iter().map(scalar).collect::<WeaveResult<Vec<_>>>())
            .collect::<WeaveResult<Vec<_>>>()?;
        query.rows(columns, rows);
    } else if let Some(select) = doc.get("select") {
        query.insert_select(columns, build(select, dialect)?);
    }
    Ok(())
}

fn update(query: &mut Query, doc: &Map<String, Json>, dialect: Dialect) -> WeaveResult<()> {
    let mut tables = doc.get("from").map(list).unwrap_or_default().into_iter();
    let target = tables.next().ok_or_else(|| err("UPDATE needs a 'from' table"))?;
    query.update(table(target, dialect)?);
    for other in tables {
        query.add_from(table(other, dialect)?);
    }
    if let Some(set) = doc.get("set") {
        for (field, value) in object(set, "set")? {
            query.set(field.as_str(), expr(value, dialect)?);
        }
    }
    Ok(())
}

/// Parse one expression.
pub fn expr(json: &Json, dialect: Dialect) -> WeaveResult<Expr> {
    match json {
        Json::String(text) => Ok(string_expr(text)),
        Json::Array(items) => {
            let (head, rest) = items
                .split_first()
                .ok_or_else(|| err("an operator list needs an operator name"))?;
            let name = as_str(head)?;
            let operands = rest
                .iter()
                .map(|item| expr(item, dialect))
                .collect::<WeaveResult<Vec<_>>>()?;
            match name.strip_suffix("()") {
                Some(function) => Ok(Expr::func(function, operands)),
                None => Ok(Expr::op(name, operands)),
            }
        }
        Json::Object(map) => {
            if let Some(value) = map.get("$value") {
                return Ok(Expr::Literal(scalar(value)?));
            }
            if let Some(sub) = map.get("$query") {
                return Ok(Expr::subquery(build(sub, dialect)?));
            }
            let pairs = map
                .iter()
                .map(|(field, value)| Ok((field.clone(), field_value(value, dialect)?)))
                .collect::<WeaveResult<Vec<_>>>()?;
            Ok(Expr::Fields(pairs))
        }
        other => Value::from_json(other)
            .map(Expr::Literal)
            .ok_or_else(|| err(format!("cannot read {} as an expression", other))),
    }
}

fn string_expr(text: &str) -> Expr {
    if let Some(name) = text.strip_prefix(':').filter(|n| fields::is_identifier(n)) {
        Expr::param(name)
    } else if text == "?" || text.starts_with(['\'', '(']) {
        Expr::Literal(Value::String(text.to_string()))
    } else {
        Expr::field(text)
    }
}

fn field_value(json: &Json, dialect: Dialect) -> WeaveResult<FieldValue> {
    match json {
        Json::Null => Ok(FieldValue::Null),
        Json::Array(items) => Ok(FieldValue::List(
            items.iter().map(scalar).collect::<WeaveResult<Vec<_>>>()?,
        )),
        Json::Object(map) => match map.get("$query") {
            Some(sub) => Ok(FieldValue::Subquery(Box::new(build(sub, dialect)?))),
            None => Err(err("shorthand values must be scalars, lists or {\"$query\": ...}")),
        },
        other => Ok(FieldValue::Value(scalar(other)?)),
    }
}

/// `"users"`, `"users u"`, `{"table": "users", "as": "u", "attributes": [...]}`
/// or `{"$query": {...}, "as": "recent"}`.
fn table(json: &Json, dialect: Dialect) -> WeaveResult<TableRef> {
    match json {
        Json::String(text) => {
            let token = fields::parse_field(text)?;
            let table = TableRef::table(token.name);
            Ok(match token.alias {
                Some(alias) => table.alias(alias),
                None => table,
            })
        }
        Json::Object(map) => {
            let mut table = if let Some(sub) = map.get("$query") {
                TableRef::subquery(build(sub, dialect)?)
            } else {
                let name = map
                    .get("table")
                    .ok_or_else(|| err("a table entry needs 'table' or '$query'"))?;
                let meta = TableMeta::new(as_str(name)?)
                    .with_attributes(strings(map.get("attributes"))?)
                    .with_primary_key(strings(map.get("primary_key"))?);
                TableRef::meta(meta)
            };
            if let Some(alias) = map.get("as") {
                table = table.alias(as_str(alias)?);
            }
            Ok(table)
        }
        other => Err(err(format!("cannot read {} as a table", other))),
    }
}

fn single_table(doc: &Map<String, Json>) -> WeaveResult<&Json> {
    match doc.get("from").map(list).as_deref() {
        Some([table]) => Ok(*table),
        _ => Err(err("statement needs exactly one 'from' table")),
    }
}

/// An object of strings is a `local: foreign` field map; anything else an expression.
fn join_on(json: &Json, dialect: Dialect) -> WeaveResult<JoinOn> {
    match json {
        Json::Object(map) if !map.is_empty() && map.values().all(Json::is_string) => {
            let pairs = map
                .iter()
                .map(|(local, foreign)| Ok((local.clone(), as_str(foreign)?.to_string())))
                .collect::<WeaveResult<Vec<_>>>()?;
            Ok(JoinOn::Fields(pairs))
        }
        other => Ok(JoinOn::Expr(expr(other, dialect)?)),
    }
}

/// `"name DESC NULLS LAST"` or `{"expr": ..., "desc": true, "nulls": "last"}`.
fn order_spec(json: &Json, dialect: Dialect) -> WeaveResult<OrderSpec> {
    match json {
        Json::String(text) => OrderSpec::parse(text),
        Json::Object(map) => {
            let target = map
                .get("expr")
                .ok_or_else(|| err("an order entry needs 'expr'"))?;
            let direction = if map.get("desc").and_then(Json::as_bool).unwrap_or(false) {
                Direction::Desc
            } else {
                Direction::Asc
            };
            let nulls = match map.get("nulls").map(as_str).transpose()? {
                None => None,
                Some(n) if n.eq_ignore_ascii_case("first") => Some(Nulls::First),
                Some(n) if n.eq_ignore_ascii_case("last") => Some(Nulls::Last),
                Some(n) => return Err(err(format!("unknown nulls ordering '{}'", n))),
            };
            Ok(OrderSpec {
                expr: expr(target, dialect)?,
                direction,
                nulls,
            })
        }
        other => Err(err(format!("cannot read {} as an order", other))),
    }
}

fn list(json: &Json) -> Vec<&Json> {
    match json {
        Json::Array(items) => items.iter().collect(),
        single => vec![single],
    }
}

fn object<'a>(json: &'a Json, what: &str) -> WeaveResult<&'a Map<String, Json>> {
    json.as_object()
        .ok_or_else(|| err(format!("'{}' must be an object", what)))
}

fn as_str(json: &Json) -> WeaveResult<&str> {
    json.as_str()
        .ok_or_else(|| err(format!("expected a string, got {}", json)))
}

fn strings(json: Option<&Json>) -> WeaveResult<Vec<String>> {
    json.map(list)
        .unwrap_or_default()
        .into_iter()
        .map(|s| as_str(s).map(str::to_string))
        .collect()
}

fn is_scalar(json: &Json) -> bool {
    !matches!(json, Json::Array(_) | Json::Object(_))
}

fn scalar(json: &Json) -> WeaveResult<Value> {
    Value::from_json(json).ok_or_else(|| err(format!("expected a scalar, got {}", json)))
}

fn unsigned(json: &Json, what: &str) -> WeaveResult<u64> {
    json.as_u64()
        .ok_or_else(|| err(format!("'{}' must be a non-negative integer", what)))
}
