//! Expression compilation.
//!
//! Every fragment is compiled against the precedence rank of the operator
//! that will contain it; an operator fragment is parenthesized only when it
//! binds looser than that context.

use tracing::trace;

use crate::ast::operators::{self, Arity, OperatorSpec, LOOSEST};
use crate::ast::{Expr, FieldValue, Value};
use crate::error::{WeaveError, WeaveResult};

use super::fields::{self, is_balanced, is_identifier, is_named_placeholder, is_verbatim};
use super::traits::unsupported;
use super::{Compiler, Scope};

impl<'g> Compiler<'g> {
    /// Compile `expr` for a position whose surrounding operator has rank `context`.
    pub fn expr(&mut self, expr: &Expr, scope: &Scope, context: usize) -> WeaveResult<String> {
        match expr {
            Expr::Literal(value) => self.literal(value),
            Expr::Field { name, .. } => {
                let token = fields::parse_field(name)?;
                Ok(self.field_name(token.name, scope))
            }
            Expr::Param(name) => {
                if !is_identifier(name) {
                    return Err(WeaveError::InvalidValue(format!(
                        "parameter name '{}'",
                        name
                    )));
                }
                Ok(format!(":{}", name))
            }
            Expr::Op { op, operands } => self.operator(expr, op, operands, scope, context),
            Expr::Func { name, args } => self.function(name, args, scope),
            Expr::Subquery(query) => self.subquery(query),
            Expr::Fields(pairs) => self.shorthand(pairs, scope, context),
        }
    }

    /// Render a literal. Strings that are not already SQL become parameters.
    pub fn literal(&mut self, value: &Value) -> WeaveResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(true) => Ok("TRUE".to_string()),
            Value::Bool(false) => Ok("FALSE".to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) if !f.is_finite() => {
                Err(WeaveError::InvalidValue(format!("non-finite number {}", f)))
            }
            Value::Float(f) => Ok(f.to_string()),
            Value::String(s) if s == "?" || is_named_placeholder(s) => Ok(s.clone()),
            Value::String(s) if s.starts_with('\'') || s.starts_with('(') => {
                if is_balanced(s) {
                    Ok(s.clone())
                } else {
                    Err(WeaveError::InvalidValue(format!("unbalanced literal {}", s)))
                }
            }
            Value::String(_) => Ok(format!(":{}", self.binder.lift(value.clone()))),
        }
    }

    /// Inline literal for contexts without parameters.
    pub fn inline_literal(&self, value: &Value) -> WeaveResult<String> {
        match value {
            Value::Float(f) if !f.is_finite() => {
                Err(WeaveError::InvalidValue(format!("non-finite number {}", f)))
            }
            _ => Ok(self.generator.quote_literal(value)),
        }
    }

    /// Quote a column reference, qualifying it with the scope alias when
    /// several tables are visible.
    pub fn field_name(&self, name: &str, scope: &Scope) -> String {
        if name == "*" || is_verbatim(name) {
            return name.to_string();
        }
        if name.contains('.') {
            return self.dotted(name);
        }
        let quoted = self.generator.quote_identifier(name);
        match scope.qualifier() {
            Some(alias) => format!("{}.{}", self.generator.quote_identifier(alias), quoted),
            None => quoted,
        }
    }

    /// Quote each part of `schema.table` or `alias.column`.
    pub fn dotted(&self, name: &str) -> String {
        name.split('.')
            .map(|part| {
                if part == "*" || is_verbatim(part) {
                    part.to_string()
                } else {
                    self.generator.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote an output alias unless it is already quoted.
    pub fn alias_name(&self, alias: &str) -> String {
        if is_verbatim(alias) {
            alias.to_string()
        } else {
            self.generator.quote_identifier(alias)
        }
    }

    fn function(&mut self, name: &str, args: &[Expr], scope: &Scope) -> WeaveResult<String> {
        if !name.split('.').all(is_identifier) {
            return Err(WeaveError::MalformedField(name.to_string()));
        }
        let args = args
            .iter()
            .map(|arg| self.expr(arg, scope, LOOSEST))
            .collect::<WeaveResult<Vec<_>>>()?;
        Ok(format!("{}({})", name.to_uppercase(), args.join(", ")))
    }

    fn op_name(&self, spec: &OperatorSpec) -> WeaveResult<&'static str> {
        self.generator
            .operator_name(spec.name)
            .ok_or_else(|| unsupported(spec.name, self.generator))
    }

    fn operator(
        &mut self,
        expr: &Expr,
        op: &str,
        operands: &[Expr],
        scope: &Scope,
        context: usize,
    ) -> WeaveResult<String> {
        let spec = operators::lookup(op).ok_or_else(|| WeaveError::unknown_operator(op, expr))?;
        if !spec.arity.accepts(operands.len()) {
            return Err(WeaveError::arity(
                spec.name,
                spec.arity.expected(),
                operands.len(),
                expr,
            ));
        }
        let rank = spec.rank;

        let sql = match spec.arity {
            Arity::Nullary => return Ok(self.op_name(&spec)?.to_string()),
            Arity::Variadic => return self.variadic(&spec, operands, scope, context),
            Arity::InList => return self.in_list(&spec, operands, scope, context),
            Arity::UnaryPrefix => {
                let name = self.op_name(&spec)?;
                format!("{} {}", name, self.expr(&operands[0], scope, rank)?)
            }
            Arity::UnaryPostfix => {
                let name = self.op_name(&spec)?;
                let operand = self.expr(&operands[0], scope, operators::left_context(rank))?;
                format!("{} {}", operand, name)
            }
            Arity::BinaryFixed => {
                let name = self.op_name(&spec)?;
                let left = self.expr(&operands[0], scope, operators::left_context(rank))?;
                let right_context = operators::tier_start(rank).saturating_sub(1);
                let right = self.expr(&operands[1], scope, right_context)?;
                format!("{} {} {}", left, name, right)
            }
            Arity::Ternary => {
                let name = self.op_name(&spec)?;
                let subject = self.expr(&operands[0], scope, operators::left_context(rank))?;
                let low = self.expr(&operands[1], scope, rank)?;
                let high = self.expr(&operands[2], scope, rank)?;
                format!("{} {} {} AND {}", subject, name, low, high)
            }
            Arity::VendorCustom => {
                let compiled = operands
                    .iter()
                    .map(|operand| self.expr(operand, scope, operators::left_context(rank)))
                    .collect::<WeaveResult<Vec<_>>>()?;
                self.generator
                    .custom_operator(spec.name, &compiled)
                    .ok_or_else(|| unsupported(spec.name, self.generator))?
                    .map_err(|err| match err {
                        WeaveError::Arity { op, expected, got, .. } => WeaveError::Arity {
                            op,
                            expected,
                            got,
                            expr: expr.to_string(),
                        },
                        other => other,
                    })?
            }
        };
        Ok(wrap(sql, rank, context))
    }

    /// Fold a variadic operator: constants short-circuit, identities drop out.
    fn variadic(
        &mut self,
        spec: &OperatorSpec,
        operands: &[Expr],
        scope: &Scope,
        context: usize,
    ) -> WeaveResult<String> {
        let name = self.op_name(spec)?;
        let mut parts: Vec<(String, bool)> = Vec::with_capacity(operands.len());
        for operand in operands {
            let sql = self.expr(operand, scope, spec.rank)?;
            match (spec.name, bool_constant(&sql)) {
                ("AND", Some(false)) => return Ok("FALSE".to_string()),
                ("OR", Some(true)) => return Ok("TRUE".to_string()),
                ("AND", Some(true)) | ("OR", Some(false)) => continue,
                _ => parts.push((sql, is_atomic(operand))),
            }
        }
        trace!(op = spec.name, kept = parts.len(), "folded variadic");

        match parts.len() {
            0 => Ok(operators::identity(spec.name).unwrap_or("NULL").to_string()),
            1 => {
                let (sql, atomic) = parts.remove(0);
                Ok(if atomic || is_enclosed(&sql) {
                    sql
                } else {
                    wrap(sql, spec.rank, context)
                })
            }
            _ => {
                let joined = parts
                    .into_iter()
                    .map(|(sql, _)| sql)
                    .collect::<Vec<_>>()
                    .join(&format!(" {} ", name));
                Ok(wrap(joined, spec.rank, context))
            }
        }
    }

    /// `left IN (a, b)`, `left IN (SELECT ...)`, or a constant for an empty list.
    fn in_list(
        &mut self,
        spec: &OperatorSpec,
        operands: &[Expr],
        scope: &Scope,
        context: usize,
    ) -> WeaveResult<String> {
        let name = self.op_name(spec)?;
        let negated = spec.name == "NOT IN";
        let (subject, items) = match operands.split_first() {
            Some(split) => split,
            None => return Err(WeaveError::arity(spec.name, spec.arity.expected(), 0, "")),
        };
        if items.is_empty() {
            return Ok(if negated { "TRUE" } else { "FALSE" }.to_string());
        }
        let left = self.expr(subject, scope, operators::left_context(spec.rank))?;
        let sql = match items {
            [Expr::Subquery(query)] => format!("{} {} {}", left, name, self.subquery(query)?),
            _ => {
                let items = items
                    .iter()
                    .map(|item| self.expr(item, scope, LOOSEST))
                    .collect::<WeaveResult<Vec<_>>>()?;
                format!("{} {} ({})", left, name, items.join(", "))
            }
        };
        Ok(wrap(sql, spec.rank, context))
    }

    /// `{field: value, ...}` as an implicit AND.
    fn shorthand(
        &mut self,
        pairs: &[(String, FieldValue)],
        scope: &Scope,
        context: usize,
    ) -> WeaveResult<String> {
        let mut conditions = Vec::with_capacity(pairs.len());
        for (field, value) in pairs {
            let target = Expr::field(field.as_str());
            let condition = match value {
                FieldValue::Null | FieldValue::Value(Value::Null) => {
                    Expr::op("IS NULL", [target])
                }
                FieldValue::List(items) if items.is_empty() => Expr::op("IS NULL", [target]),
                FieldValue::List(items) => {
                    let mut operands = vec![target];
                    for item in items {
                        operands.push(Expr::Param(self.binder.lift(item.clone())));
                    }
                    Expr::op("IN", operands)
                }
                FieldValue::Subquery(query) => {
                    Expr::op("IN", [target, Expr::Subquery(query.clone())])
                }
                FieldValue::Value(v) => Expr::eq(target, Expr::Param(self.binder.lift(v.clone()))),
            };
            conditions.push(condition);
        }
        self.expr(&Expr::and(conditions), scope, context)
    }
}

fn wrap(sql: String, rank: usize, context: usize) -> String {
    if rank > context {
        format!("({})", sql)
    } else {
        sql
    }
}

fn bool_constant(sql: &str) -> Option<bool> {
    match sql {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// True when the whole fragment sits inside one pair of parentheses.
fn is_enclosed(sql: &str) -> bool {
    if !sql.starts_with('(') || !sql.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in sql.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == sql.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Fragments that never need parentheses.
fn is_atomic(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) | Expr::Field { .. } | Expr::Param(_) | Expr::Func { .. } => true,
        Expr::Subquery(_) => true,
        Expr::Op { operands, .. } => operands.is_empty(),
        Expr::Fields(_) => false,
    }
}
