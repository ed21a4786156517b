//! Builders for vendor-custom operators.
//!
//! Dialects reach these through [`SqlGenerator::custom_operator`](super::SqlGenerator::custom_operator)
//! and may override any of them. Operands arrive already compiled.

use crate::error::{WeaveError, WeaveResult};

/// `CASE WHEN c1 THEN v1 [WHEN c2 THEN v2 ...] [ELSE e] END`.
///
/// Operands are `[c1, v1, c2, v2, ..., else?]`; a trailing odd operand is the ELSE.
pub fn build_case(operands: &[String]) -> WeaveResult<String> {
    if operands.len() < 2 {
        return Err(WeaveError::arity("CASE", "at least 2", operands.len(), ""));
    }
    let mut sql = String::from("CASE");
    let mut pairs = operands.chunks_exact(2);
    for pair in pairs.by_ref() {
        sql.push_str(&format!(" WHEN {} THEN {}", pair[0], pair[1]));
    }
    if let [otherwise] = pairs.remainder() {
        sql.push_str(&format!(" ELSE {}", otherwise));
    }
    sql.push_str(" END");
    Ok(sql)
}

/// Native `a ILIKE b`.
pub fn build_ilike_native(operands: &[String]) -> WeaveResult<String> {
    match operands {
        [left, right] => Ok(format!("{} ILIKE {}", left, right)),
        _ => Err(WeaveError::arity("ILIKE", "2", operands.len(), "")),
    }
}

/// Case-insensitive match for dialects without ILIKE.
pub fn build_ilike_lower(operands: &[String]) -> WeaveResult<String> {
    match operands {
        [left, right] => Ok(format!("LOWER({}) LIKE LOWER({})", left, right)),
        _ => Err(WeaveError::arity("ILIKE", "2", operands.len(), "")),
    }
}
