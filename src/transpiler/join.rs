//! JOIN type grammar and clause rendering.
//!
//! ```text
//! join_type := CROSS
//!            | NATURAL [ INNER | side [OUTER] ]
//!            | INNER
//!            | side [OUTER]
//!            ( [JOIN] )
//! side      := LEFT | RIGHT | FULL
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::multispace0,
    combinator::{all_consuming, map, opt, value},
    error::{Error, ErrorKind},
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::ast::{Expr, JoinOn, JoinSpec, LOOSEST};
use crate::error::{WeaveError, WeaveResult};

use super::dml::table_sql;
use super::{Compiler, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Inner,
    Left,
    Right,
    Full,
}

/// A validated join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinType {
    pub cross: bool,
    pub natural: bool,
    pub side: Option<JoinSide>,
    pub outer: bool,
}

impl JoinType {
    /// CROSS and NATURAL joins take no ON clause; everything else requires one.
    pub fn requires_on(&self) -> bool {
        !self.cross && !self.natural
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cross {
            return write!(f, "CROSS JOIN");
        }
        if self.natural {
            write!(f, "NATURAL ")?;
        }
        match self.side {
            Some(JoinSide::Inner) => write!(f, "INNER ")?,
            Some(JoinSide::Left) => write!(f, "LEFT ")?,
            Some(JoinSide::Right) => write!(f, "RIGHT ")?,
            Some(JoinSide::Full) => write!(f, "FULL ")?,
            None => {}
        }
        if self.outer {
            write!(f, "OUTER ")?;
        }
        write!(f, "JOIN")
    }
}

/// Case-insensitive keyword that must end at a word boundary.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = preceded(multispace0, tag_no_case(word))(input)?;
        if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
        }
        Ok((rest, matched))
    }
}

fn side(input: &str) -> IResult<&str, (JoinSide, bool)> {
    alt((
        map(keyword("INNER"), |_| (JoinSide::Inner, false)),
        map(
            pair(
                alt((
                    value(JoinSide::Left, keyword("LEFT")),
                    value(JoinSide::Right, keyword("RIGHT")),
                    value(JoinSide::Full, keyword("FULL")),
                )),
                opt(keyword("OUTER")),
            ),
            |(side, outer)| (side, outer.is_some()),
        ),
    ))(input)
}

fn join_type(input: &str) -> IResult<&str, JoinType> {
    let plain = |natural: bool, side: Option<(JoinSide, bool)>| JoinType {
        cross: false,
        natural,
        side: side.map(|(s, _)| s),
        outer: side.is_some_and(|(_, o)| o),
    };
    terminated(
        alt((
            map(keyword("CROSS"), |_| JoinType {
                cross: true,
                natural: false,
                side: None,
                outer: false,
            }),
            map(preceded(keyword("NATURAL"), opt(side)), move |s| plain(true, s)),
            map(side, move |s| plain(false, Some(s))),
        )),
        pair(opt(keyword("JOIN")), multispace0),
    )(input)
}

/// Parse and validate a join type string such as `"left outer"`.
pub fn parse_join_type(text: &str) -> WeaveResult<JoinType> {
    all_consuming(join_type)(text)
        .map(|(_, join)| join)
        .map_err(|_| WeaveError::InvalidJoinType(text.to_string()))
}

/// ` <TYPE> JOIN <table> [alias] [ON <cond>]`.
///
/// `primary` is the alias field-map conditions qualify their local side with.
pub fn build_join(
    cx: &mut Compiler,
    join: &JoinSpec,
    alias: Option<&str>,
    primary: Option<&str>,
    scope: &Scope,
) -> WeaveResult<String> {
    let kind = parse_join_type(&join.kind)?;
    let target = table_sql(cx, &join.table, alias)?;
    let label = alias.or(join.table.name()).unwrap_or("subquery").to_string();

    match (&join.on, kind.requires_on()) {
        (None, true) => Err(WeaveError::JoinCondition {
            table: label,
            message: "this join type requires an ON condition",
        }),
        (Some(_), false) => Err(WeaveError::JoinCondition {
            table: label,
            message: "CROSS and NATURAL joins take no ON condition",
        }),
        (None, false) => Ok(format!(" {} {}", kind, target)),
        (Some(on), true) => {
            let condition = match on {
                JoinOn::Expr(expr) => cx.expr(expr, scope, LOOSEST)?,
                JoinOn::Fields(pairs) => {
                    let expr = field_map_condition(pairs, primary, &label);
                    cx.expr(&expr, scope, LOOSEST)?
                }
            };
            Ok(format!(" {} {} ON {}", kind, target, condition))
        }
    }
}

/// `{local: foreign}` -> `primary.local = joined.foreign AND ...`.
fn field_map_condition(pairs: &[(String, String)], primary: Option<&str>, joined: &str) -> Expr {
    Expr::and(pairs.iter().map(|(local, foreign)| {
        Expr::eq(
            Expr::field(qualify(primary, local)),
            Expr::field(qualify(Some(joined), foreign)),
        )
    }))
}

fn qualify(alias: Option<&str>, name: &str) -> String {
    match alias {
        Some(alias) if !name.contains('.') => format!("{}.{}", alias, name),
        _ => name.to_string(),
    }
}
