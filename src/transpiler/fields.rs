//! Field token grammar.
//!
//! A field token is one or more runs of quoted text (`'..'`, `".."`, `` `..` ``),
//! balanced parenthesized groups, or bare characters. Tokens are separated by
//! whitespace; `name`, `name alias` and `name AS alias` are the only accepted
//! shapes. Order specifications add `ASC|DESC` and `NULLS FIRST|LAST`.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, recognize},
    multi::{many0, many1, separated_list0},
    sequence::delimited,
    IResult,
};

use crate::ast::{Direction, Expr, Nulls, OrderSpec};
use crate::error::{WeaveError, WeaveResult};

/// A parsed select-list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldToken<'a> {
    pub name: &'a str,
    pub alias: Option<&'a str>,
}

fn quoted<'a>(quote: &'static str, doubled: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    recognize(delimited(
        tag(quote),
        many0(alt((is_not(quote), tag(doubled)))),
        tag(quote),
    ))
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    quoted("'", "''")(input)
}

fn double_quoted(input: &str) -> IResult<&str, &str> {
    quoted("\"", "\"\"")(input)
}

fn backtick_quoted(input: &str) -> IResult<&str, &str> {
    quoted("`", "``")(input)
}

/// `( ... )` with nesting, skipping parentheses inside quotes.
fn group(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('('),
        many0(alt((single_quoted, double_quoted, group, is_not("()'\"")))),
        char(')'),
    ))(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n()'\"`")(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    recognize(many1(alt((
        single_quoted,
        double_quoted,
        backtick_quoted,
        group,
        bare,
    ))))(input)
}

/// Split `text` into whitespace-separated field tokens.
pub fn tokenize(text: &str) -> WeaveResult<Vec<&str>> {
    all_consuming(delimited(
        multispace0,
        separated_list0(multispace1, token),
        multispace0,
    ))(text)
    .map(|(_, tokens)| tokens)
    .map_err(|_| WeaveError::MalformedField(text.to_string()))
}

/// True when every quote and parenthesis in `text` is balanced.
pub fn is_balanced(text: &str) -> bool {
    all_consuming(many1(alt((
        single_quoted,
        double_quoted,
        group,
        is_not("()'\""),
    ))))(text)
    .is_ok()
}

fn is_as(token: &str) -> bool {
    token.eq_ignore_ascii_case("AS")
}

/// Parse `name`, `name alias` or `name AS alias`.
pub fn parse_field(text: &str) -> WeaveResult<FieldToken<'_>> {
    let tokens = tokenize(text)?;
    match tokens[..] {
        [name] if !is_as(name) => Ok(FieldToken { name, alias: None }),
        [name, alias] if !is_as(name) && !is_as(alias) => Ok(FieldToken {
            name,
            alias: Some(alias),
        }),
        [name, kw, alias] if is_as(kw) && !is_as(name) && !is_as(alias) => Ok(FieldToken {
            name,
            alias: Some(alias),
        }),
        _ => Err(WeaveError::MalformedField(text.to_string())),
    }
}

/// Parse `field [ASC|DESC] [NULLS FIRST|LAST]`.
pub fn parse_order(text: &str) -> WeaveResult<OrderSpec> {
    let malformed = || WeaveError::MalformedField(text.to_string());
    let tokens = tokenize(text)?;
    let (field, rest) = tokens.split_first().ok_or_else(malformed)?;
    let upper: Vec<String> = rest.iter().map(|t| t.to_ascii_uppercase()).collect();
    let words: Vec<&str> = upper.iter().map(String::as_str).collect();

    let (direction, rest) = match words.as_slice() {
        ["ASC", rest @ ..] => (Direction::Asc, rest),
        ["DESC", rest @ ..] => (Direction::Desc, rest),
        rest => (Direction::Asc, rest),
    };
    let nulls = match rest {
        [] => None,
        ["NULLS", "FIRST"] => Some(Nulls::First),
        ["NULLS", "LAST"] => Some(Nulls::Last),
        _ => return Err(malformed()),
    };

    Ok(OrderSpec {
        expr: Expr::field(*field),
        direction,
        nulls,
    })
}

/// Already quoted, or an expression such as `COUNT(*)`: emitted as written.
pub fn is_verbatim(token: &str) -> bool {
    token.starts_with(['"', '`', '\'']) || token.contains('(')
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `:name` placeholder text.
pub fn is_named_placeholder(text: &str) -> bool {
    text.strip_prefix(':').is_some_and(is_identifier)
}
