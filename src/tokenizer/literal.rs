use nom::{
    branch::alt,
    character::complete::{anychar, char, digit1},
    combinator::{map, map_res, recognize, verify},
    error::context,
    multi::many0,
    sequence::{delimited, preceded, tuple},
};

use super::token::{ParserResult, Token};

/// Literal values in component source.
///
/// String contents are stored unescaped-as-written; the emitter reproduces
/// literals from the original source slice, so the stored value is only used
/// when a rule needs to inspect it (for example the framework import path).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `"…"` or `'…'`
    Str(String),
    /// `` `…` `` captured raw, interpolations included
    Template(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

fn quoted(quote: char) -> impl Fn(&str) -> ParserResult<String> {
    move |input: &str| {
        map(
            delimited(
                char(quote),
                recognize(many0(alt((
                    recognize(preceded(char('\\'), anychar)),
                    recognize(verify(anychar, |c| *c != quote && *c != '\\')),
                )))),
                char(quote),
            ),
            |content: &str| content.to_string(),
        )(input)
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(alt((quoted('"'), quoted('\''))), Literal::Str),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_template_literal(input: &str) -> ParserResult<Literal> {
    context(
        "template literal",
        map(quoted('`'), Literal::Template),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_float_literal(input: &str) -> ParserResult<Literal> {
    context(
        "float literal",
        map_res(
            recognize(tuple((digit1, char('.'), digit1))),
            |s: &str| s.parse::<f64>().map(Literal::Float),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer_literal(input: &str) -> ParserResult<Literal> {
    // No sign here: `-` stays an operator so `count-1` keeps stable token
    // boundaries.
    context(
        "integer literal",
        map_res(recognize(digit1), |s: &str| {
            s.parse::<i64>().map(Literal::Integer)
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                parse_string_literal,
                parse_template_literal,
                parse_float_literal,
                parse_integer_literal,
            )),
            Token::Literal,
        ),
    )(input)
}

/// Word-shaped literals, checked by the identifier parser after the word has
/// been consumed.
pub fn keyword_literal(word: &str) -> Option<Literal> {
    match word {
        "true" => Some(Literal::Boolean(true)),
        "false" => Some(Literal::Boolean(false)),
        "null" => Some(Literal::Null),
        _ => None,
    }
}
