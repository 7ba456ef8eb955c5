//! # Symbol Token Handling
//!
//! This module defines the symbols (operators and delimiters) recognized in
//! component source and provides functionality for parsing symbol tokens.
//!
//! ## Symbol Types
//!
//! Symbols are divided into two main categories:
//!
//! * [`Operator`]: arithmetic, comparison, logical, and access operators
//! * [`Delimiter`]: structural elements like braces, parentheses, and punctuation
//!
//! ## Parsing Strategy
//!
//! Symbols are parsed using a longest-match approach so that multi-character
//! operators like `===` or `=>` are recognized before their prefixes (`==`,
//! `=`). The converter never evaluates operators; it only needs stable token
//! boundaries so that opaque expressions survive the round trip unchanged.

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Operators recognized in component source.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Arrow function marker (`=>`)
    #[strum(serialize = "=>")]
    Arrow,
    /// Spread/rest marker (`...`)
    #[strum(serialize = "...")]
    Ellipsis,
    /// Optional chaining (`?.`)
    #[strum(serialize = "?.")]
    OptionalChain,
    /// Nullish coalescing (`??`)
    #[strum(serialize = "??")]
    Nullish,

    /// Member access (`.`)
    #[strum(serialize = ".")]
    Dot,

    /// Strict equality (`===`)
    #[strum(serialize = "===")]
    StrictEquals,
    /// Strict inequality (`!==`)
    #[strum(serialize = "!==")]
    StrictNotEquals,
    /// Loose equality (`==`)
    #[strum(serialize = "==")]
    EqualEqual,
    /// Loose inequality (`!=`)
    #[strum(serialize = "!=")]
    NotEqual,
    /// Greater than (`>`)
    #[strum(serialize = ">")]
    Greater,
    /// Greater than or equal (`>=`)
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Less than (`<`)
    #[strum(serialize = "<")]
    Less,
    /// Less than or equal (`<=`)
    #[strum(serialize = "<=")]
    LessEqual,

    /// Increment (`++`)
    #[strum(serialize = "++")]
    Increment,
    /// Decrement (`--`)
    #[strum(serialize = "--")]
    Decrement,
    /// Compound add-assign (`+=`)
    #[strum(serialize = "+=")]
    PlusAssign,
    /// Compound subtract-assign (`-=`)
    #[strum(serialize = "-=")]
    MinusAssign,

    /// Addition (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division (`/`)
    #[strum(serialize = "/")]
    Divide,
    /// Remainder (`%`)
    #[strum(serialize = "%")]
    Percent,

    /// Logical AND (`&&`)
    #[strum(serialize = "&&")]
    And,
    /// Logical OR (`||`)
    #[strum(serialize = "||")]
    Or,
    /// Bitwise AND (`&`)
    #[strum(serialize = "&")]
    BitAnd,
    /// Bitwise OR (`|`)
    #[strum(serialize = "|")]
    BitOr,
    /// Logical NOT (`!`)
    #[strum(serialize = "!")]
    Not,
    /// Ternary condition marker (`?`)
    #[strum(serialize = "?")]
    Question,
}

/// Constant for the close brace character, used because direct serialization in strum causes errors.
const CLOSE_BRACE: &str = "}";

/// Delimiters recognized in component source.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Delimiter {
    /// Opening brace (`{`) for blocks and object literals
    #[strum(serialize = "{")]
    OpenBrace,
    /// Closing brace (`}`)
    #[strum(serialize = "CLOSE_BRACE")]
    CloseBrace,
    /// Opening parenthesis (`(`)
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`)
    #[strum(serialize = ")")]
    CloseParen,
    /// Opening bracket (`[`)
    #[strum(serialize = "[")]
    OpenBracket,
    /// Closing bracket (`]`)
    #[strum(serialize = "]")]
    CloseBracket,
    /// Comma (`,`)
    #[strum(serialize = ",")]
    Comma,
    /// Semicolon (`;`)
    #[strum(serialize = ";")]
    Semicolon,
    /// Colon (`:`) for object keys and ternaries
    #[strum(serialize = ":")]
    Colon,
    /// Equal sign (`=`) for assignment
    #[strum(serialize = "=")]
    Equal,
}

impl Delimiter {
    /// The matching closer for an opening delimiter.
    pub fn closing(&self) -> Option<Delimiter> {
        match self {
            Delimiter::OpenBrace => Some(Delimiter::CloseBrace),
            Delimiter::OpenParen => Some(Delimiter::CloseParen),
            Delimiter::OpenBracket => Some(Delimiter::CloseBracket),
            _ => None,
        }
    }

    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            Delimiter::OpenBrace | Delimiter::OpenParen | Delimiter::OpenBracket
        )
    }

    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Delimiter::CloseBrace | Delimiter::CloseParen | Delimiter::CloseBracket
        )
    }
}

/// Parses an operator token from the input string.
///
/// Multi-character operators are matched first so that `===` never splits
/// into `==` and `=`.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                alt((
                    value(Operator::StrictEquals, tag("===")),
                    value(Operator::StrictNotEquals, tag("!==")),
                    value(Operator::Ellipsis, tag("...")),
                    value(Operator::Arrow, tag("=>")),
                    value(Operator::OptionalChain, tag("?.")),
                    value(Operator::Nullish, tag("??")),
                    value(Operator::EqualEqual, tag("==")),
                    value(Operator::NotEqual, tag("!=")),
                    value(Operator::GreaterEqual, tag(">=")),
                    value(Operator::LessEqual, tag("<=")),
                    value(Operator::Increment, tag("++")),
                    value(Operator::Decrement, tag("--")),
                    value(Operator::PlusAssign, tag("+=")),
                    value(Operator::MinusAssign, tag("-=")),
                    value(Operator::And, tag("&&")),
                    value(Operator::Or, tag("||")),
                )),
                alt((
                    value(Operator::Dot, tag(".")),
                    value(Operator::Greater, tag(">")),
                    value(Operator::Less, tag("<")),
                    value(Operator::Plus, tag("+")),
                    value(Operator::Minus, tag("-")),
                    value(Operator::Multiply, tag("*")),
                    value(Operator::Divide, tag("/")),
                    value(Operator::Percent, tag("%")),
                    value(Operator::Not, tag("!")),
                    value(Operator::Question, tag("?")),
                    value(Operator::BitAnd, tag("&")),
                    value(Operator::BitOr, tag("|")),
                )),
            )),
            Token::Operator,
        ),
    )(input)
}

/// Parses a delimiter token from the input string.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag(CLOSE_BRACE)),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Semicolon, tag(";")),
                value(Delimiter::Colon, tag(":")),
                value(Delimiter::Equal, tag("=")),
            )),
            Token::Delimiter,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let test_cases = [
            ("=>", Token::Operator(Operator::Arrow)),
            ("===", Token::Operator(Operator::StrictEquals)),
            ("!==", Token::Operator(Operator::StrictNotEquals)),
            ("...", Token::Operator(Operator::Ellipsis)),
            ("==", Token::Operator(Operator::EqualEqual)),
            ("!=", Token::Operator(Operator::NotEqual)),
            (">=", Token::Operator(Operator::GreaterEqual)),
            ("++", Token::Operator(Operator::Increment)),
            (".", Token::Operator(Operator::Dot)),
            (">", Token::Operator(Operator::Greater)),
            ("?", Token::Operator(Operator::Question)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_operator(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_delimiters() {
        let test_cases = [
            ("{", Token::Delimiter(Delimiter::OpenBrace)),
            ("}", Token::Delimiter(Delimiter::CloseBrace)),
            ("(", Token::Delimiter(Delimiter::OpenParen)),
            (")", Token::Delimiter(Delimiter::CloseParen)),
            ("[", Token::Delimiter(Delimiter::OpenBracket)),
            ("]", Token::Delimiter(Delimiter::CloseBracket)),
            (",", Token::Delimiter(Delimiter::Comma)),
            (";", Token::Delimiter(Delimiter::Semicolon)),
            (":", Token::Delimiter(Delimiter::Colon)),
            ("=", Token::Delimiter(Delimiter::Equal)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_delimiter(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_operator_precedence() {
        // "===" must not be consumed as "==" followed by "="
        let (rest, token) = parse_operator("===").unwrap();
        assert_eq!(token, Token::Operator(Operator::StrictEquals));
        assert_eq!(rest, "");

        let (rest, token) = parse_operator("=>").unwrap();
        assert_eq!(token, Token::Operator(Operator::Arrow));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_delimiter_matching() {
        assert_eq!(Delimiter::OpenBrace.closing(), Some(Delimiter::CloseBrace));
        assert_eq!(Delimiter::OpenParen.closing(), Some(Delimiter::CloseParen));
        assert!(Delimiter::CloseBrace.is_closing());
        assert!(!Delimiter::Comma.is_opening());
    }
}
