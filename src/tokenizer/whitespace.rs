//! # Whitespace Token Handling
//!
//! Whitespace and newlines are kept as tokens so the stream stays lossless.
//! The model builder filters them out of statement runs; the emitter gets its
//! spacing back from source spans instead.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(
            take_while1(|c: char| c == ' ' || c == '\t'),
            |ws: &str| Token::Whitespace(ws.to_string()),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline",
        map(alt((tag("\r\n"), tag("\n"))), |_| Token::Newline),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace() {
        let (rest, token) = parse_whitespace("  \tx").unwrap();
        assert_eq!(token, Token::Whitespace("  \t".to_string()));
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_newline() {
        let (rest, token) = parse_newline("\r\nx").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "x");

        let (rest, token) = parse_newline("\nx").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "x");
    }
}
