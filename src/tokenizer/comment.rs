use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::not_line_ending,
    combinator::map,
    error::context,
    sequence::{delimited, preceded},
};

use super::token::{CommentKind, ParserResult, Token};

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_line_comment(input: &str) -> ParserResult<Token> {
    context(
        "line comment",
        map(preceded(tag("//"), not_line_ending), |content: &str| {
            Token::Comment {
                content: content.trim().to_string(),
                kind: CommentKind::Line,
            }
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_block_comment(input: &str) -> ParserResult<Token> {
    context(
        "block comment",
        map(
            delimited(tag("/*"), take_until("*/"), tag("*/")),
            |content: &str| Token::Comment {
                content: content.to_string(),
                kind: CommentKind::Block,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<Token> {
    context("comment", alt((parse_block_comment, parse_line_comment)))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        let input = "// set initial state\ncode";
        let (rest, token) = parse_comment(input).unwrap();
        assert_eq!(
            token,
            Token::Comment {
                content: "set initial state".to_string(),
                kind: CommentKind::Line,
            }
        );
        assert_eq!(rest, "\ncode");
    }

    #[test]
    fn test_block_comment() {
        let input = "/* spans\n two lines */code";
        let (rest, token) = parse_comment(input).unwrap();
        assert_eq!(
            token,
            Token::Comment {
                content: " spans\n two lines ".to_string(),
                kind: CommentKind::Block,
            }
        );
        assert_eq!(rest, "code");
    }

    #[test]
    fn test_unterminated_block_comment_fails() {
        assert!(parse_comment("/* never closed").is_err());
    }
}
