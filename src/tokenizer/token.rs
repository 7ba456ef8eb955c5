use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    comment::parse_comment,
    keyword::Keyword,
    literal::{keyword_literal, parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::{parse_newline, parse_whitespace},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Keyword(Keyword),
    // Identifiers
    Identifier(String),
    // Symbols
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Literal(Literal),
    // Formatting
    Whitespace(String),
    Newline,
    Comment {
        content: String,
        kind: CommentKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentKind {
    Line,  // //
    Block, // /* */
}

impl Token {
    /// Whitespace, newlines, and comments carry no structure; the model
    /// builder filters them out of statement runs.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::Newline | Token::Comment { .. }
        )
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "{}", kw),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(Delimiter::CloseBrace) => write!(f, "}}"),
            Token::Delimiter(d) => write!(f, "{}", d),
            Token::Literal(Literal::Str(s)) => write!(f, "'{}'", s),
            Token::Literal(Literal::Template(s)) => write!(f, "`{}`", s),
            Token::Literal(Literal::Integer(n)) => write!(f, "{}", n),
            Token::Literal(Literal::Float(n)) => write!(f, "{}", n),
            Token::Literal(Literal::Boolean(b)) => write!(f, "{}", b),
            Token::Literal(Literal::Null) => write!(f, "null"),
            Token::Whitespace(ws) => write!(f, "{}", ws),
            Token::Newline => writeln!(f),
            Token::Comment { content, kind } => match kind {
                CommentKind::Line => write!(f, "//{}", content),
                CommentKind::Block => write!(f, "/*{}*/", content),
            },
        }
    }
}

/// Byte and line/column location of a token or error, 1-based lines and
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line: {}, column: {}, start: {}, end: {}",
            self.line, self.column, self.start, self.end
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    /// True for tokens manufactured by a rewrite rule. Synthetic tokens keep
    /// the span of the text they replaced, so gap reconstruction around them
    /// stays monotonic, but their text comes from the token itself rather
    /// than the source slice.
    pub synthetic: bool,
}

impl TokenSpan {
    pub fn new(token: Token, span: Span) -> Self {
        Self {
            token,
            start: span.start,
            end: span.end,
            line: span.line,
            column: span.column,
            synthetic: false,
        }
    }

    pub fn synthetic(token: Token, span: Span) -> Self {
        Self {
            synthetic: true,
            ..Self::new(token, span)
        }
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
            line: self.line,
            column: self.column,
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.token.is_trivia()
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,   // 1-based
            current_column: 1, // 1-based
        }
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizeResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;

            let result = alt((
                // Formatting
                parse_whitespace,
                parse_newline,
                // Comments before operators, `//` vs `/`
                parse_comment,
                // Literals
                parse_literal,
                // Code elements
                parse_identifier,
                parse_operator,
                parse_delimiter,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                        synthetic: false,
                    });

                    remaining = new_remaining;
                }
                Err(e) => {
                    let found = remaining.chars().take(20).collect::<String>();
                    let span = Span {
                        start: self.current_position,
                        end: self.current_position + 1,
                        line: self.current_line,
                        column: self.current_column,
                    };
                    let error = match e {
                        nom::Err::Incomplete(e) => TokenizeError::ParseError {
                            message: format!("Incomplete input, {:?}", e),
                            found,
                            span,
                        },
                        nom::Err::Error(e) | nom::Err::Failure(e) => TokenizeError::ParseError {
                            message: nom::error::convert_error(remaining, e).to_string(),
                            found,
                            span,
                        },
                    };
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        )),
    )(input)?;

    // Check if identifier is not a specials
    if let Ok(kw) = Keyword::try_from(id) {
        return Ok((input, Token::Keyword(kw)));
    }
    if let Some(lit) = keyword_literal(id) {
        return Ok((input, Token::Literal(lit)));
    }

    Ok((input, Token::Identifier(id.to_string())))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizeResult<T> = Result<T, TokenizeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizeError {
    #[error("Tokenize error: {message} at position {span}")]
    ParseError {
        message: String,
        found: String,
        span: Span,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Operator;

    #[test]
    fn test_identifier_for_keyword() {
        let input = "class";
        let (rest, token) = parse_identifier(input).unwrap();
        assert_eq!(token, Token::Keyword(Keyword::Class));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        let input = "className";
        let (rest, token) = parse_identifier(input).unwrap();
        assert_eq!(token, Token::Identifier("className".to_string()));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_identifier() {
        let input = "my_var123 other";
        let (rest, token) = parse_identifier(input).unwrap();
        assert_eq!(token, Token::Identifier("my_var123".to_string()));
        assert_eq!(rest, " other");
    }

    #[test]
    fn test_tokenizer_with_position() {
        let mut tokenizer = Tokenizer::new();
        let input = "x\nother";
        let tokens = tokenizer.tokenize(input).unwrap();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[0].token, Token::Identifier("x".to_string()));

        let second_line = &tokens[2];
        assert_eq!(second_line.line, 2);
        assert_eq!(second_line.column, 1);
    }

    #[test]
    fn test_class_header() {
        let mut tokenizer = Tokenizer::new();
        let input = "class MyComponent extends React.Component {";

        let tokens = tokenizer.tokenize(input).unwrap();
        let important_tokens: Vec<_> = tokens.iter().filter(|t| !t.is_trivia()).collect();

        assert!(matches!(
            important_tokens[0].token,
            Token::Keyword(Keyword::Class)
        ));
        assert!(
            matches!(important_tokens[1].token, Token::Identifier(ref s) if s == "MyComponent")
        );
        assert!(matches!(
            important_tokens[2].token,
            Token::Keyword(Keyword::Extends)
        ));
        assert!(matches!(important_tokens[3].token, Token::Identifier(ref s) if s == "React"));
        assert!(matches!(
            important_tokens[4].token,
            Token::Operator(Operator::Dot)
        ));
        assert!(matches!(important_tokens[5].token, Token::Identifier(ref s) if s == "Component"));
        assert!(matches!(
            important_tokens[6].token,
            Token::Delimiter(Delimiter::OpenBrace)
        ));
    }

    #[test]
    fn test_markup_fragment() {
        let mut tokenizer = Tokenizer::new();
        let input = "return (<p>Hello, {this.props.name}</p>);";

        let tokens = tokenizer.tokenize(input).unwrap();
        let significant: Vec<_> = tokens.iter().filter(|t| !t.is_trivia()).collect();

        assert!(matches!(
            significant[0].token,
            Token::Keyword(Keyword::Return)
        ));
        let this_count = significant
            .iter()
            .filter(|t| matches!(t.token, Token::Keyword(Keyword::This)))
            .count();
        assert_eq!(this_count, 1);
        let closers = significant
            .iter()
            .filter(|t| matches!(t.token, Token::Delimiter(Delimiter::CloseParen)))
            .count();
        assert_eq!(closers, 1);
    }

    #[test]
    fn test_spans_cover_input() {
        let mut tokenizer = Tokenizer::new();
        let input = "const [count, setCount] = useState(0);";
        let tokens = tokenizer.tokenize(input).unwrap();

        assert_eq!(tokens.first().unwrap().start, 0);
        assert_eq!(tokens.last().unwrap().end, input.len());
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_unterminated_string() {
        let mut tokenizer = Tokenizer::new();
        let result = tokenizer.tokenize("const s = 'oops");
        assert!(result.is_err());
    }
}
