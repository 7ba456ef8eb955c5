//! Model builder: turns the token stream of one source unit into a
//! [`SourceUnit`].
//!
//! The parser only understands declaration structure (imports, the class or
//! function header, class members, statement boundaries). Expression
//! contents stay opaque token runs; giving them meaning is the rule engine's
//! job.

pub mod error;
pub mod statement;

pub use error::{ParseError, ParseResult};

use std::str::FromStr;

use crate::ast::{
    Block, ComponentDef, ComponentKind, ConstructorBlock, ImportDecl, LifecycleHook,
    LifecycleKind, MethodDef, SourceUnit, StateField, TokenRun,
};
use crate::tokenizer::{Delimiter, Keyword, Literal, Operator, Span, Token, TokenSpan};

use statement::{find_matching, parse_block_statements, parse_object_literal, StatementContext};

/// Entry point of the model builder.
#[tracing::instrument(level = "debug", skip(tokens))]
pub fn parse_source_unit(tokens: &[TokenSpan]) -> ParseResult<SourceUnit> {
    let significant: Vec<TokenSpan> = tokens.iter().filter(|t| !t.is_trivia()).cloned().collect();
    let mut cursor = Cursor::new(&significant);

    let mut preamble = Vec::new();
    while matches!(
        cursor.peek().map(|t| &t.token),
        Some(Token::Keyword(Keyword::Import))
    ) {
        preamble.push(parse_import(&mut cursor)?);
    }

    let component = match cursor.peek().map(|t| &t.token) {
        Some(Token::Keyword(Keyword::Class)) => parse_class(&mut cursor)?,
        Some(Token::Keyword(Keyword::Function)) => parse_function(&mut cursor)?,
        _ => return Err(ParseError::NoComponent),
    };

    if let Some(extra) = cursor.peek() {
        if matches!(
            extra.token,
            Token::Keyword(Keyword::Class) | Token::Keyword(Keyword::Function)
        ) {
            return Err(ParseError::MultipleComponents { span: extra.span() });
        }
        return Err(ParseError::UnexpectedToken {
            expected: "end of input".to_string(),
            found: extra.token.to_string(),
            span: extra.span(),
        });
    }

    Ok(SourceUnit::new(preamble, component))
}

fn parse_import(cursor: &mut Cursor) -> ParseResult<ImportDecl> {
    let start = cursor.peek().ok_or(ParseError::UnexpectedEof)?.span();
    let mut collected = Vec::new();
    loop {
        let tok = cursor.advance().ok_or(ParseError::UnexpectedEof)?.clone();
        let done = matches!(tok.token, Token::Delimiter(Delimiter::Semicolon));
        collected.push(tok);
        if done {
            break;
        }
    }
    let module = collected.iter().rev().find_map(|t| match &t.token {
        Token::Literal(Literal::Str(path)) => Some(path.clone()),
        _ => None,
    });
    let span = Span {
        start: start.start,
        end: collected.last().map(|t| t.end).unwrap_or(start.end),
        line: start.line,
        column: start.column,
    };
    Ok(ImportDecl {
        tokens: collected,
        module,
        span,
    })
}

fn parse_class(cursor: &mut Cursor) -> ParseResult<ComponentDef> {
    let class_span = cursor.expect_keyword(Keyword::Class)?;
    let (name, _) = cursor.take_identifier("component name")?;
    cursor.expect_keyword(Keyword::Extends)?;
    skip_base_expression(cursor)?;

    let body = cursor.take_block()?;
    let mut members = Cursor::new(&body);
    let mut def = ComponentDef::new(name, ComponentKind::ClassBased, class_span);

    while let Some(tok) = members.peek().cloned() {
        match &tok.token {
            Token::Identifier(id) if id == "constructor" && members.peek_is_delim(1, Delimiter::OpenParen) => {
                if def.constructor.is_some() {
                    return Err(ParseError::DuplicateMember {
                        what: "constructor".to_string(),
                        span: tok.span(),
                    });
                }
                members.advance();
                let params = members.take_parens()?;
                let body_tokens = members.take_block()?;
                let statements =
                    parse_block_statements(&body_tokens, StatementContext::Constructor)?;
                def.props_binding = params
                    .iter()
                    .find_map(|t| t.token.identifier().map(str::to_string));
                let body_span = TokenRun::new(body_tokens.clone()).span();
                def.constructor = Some(ConstructorBlock {
                    params: TokenRun::new(params),
                    body: Block::new(statements, body_span),
                    span: tok.span(),
                });
            }
            Token::Identifier(id) if id == "render" && members.peek_is_delim(1, Delimiter::OpenParen) => {
                if def.render.is_some() {
                    return Err(ParseError::DuplicateMember {
                        what: "render".to_string(),
                        span: tok.span(),
                    });
                }
                members.advance();
                members.take_parens()?;
                let body_tokens = members.take_block()?;
                let statements = parse_block_statements(&body_tokens, StatementContext::Method)?;
                let body_span = TokenRun::new(body_tokens).span();
                def.render = Some(Block::new(statements, body_span));
            }
            Token::Identifier(id)
                if LifecycleKind::from_str(id).is_ok()
                    && (members.peek_is_delim(1, Delimiter::OpenParen)
                        || members.peek_is_delim(1, Delimiter::Equal)) =>
            {
                let kind = LifecycleKind::from_str(id).unwrap_or(LifecycleKind::Mount);
                if def.lifecycle_hook(kind).is_some() {
                    return Err(ParseError::DuplicateMember {
                        what: kind.to_string(),
                        span: tok.span(),
                    });
                }
                members.advance();
                if members.peek_is_delim(0, Delimiter::Equal) {
                    members.advance();
                }
                let params = members.take_parens()?;
                if !params.is_empty() {
                    return Err(ParseError::UnsupportedConstruct {
                        what: format!("parameters on {}", kind),
                        span: tok.span(),
                    });
                }
                if matches!(
                    members.peek().map(|t| &t.token),
                    Some(Token::Operator(Operator::Arrow))
                ) {
                    members.advance();
                }
                let body_tokens = members.take_block()?;
                members.skip_semicolon();
                let statements = parse_block_statements(&body_tokens, StatementContext::Method)?;
                let body_span = TokenRun::new(body_tokens).span();
                def.lifecycle.push(LifecycleHook {
                    kind,
                    body: Block::new(statements, body_span),
                    span: tok.span(),
                });
            }
            Token::Identifier(id)
                if id == "state"
                    && members.peek_is_delim(1, Delimiter::Equal)
                    && members.peek_is_delim(2, Delimiter::OpenBrace) =>
            {
                members.advance();
                members.advance();
                let object = members.take_block()?;
                let fields: Vec<StateField> = parse_object_literal(&object)?
                    .into_iter()
                    .map(|(name, initial, span)| StateField {
                        name,
                        initial,
                        span,
                    })
                    .collect();
                def.field_initializers.extend(fields);
                members.skip_semicolon();
            }
            Token::Keyword(Keyword::Async) => {
                members.advance();
                let (method_name, method_span) = members.take_identifier("method name")?;
                let method = parse_method(&mut members, method_name, method_span, true)?;
                def.methods.push(method);
            }
            Token::Identifier(id) if members.peek_is_delim(1, Delimiter::OpenParen) => {
                let method_name = id.clone();
                members.advance();
                let method = parse_method(&mut members, method_name, tok.span(), false)?;
                def.methods.push(method);
            }
            Token::Identifier(id) if members.peek_is_delim(1, Delimiter::Equal) => {
                let method_name = id.clone();
                members.advance();
                members.advance();
                let method = parse_arrow_method(&mut members, method_name, tok.span())?;
                def.methods.push(method);
            }
            Token::Keyword(Keyword::Static) => {
                return Err(ParseError::UnsupportedConstruct {
                    what: "static class member".to_string(),
                    span: tok.span(),
                });
            }
            Token::Delimiter(Delimiter::Semicolon) => {
                members.advance();
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "class member".to_string(),
                    found: other.to_string(),
                    span: tok.span(),
                });
            }
        }
    }

    Ok(def)
}

fn parse_method(
    members: &mut Cursor,
    name: String,
    span: Span,
    is_async: bool,
) -> ParseResult<MethodDef> {
    let params = members.take_parens()?;
    let body_tokens = members.take_block()?;
    let statements = parse_block_statements(&body_tokens, StatementContext::Method)?;
    let body_span = TokenRun::new(body_tokens).span();
    let body = Block::new(statements, body_span);
    let references_instance_state = body.references_instance_state();
    Ok(MethodDef {
        name,
        params: TokenRun::new(params),
        is_async,
        body,
        references_instance_state,
        span,
    })
}

fn parse_arrow_method(members: &mut Cursor, name: String, span: Span) -> ParseResult<MethodDef> {
    // name = [async] (args) => { … }
    let is_async = if matches!(
        members.peek().map(|t| &t.token),
        Some(Token::Keyword(Keyword::Async))
    ) {
        members.advance();
        true
    } else {
        false
    };
    if !members.peek_is_delim(0, Delimiter::OpenParen) {
        return Err(ParseError::UnsupportedConstruct {
            what: format!("class field initializer for '{}'", name),
            span,
        });
    }
    let params = members.take_parens()?;
    match members.peek().map(|t| &t.token) {
        Some(Token::Operator(Operator::Arrow)) => {
            members.advance();
        }
        _ => {
            return Err(ParseError::UnsupportedConstruct {
                what: format!("class field initializer for '{}'", name),
                span,
            });
        }
    }
    let body_tokens = members.take_block()?;
    let statements = parse_block_statements(&body_tokens, StatementContext::Method)?;
    let body_span = TokenRun::new(body_tokens).span();
    members.skip_semicolon();
    let body = Block::new(statements, body_span);
    let references_instance_state = body.references_instance_state();
    Ok(MethodDef {
        name,
        params: TokenRun::new(params),
        is_async,
        body,
        references_instance_state,
        span,
    })
}

fn parse_function(cursor: &mut Cursor) -> ParseResult<ComponentDef> {
    let fn_span = cursor.expect_keyword(Keyword::Function)?;
    let (name, _) = cursor.take_identifier("component name")?;
    let params = cursor.take_parens()?;
    let body_tokens = cursor.take_block()?;
    let statements = parse_block_statements(&body_tokens, StatementContext::Function)?;

    let mut def = ComponentDef::new(name, ComponentKind::FunctionBased, fn_span);
    def.props_binding = params
        .iter()
        .find_map(|t| t.token.identifier().map(str::to_string));
    def.body = statements;
    Ok(def)
}

/// Consumes the `extends` base expression: a dotted name, optionally with a
/// trailing call argument list.
fn skip_base_expression(cursor: &mut Cursor) -> ParseResult<()> {
    cursor.take_identifier("base component name")?;
    while matches!(
        cursor.peek().map(|t| &t.token),
        Some(Token::Operator(Operator::Dot))
    ) {
        cursor.advance();
        cursor.take_identifier("base component name")?;
    }
    if cursor.peek_is_delim(0, Delimiter::OpenParen) {
        cursor.take_parens()?;
    }
    Ok(())
}

struct Cursor<'a> {
    tokens: &'a [TokenSpan],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [TokenSpan]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&TokenSpan> {
        self.tokens.get(self.pos)
    }

    fn peek_is_delim(&self, offset: usize, delimiter: Delimiter) -> bool {
        matches!(
            self.tokens.get(self.pos + offset).map(|t| &t.token),
            Some(Token::Delimiter(d)) if *d == delimiter
        )
    }

    fn advance(&mut self) -> Option<&TokenSpan> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<Span> {
        match self.peek() {
            Some(tok) if matches!(&tok.token, Token::Keyword(k) if *k == keyword) => {
                let span = tok.span();
                self.pos += 1;
                Ok(span)
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                expected: format!("'{}'", keyword),
                found: tok.token.to_string(),
                span: tok.span(),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn take_identifier(&mut self, expected: &str) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(tok) => match tok.token.identifier() {
                Some(name) => {
                    let result = (name.to_string(), tok.span());
                    self.pos += 1;
                    Ok(result)
                }
                None => Err(ParseError::UnexpectedToken {
                    expected: expected.to_string(),
                    found: tok.token.to_string(),
                    span: tok.span(),
                }),
            },
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn take_delimited(&mut self, open: Delimiter, what: &str) -> ParseResult<Vec<TokenSpan>> {
        match self.peek() {
            Some(tok) if matches!(&tok.token, Token::Delimiter(d) if *d == open) => {
                let close = find_matching(self.tokens, self.pos)?;
                let inner = self.tokens[self.pos + 1..close].to_vec();
                self.pos = close + 1;
                Ok(inner)
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: tok.token.to_string(),
                span: tok.span(),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn take_parens(&mut self) -> ParseResult<Vec<TokenSpan>> {
        self.take_delimited(Delimiter::OpenParen, "'('")
    }

    fn take_block(&mut self) -> ParseResult<Vec<TokenSpan>> {
        self.take_delimited(Delimiter::OpenBrace, "'{'")
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is_delim(0, Delimiter::Semicolon) {
            self.pos += 1;
        }
    }
}
