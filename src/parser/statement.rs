//! Statement boundary detection and classification.
//!
//! Blocks are split on delimiter depth alone; the contents of a statement
//! stay opaque unless the statement matches one of the handful of shapes the
//! rewrite rules care about (`super(…)`, `this.state = {…}`, handler
//! binding, `this.setState(…)`, `return …`). Everything else survives the
//! pipeline token-for-token.

use crate::ast::{Block, StateField, Statement, TokenRun};
use crate::tokenizer::{Delimiter, Keyword, Operator, Span, Token, TokenSpan};

use super::error::{ParseError, ParseResult};

/// Which kinds of statements can be recognized at the current position.
/// Constructor bodies get the full set; method and lifecycle bodies only see
/// `setState` and `return`; function-component bodies stay opaque apart from
/// `return`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementContext {
    Constructor,
    Method,
    Function,
}

/// A `this.setState({…}, cb?)` call located inside a token run.
#[derive(Debug, Clone, PartialEq)]
pub struct SetStateCall {
    /// Index of the `this` token within the run.
    pub start: usize,
    /// Index one past the closing parenthesis.
    pub end: usize,
    pub fields: Vec<(String, TokenRun)>,
    pub callback: Option<Block>,
    pub span: Span,
}

/// Finds the index of the delimiter closing the opener at `open`.
pub fn find_matching(tokens: &[TokenSpan], open: usize) -> ParseResult<usize> {
    let closer = match &tokens[open].token {
        Token::Delimiter(d) if d.is_opening() => d.closing().unwrap_or(Delimiter::CloseBrace),
        _ => {
            return Err(ParseError::UnexpectedToken {
                expected: "opening delimiter".to_string(),
                found: tokens[open].token.to_string(),
                span: tokens[open].span(),
            })
        }
    };
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match &tok.token {
            Token::Delimiter(d) if d.is_opening() => depth += 1,
            Token::Delimiter(d) if d.is_closing() => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedDelimiter { span: tok.span() })?;
                if depth == 0 {
                    if *d == closer {
                        return Ok(i);
                    }
                    return Err(ParseError::UnbalancedDelimiter { span: tok.span() });
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnbalancedDelimiter {
        span: tokens[open].span(),
    })
}

/// Splits the significant tokens of a block body into statements.
///
/// A statement ends at a top-level `;`, or after a top-level `}` closing a
/// brace opened within the statement, unless the next token continues it
/// (`else`, `catch`, `finally`, an operator, or further punctuation).
pub fn split_statements(tokens: &[TokenSpan]) -> ParseResult<Vec<Vec<TokenSpan>>> {
    let mut statements = Vec::new();
    let mut current: Vec<TokenSpan> = Vec::new();
    let mut depth = 0usize;

    for (i, tok) in tokens.iter().enumerate() {
        current.push(tok.clone());
        // A return statement only ever ends at `;`; markup text may follow a
        // `}` inside its expression.
        let in_return = matches!(
            current.first().map(|t| &t.token),
            Some(Token::Keyword(Keyword::Return))
        );
        match &tok.token {
            Token::Delimiter(d) if d.is_opening() => depth += 1,
            Token::Delimiter(d) if d.is_closing() => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnbalancedDelimiter { span: tok.span() })?;
                if depth == 0
                    && *d == Delimiter::CloseBrace
                    && !in_return
                    && ends_statement_after_block(tokens.get(i + 1))
                {
                    statements.push(std::mem::take(&mut current));
                }
            }
            Token::Delimiter(Delimiter::Semicolon) if depth == 0 => {
                statements.push(std::mem::take(&mut current));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ParseError::UnbalancedDelimiter {
            span: tokens.last().map(|t| t.span()).unwrap_or(Span {
                start: 0,
                end: 0,
                line: 1,
                column: 1,
            }),
        });
    }
    if !current.is_empty() {
        statements.push(current);
    }
    Ok(statements)
}

fn ends_statement_after_block(next: Option<&TokenSpan>) -> bool {
    match next {
        None => true,
        Some(tok) => !matches!(
            &tok.token,
            Token::Keyword(Keyword::Else)
                | Token::Keyword(Keyword::Catch)
                | Token::Keyword(Keyword::Finally)
                | Token::Operator(_)
                | Token::Delimiter(_)
        ),
    }
}

/// Classifies one statement's tokens. Object literals inside `setState`
/// calls are validated here even when the statement itself stays opaque, so
/// malformed input fails at parse time.
pub fn classify_statement(
    tokens: Vec<TokenSpan>,
    context: StatementContext,
) -> ParseResult<Statement> {
    let span = TokenRun::new(tokens.clone()).span();

    if let Some(first) = tokens.first() {
        // The full run is kept, `return` and `;` included, so the emitter can
        // reproduce it from the source verbatim.
        if matches!(first.token, Token::Keyword(Keyword::Return)) {
            return Ok(Statement::Return(TokenRun::new(tokens)));
        }
    }

    if context == StatementContext::Constructor {
        if let Some(statement) = match_super(&tokens, span)? {
            return Ok(statement);
        }
        if let Some(statement) = match_state_init(&tokens, span)? {
            return Ok(statement);
        }
        if let Some(statement) = match_method_bind(&tokens, span) {
            return Ok(statement);
        }
    }

    if context != StatementContext::Function {
        let calls = find_set_state_calls(&tokens)?;
        if let [call] = calls.as_slice() {
            let mut trimmed = tokens.clone();
            strip_trailing_semicolon(&mut trimmed);
            if call.start == 0 && call.end == trimmed.len() {
                return Ok(Statement::SetState {
                    fields: call.fields.clone(),
                    callback: call.callback.clone(),
                    span,
                });
            }
        }
    }

    Ok(Statement::Opaque(TokenRun::new(tokens)))
}

/// Splits and classifies a whole block body.
pub fn parse_block_statements(
    tokens: &[TokenSpan],
    context: StatementContext,
) -> ParseResult<Vec<Statement>> {
    split_statements(tokens)?
        .into_iter()
        .map(|stmt| classify_statement(stmt, context))
        .collect()
}

fn strip_trailing_semicolon(tokens: &mut Vec<TokenSpan>) {
    if matches!(
        tokens.last().map(|t| &t.token),
        Some(Token::Delimiter(Delimiter::Semicolon))
    ) {
        tokens.pop();
    }
}

fn is_identifier(tok: &TokenSpan, name: &str) -> bool {
    tok.token.identifier() == Some(name)
}

fn match_super(tokens: &[TokenSpan], span: Span) -> ParseResult<Option<Statement>> {
    if !matches!(
        tokens.first().map(|t| &t.token),
        Some(Token::Keyword(Keyword::Super))
    ) {
        return Ok(None);
    }
    if tokens.len() < 3 || !matches!(tokens[1].token, Token::Delimiter(Delimiter::OpenParen)) {
        return Err(ParseError::UnexpectedToken {
            expected: "'(' after super".to_string(),
            found: tokens
                .get(1)
                .map(|t| t.token.to_string())
                .unwrap_or_else(|| "end of input".to_string()),
            span,
        });
    }
    let close = find_matching(tokens, 1)?;
    Ok(Some(Statement::Super(TokenRun::new(
        tokens[2..close].to_vec(),
    ))))
}

fn match_state_init(tokens: &[TokenSpan], span: Span) -> ParseResult<Option<Statement>> {
    // this . state = { … }
    if tokens.len() < 6
        || !matches!(tokens[0].token, Token::Keyword(Keyword::This))
        || !matches!(tokens[1].token, Token::Operator(Operator::Dot))
        || !is_identifier(&tokens[2], "state")
        || !matches!(tokens[3].token, Token::Delimiter(Delimiter::Equal))
        || !matches!(tokens[4].token, Token::Delimiter(Delimiter::OpenBrace))
    {
        return Ok(None);
    }
    let close = find_matching(tokens, 4)?;
    let fields = parse_object_literal(&tokens[5..close])?
        .into_iter()
        .map(|(name, initial, field_span)| StateField {
            name,
            initial,
            span: field_span,
        })
        .collect();
    Ok(Some(Statement::StateInit { fields, span }))
}

fn match_method_bind(tokens: &[TokenSpan], span: Span) -> Option<Statement> {
    // this . m = this . m . bind ( this )
    let mut trimmed = tokens.to_vec();
    strip_trailing_semicolon(&mut trimmed);
    if trimmed.len() != 12 {
        return None;
    }
    let name = trimmed[2].token.identifier()?;
    let shape = matches!(trimmed[0].token, Token::Keyword(Keyword::This))
        && matches!(trimmed[1].token, Token::Operator(Operator::Dot))
        && matches!(trimmed[3].token, Token::Delimiter(Delimiter::Equal))
        && matches!(trimmed[4].token, Token::Keyword(Keyword::This))
        && matches!(trimmed[5].token, Token::Operator(Operator::Dot))
        && is_identifier(&trimmed[6], name)
        && matches!(trimmed[7].token, Token::Operator(Operator::Dot))
        && is_identifier(&trimmed[8], "bind")
        && matches!(trimmed[9].token, Token::Delimiter(Delimiter::OpenParen))
        && matches!(trimmed[10].token, Token::Keyword(Keyword::This))
        && matches!(trimmed[11].token, Token::Delimiter(Delimiter::CloseParen));
    if shape {
        Some(Statement::MethodBind {
            name: name.to_string(),
            span,
        })
    } else {
        None
    }
}

/// Parses the inside of an object literal into `(key, value, span)` entries.
/// A top-level `;` here is the classic malformed-fragment case and fails the
/// whole parse.
pub fn parse_object_literal(tokens: &[TokenSpan]) -> ParseResult<Vec<(String, TokenRun, Span)>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos < tokens.len() {
        let key_tok = &tokens[pos];
        let key = key_tok
            .token
            .identifier()
            .ok_or_else(|| ParseError::UnexpectedToken {
                expected: "object key".to_string(),
                found: key_tok.token.to_string(),
                span: key_tok.span(),
            })?
            .to_string();
        pos += 1;

        match tokens.get(pos).map(|t| &t.token) {
            Some(Token::Delimiter(Delimiter::Colon)) => pos += 1,
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "':' after object key".to_string(),
                    found: other
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "end of input".to_string()),
                    span: tokens
                        .get(pos)
                        .map(|t| t.span())
                        .unwrap_or_else(|| key_tok.span()),
                })
            }
        }

        let value_start = pos;
        let mut depth = 0usize;
        while pos < tokens.len() {
            match &tokens[pos].token {
                Token::Delimiter(d) if d.is_opening() => depth += 1,
                Token::Delimiter(d) if d.is_closing() => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(ParseError::UnbalancedDelimiter {
                            span: tokens[pos].span(),
                        })?
                }
                Token::Delimiter(Delimiter::Semicolon) if depth == 0 => {
                    return Err(ParseError::MalformedObjectLiteral {
                        span: tokens[pos].span(),
                    })
                }
                Token::Delimiter(Delimiter::Comma) if depth == 0 => break,
                _ => {}
            }
            pos += 1;
        }
        if pos == value_start {
            return Err(ParseError::UnexpectedToken {
                expected: "object value".to_string(),
                found: tokens
                    .get(pos)
                    .map(|t| t.token.to_string())
                    .unwrap_or_else(|| "end of input".to_string()),
                span: key_tok.span(),
            });
        }

        let value = TokenRun::new(tokens[value_start..pos].to_vec());
        let span = Span {
            start: key_tok.start,
            end: value.span().end,
            line: key_tok.line,
            column: key_tok.column,
        };
        entries.push((key, value, span));

        if matches!(
            tokens.get(pos).map(|t| &t.token),
            Some(Token::Delimiter(Delimiter::Comma))
        ) {
            pos += 1;
        }
    }

    Ok(entries)
}

/// Scans a token sequence for `this.setState({…}, cb?)` calls, validating
/// every object literal and callback found along the way.
pub fn find_set_state_calls(tokens: &[TokenSpan]) -> ParseResult<Vec<SetStateCall>> {
    let mut calls = Vec::new();
    let mut i = 0usize;

    while i + 3 < tokens.len() {
        let head = matches!(tokens[i].token, Token::Keyword(Keyword::This))
            && matches!(tokens[i + 1].token, Token::Operator(Operator::Dot))
            && is_identifier(&tokens[i + 2], "setState")
            && matches!(tokens[i + 3].token, Token::Delimiter(Delimiter::OpenParen));
        if !head {
            i += 1;
            continue;
        }

        let call_close = find_matching(tokens, i + 3)?;
        let args = &tokens[i + 4..call_close];
        let call_span = Span {
            start: tokens[i].start,
            end: tokens[call_close].end,
            line: tokens[i].line,
            column: tokens[i].column,
        };

        if !matches!(
            args.first().map(|t| &t.token),
            Some(Token::Delimiter(Delimiter::OpenBrace))
        ) {
            return Err(ParseError::UnsupportedConstruct {
                what: "setState argument that is not an object literal".to_string(),
                span: call_span,
            });
        }
        let object_close = find_matching(args, 0)?;
        let fields = parse_object_literal(&args[1..object_close])?
            .into_iter()
            .map(|(name, value, _)| (name, value))
            .collect();

        let mut rest = &args[object_close + 1..];
        let callback = if rest.is_empty() {
            None
        } else {
            if !matches!(rest[0].token, Token::Delimiter(Delimiter::Comma)) {
                return Err(ParseError::UnexpectedToken {
                    expected: "',' or ')' after setState object".to_string(),
                    found: rest[0].token.to_string(),
                    span: rest[0].span(),
                });
            }
            rest = &rest[1..];
            Some(parse_callback(rest, call_span)?)
        };

        calls.push(SetStateCall {
            start: i,
            end: call_close + 1,
            fields,
            callback,
            span: call_span,
        });
        i = call_close + 1;
    }

    Ok(calls)
}

fn parse_callback(tokens: &[TokenSpan], call_span: Span) -> ParseResult<Block> {
    // () => { … }   or   () => expr   or   function () { … }
    let body_span = TokenRun::new(tokens.to_vec()).span();
    match tokens.first().map(|t| &t.token) {
        Some(Token::Delimiter(Delimiter::OpenParen)) => {
            let params_close = find_matching(tokens, 0)?;
            if !matches!(
                tokens.get(params_close + 1).map(|t| &t.token),
                Some(Token::Operator(Operator::Arrow))
            ) {
                return Err(ParseError::UnsupportedConstruct {
                    what: "setState callback without arrow body".to_string(),
                    span: call_span,
                });
            }
            let after_arrow = params_close + 2;
            match tokens.get(after_arrow).map(|t| &t.token) {
                Some(Token::Delimiter(Delimiter::OpenBrace)) => {
                    let body_close = find_matching(tokens, after_arrow)?;
                    let statements = parse_block_statements(
                        &tokens[after_arrow + 1..body_close],
                        StatementContext::Method,
                    )?;
                    Ok(Block::new(statements, body_span))
                }
                Some(_) => {
                    let expr = TokenRun::new(tokens[after_arrow..].to_vec());
                    Ok(Block::new(vec![Statement::Opaque(expr)], body_span))
                }
                None => Err(ParseError::UnexpectedEof),
            }
        }
        Some(Token::Keyword(Keyword::Function)) => {
            let params_open = 1;
            if !matches!(
                tokens.get(params_open).map(|t| &t.token),
                Some(Token::Delimiter(Delimiter::OpenParen))
            ) {
                return Err(ParseError::UnexpectedEof);
            }
            let params_close = find_matching(tokens, params_open)?;
            let body_open = params_close + 1;
            if !matches!(
                tokens.get(body_open).map(|t| &t.token),
                Some(Token::Delimiter(Delimiter::OpenBrace))
            ) {
                return Err(ParseError::UnexpectedToken {
                    expected: "function body".to_string(),
                    found: tokens
                        .get(body_open)
                        .map(|t| t.token.to_string())
                        .unwrap_or_else(|| "end of input".to_string()),
                    span: call_span,
                });
            }
            let body_close = find_matching(tokens, body_open)?;
            let statements = parse_block_statements(
                &tokens[body_open + 1..body_close],
                StatementContext::Method,
            )?;
            Ok(Block::new(statements, body_span))
        }
        _ => Err(ParseError::UnsupportedConstruct {
            what: "setState callback that is not a function".to_string(),
            span: call_span,
        }),
    }
}
