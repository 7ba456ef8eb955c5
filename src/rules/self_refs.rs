use crate::ast::{ComponentDef, TokenRun};
use crate::tokenizer::{Keyword, Operator, Span, Token, TokenSpan};

use super::{ConvertError, ConvertResult, RewriteRule, RuleContext};

/// Rewrites every remaining self-qualified reference to a plain identifier:
/// `this.props` to the props binding, `this.state.f` to the state value
/// binding, `this.m` to the local function binding.
///
/// Dynamic dispatch through the instance becomes static lexical closure, so
/// every rewritten reference must resolve to a unique prior binding at
/// transform time. A reference that resolves to nothing is a hard error, not
/// a runtime fallback. `this.setState` is left in place for the
/// state-mutation rule that runs next.
pub struct SelfRefRule;

impl RewriteRule for SelfRefRule {
    fn name(&self) -> &'static str {
        "self-reference-elimination"
    }

    fn apply(&self, def: &mut ComponentDef, ctx: &mut RuleContext) -> ConvertResult<()> {
        let mut failure: Option<ConvertError> = None;
        let mut rewrite = |run: &mut TokenRun| {
            if failure.is_none() {
                if let Err(e) = rewrite_run(run, ctx) {
                    failure = Some(e);
                }
            }
        };

        // Only field initializers survive the constructor; other statements
        // are judged by the state rule, which owns the constructor errors.
        if let Some(ctor) = &mut def.constructor {
            for statement in &mut ctor.body.statements {
                if let crate::ast::Statement::StateInit { fields, .. } = statement {
                    for field in fields {
                        rewrite(&mut field.initial);
                    }
                }
            }
        }
        for field in &mut def.field_initializers {
            rewrite(&mut field.initial);
        }
        for local in &mut def.locals {
            local.body.visit_runs_mut(&mut rewrite);
        }
        for hook in &mut def.lifecycle {
            hook.body.visit_runs_mut(&mut rewrite);
        }
        for statement in &mut def.body {
            statement.visit_runs_mut(&mut rewrite);
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn rewrite_run(run: &mut TokenRun, ctx: &RuleContext) -> ConvertResult<()> {
    let tokens = &run.tokens;
    let mut out: Vec<TokenSpan> = Vec::with_capacity(tokens.len());
    let mut i = 0usize;

    while i < tokens.len() {
        if !matches!(tokens[i].token, Token::Keyword(Keyword::This)) {
            out.push(tokens[i].clone());
            i += 1;
            continue;
        }

        let dotted = matches!(
            tokens.get(i + 1).map(|t| &t.token),
            Some(Token::Operator(Operator::Dot))
        );
        let member = tokens.get(i + 2).and_then(|t| t.token.identifier());
        let (name, consumed) = match (dotted, member) {
            (true, Some("props")) => (ctx.props_binding.clone(), 3),
            (true, Some("state")) => {
                let field_dot = matches!(
                    tokens.get(i + 3).map(|t| &t.token),
                    Some(Token::Operator(Operator::Dot))
                );
                let field = tokens.get(i + 4).and_then(|t| t.token.identifier());
                match (field_dot, field) {
                    (true, Some(field)) if ctx.is_state_field(field) => (field.to_string(), 5),
                    (true, Some(field)) => {
                        return Err(ConvertError::AmbiguousSelfReference {
                            name: format!("state.{}", field),
                            span: tokens[i].span(),
                        })
                    }
                    _ => {
                        return Err(ConvertError::AmbiguousSelfReference {
                            name: "state".to_string(),
                            span: tokens[i].span(),
                        })
                    }
                }
            }
            (true, Some("setState")) => {
                // left for the state-mutation rule
                out.extend(tokens[i..i + 3].iter().cloned());
                i += 3;
                continue;
            }
            (true, Some(method)) if ctx.is_method(method) => (method.to_string(), 3),
            (true, Some(other)) => {
                return Err(ConvertError::AmbiguousSelfReference {
                    name: other.to_string(),
                    span: tokens[i].span(),
                })
            }
            _ => {
                return Err(ConvertError::AmbiguousSelfReference {
                    name: "this".to_string(),
                    span: tokens[i].span(),
                })
            }
        };

        let last = &tokens[i + consumed - 1];
        let span = Span {
            start: tokens[i].start,
            end: last.end,
            line: tokens[i].line,
            column: tokens[i].column,
        };
        out.push(TokenSpan::synthetic(Token::Identifier(name), span));
        i += consumed;
    }

    run.tokens = out;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::parse_unit;
    use super::super::{kind::KindRule, methods::MethodRule, render::RenderInlineRule};
    use super::*;
    use crate::ast::Statement;

    fn prepared(source: &str) -> (ComponentDef, RuleContext) {
        let unit = parse_unit(source);
        let mut def = unit.component;
        let mut ctx = RuleContext::new(&def);
        KindRule.apply(&mut def, &mut ctx).unwrap();
        RenderInlineRule.apply(&mut def, &mut ctx).unwrap();
        MethodRule.apply(&mut def, &mut ctx).unwrap();
        (def, ctx)
    }

    fn run_text(run: &TokenRun) -> String {
        run.tokens
            .iter()
            .map(|t| t.token.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_rewrites_props_state_and_methods() {
        let (mut def, mut ctx) = prepared(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.state = { count: 0 }
              }
              onClickHandler(e) {
                this.setState({count: this.state.count + 1})
              }
              render() {
                return (
                  <div>
                    <p>Hello, {this.props.name}</p>
                    <p>{this.state.count}</p>
                    <button onClick={this.onClickHandler}>Click me!</button>
                  </div>
                );
              }
            }
            "#,
        );
        SelfRefRule.apply(&mut def, &mut ctx).unwrap();

        let return_run = match def.body.last() {
            Some(Statement::Return(run)) => run,
            other => panic!("expected return, got {:?}", other),
        };
        let text = run_text(return_run);
        assert!(text.contains("props . name"));
        assert!(!text.contains("this"));
        assert!(text.contains("onClickHandler"));

        // setState head survives for the next rule
        let handler = &def.locals[0];
        let mut saw_set_state = false;
        handler.body.visit_runs(&mut |run| {
            if run_text(run).contains("setState") {
                saw_set_state = true;
            }
        });
        match &handler.body.statements[0] {
            Statement::SetState { fields, .. } => {
                assert_eq!(run_text(&fields[0].1), "count + 1");
            }
            other => panic!("expected setState statement, got {:?}", other),
        }
        assert!(!saw_set_state);
    }

    #[test]
    fn test_unknown_member_is_ambiguous() {
        let (mut def, mut ctx) = prepared(
            r#"
            class MyComponent extends Component {
              render() {
                return (<p>{this.mystery}</p>);
              }
            }
            "#,
        );
        let result = SelfRefRule.apply(&mut def, &mut ctx);
        assert!(matches!(
            result,
            Err(ConvertError::AmbiguousSelfReference { ref name, .. }) if name == "mystery"
        ));
    }

    #[test]
    fn test_unknown_state_field_is_ambiguous() {
        let (mut def, mut ctx) = prepared(
            r#"
            class MyComponent extends Component {
              render() {
                return (<p>{this.state.missing}</p>);
              }
            }
            "#,
        );
        let result = SelfRefRule.apply(&mut def, &mut ctx);
        assert!(matches!(
            result,
            Err(ConvertError::AmbiguousSelfReference { ref name, .. }) if name == "state.missing"
        ));
    }

    #[test]
    fn test_bare_this_is_ambiguous() {
        let (mut def, mut ctx) = prepared(
            r#"
            class MyComponent extends Component {
              render() {
                return (<p>{console.log(this)}</p>);
              }
            }
            "#,
        );
        let result = SelfRefRule.apply(&mut def, &mut ctx);
        assert!(matches!(
            result,
            Err(ConvertError::AmbiguousSelfReference { ref name, .. }) if name == "this"
        ));
    }

    #[test]
    fn test_synthetic_span_covers_replaced_tokens() {
        let (mut def, mut ctx) = prepared(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.state = { count: 0 }
              }
              render() {
                return (<p>{this.state.count}</p>);
              }
            }
            "#,
        );
        SelfRefRule.apply(&mut def, &mut ctx).unwrap();
        let return_run = match def.body.last() {
            Some(Statement::Return(run)) => run,
            other => panic!("expected return, got {:?}", other),
        };
        let synthetic = return_run
            .tokens
            .iter()
            .find(|t| t.synthetic)
            .expect("a synthetic token");
        assert!(synthetic.end > synthetic.start);
        assert_eq!(synthetic.token, Token::Identifier("count".to_string()));
    }
}
