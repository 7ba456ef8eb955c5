use crate::ast::{Block, ComponentDef, EffectDef, EffectOrigin, Statement, TokenRun};
use crate::parser::statement::find_set_state_calls;
use crate::tokenizer::{Delimiter, Token, TokenSpan};
use crate::warning::Warning;

use super::{ConvertError, ConvertResult, RewriteRule, RuleContext};

/// Splits every compound state mutation into one updater call per field.
///
/// A mutation that carried a completion callback additionally produces an
/// effect block depending on exactly the mutated field set, with the
/// callback as its body. The effect re-runs on any future change to those
/// fields, not only the one made at the call site; that divergence is
/// surfaced as a `W0601` warning rather than silently accepted.
///
/// Calls in statement position arrive as classified statements; calls nested
/// inside an opaque statement (a `try` block, a branch) are rewritten
/// token-wise in place.
pub struct SetStateRule;

impl RewriteRule for SetStateRule {
    fn name(&self) -> &'static str {
        "state-mutation-rewriting"
    }

    fn apply(&self, def: &mut ComponentDef, ctx: &mut RuleContext) -> ConvertResult<()> {
        let mut effects = Vec::new();
        for local in &mut def.locals {
            rewrite_block(&mut local.body, ctx, &mut effects)?;
        }
        for hook in &mut def.lifecycle {
            rewrite_block(&mut hook.body, ctx, &mut effects)?;
        }
        rewrite_statements(&mut def.body, ctx, &mut effects)?;
        def.effects.extend(effects);
        Ok(())
    }
}

fn rewrite_block(
    block: &mut Block,
    ctx: &mut RuleContext,
    effects: &mut Vec<EffectDef>,
) -> ConvertResult<()> {
    rewrite_statements(&mut block.statements, ctx, effects)
}

fn rewrite_statements(
    statements: &mut Vec<Statement>,
    ctx: &mut RuleContext,
    effects: &mut Vec<EffectDef>,
) -> ConvertResult<()> {
    let mut out = Vec::with_capacity(statements.len());
    for statement in statements.drain(..) {
        match statement {
            Statement::SetState {
                fields,
                callback,
                span,
            } => {
                let deps: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
                for (name, value) in fields {
                    let updater =
                        ctx.updater_for(&name)
                            .ok_or(ConvertError::AmbiguousSelfReference {
                                name: format!("state.{}", name),
                                span,
                            })?;
                    out.push(Statement::UpdaterCall {
                        updater,
                        value,
                        span,
                    });
                }
                if let Some(mut cb) = callback {
                    rewrite_statements(&mut cb.statements, ctx, effects)?;
                    ctx.warn(Warning::effect_approximation(&deps, span));
                    effects.push(EffectDef {
                        deps: Some(deps),
                        body: cb,
                        cleanup: None,
                        origin: EffectOrigin::StateCallback,
                        span,
                    });
                }
            }
            Statement::Opaque(mut run) => {
                splice_nested_calls(&mut run, ctx, effects)?;
                out.push(Statement::Opaque(run));
            }
            Statement::Return(mut run) => {
                splice_nested_calls(&mut run, ctx, effects)?;
                out.push(Statement::Return(run));
            }
            other => out.push(other),
        }
    }
    *statements = out;
    Ok(())
}

fn splice_nested_calls(
    run: &mut TokenRun,
    ctx: &mut RuleContext,
    effects: &mut Vec<EffectDef>,
) -> ConvertResult<()> {
    let calls = find_set_state_calls(&run.tokens)
        .map_err(|e| ConvertError::Internal(format!("setState call no longer parses: {}", e)))?;
    if calls.is_empty() {
        return Ok(());
    }

    // Splice back-to-front so earlier call indices stay valid.
    for call in calls.into_iter().rev() {
        let span = call.span;
        let deps: Vec<String> = call.fields.iter().map(|(name, _)| name.clone()).collect();
        let field_count = call.fields.len();

        let mut replacement: Vec<TokenSpan> = Vec::new();
        for (i, (name, value)) in call.fields.into_iter().enumerate() {
            let updater = ctx
                .updater_for(&name)
                .ok_or(ConvertError::AmbiguousSelfReference {
                    name: format!("state.{}", name),
                    span,
                })?;
            replacement.push(TokenSpan::synthetic(Token::Identifier(updater), span));
            replacement.push(TokenSpan::synthetic(
                Token::Delimiter(Delimiter::OpenParen),
                span,
            ));
            replacement.extend(value.tokens);
            replacement.push(TokenSpan::synthetic(
                Token::Delimiter(Delimiter::CloseParen),
                span,
            ));
            if i + 1 < field_count {
                replacement.push(TokenSpan::synthetic(
                    Token::Delimiter(Delimiter::Semicolon),
                    span,
                ));
            }
        }

        if let Some(mut cb) = call.callback {
            rewrite_statements(&mut cb.statements, ctx, effects)?;
            ctx.warn(Warning::effect_approximation(&deps, span));
            effects.push(EffectDef {
                deps: Some(deps),
                body: cb,
                cleanup: None,
                origin: EffectOrigin::StateCallback,
                span,
            });
        }

        run.tokens.splice(call.start..call.end, replacement);
    }
    Ok(())
}
