use crate::ast::{Block, ComponentDef, EffectDef, EffectOrigin, LifecycleKind, Statement};
use crate::tokenizer::{Delimiter, Keyword, Operator, Token, TokenSpan};

use super::{ConvertError, ConvertResult, RewriteRule, RuleContext};

/// Translates lifecycle hooks into effect blocks.
///
/// Mount becomes an effect with an empty dependency list; Unmount folds into
/// that effect's cleanup position. Update becomes an effect with no
/// dependency argument at all, so it re-runs after every render.
///
/// The fold is refused when the mount body contains a top-level `return`:
/// appending a cleanup after it would reorder side effects, and reordering
/// is never done silently.
pub struct LifecycleRule;

impl RewriteRule for LifecycleRule {
    fn name(&self) -> &'static str {
        "lifecycle-translation"
    }

    fn apply(&self, def: &mut ComponentDef, _ctx: &mut RuleContext) -> ConvertResult<()> {
        let mut mount = None;
        let mut update = None;
        let mut unmount = None;
        for hook in def.lifecycle.drain(..) {
            match hook.kind {
                LifecycleKind::Mount => mount = Some(hook),
                LifecycleKind::Update => update = Some(hook),
                LifecycleKind::Unmount => unmount = Some(hook),
            }
        }

        if mount.is_some() || unmount.is_some() {
            if let (Some(m), Some(_)) = (&mount, &unmount) {
                if has_effect_level_return(&m.body) {
                    return Err(ConvertError::LifecycleConflict { span: m.span });
                }
            }
            let span = mount
                .as_ref()
                .or(unmount.as_ref())
                .map(|hook| hook.span)
                .unwrap_or(def.span);
            let body = mount
                .map(|hook| hook.body)
                .unwrap_or_else(|| Block::empty(span));
            def.effects.push(EffectDef {
                deps: Some(Vec::new()),
                body,
                cleanup: unmount.map(|hook| hook.body),
                origin: EffectOrigin::Lifecycle,
                span,
            });
        }

        if let Some(hook) = update {
            def.effects.push(EffectDef {
                deps: None,
                body: hook.body,
                cleanup: None,
                origin: EffectOrigin::Lifecycle,
                span: hook.span,
            });
        }

        Ok(())
    }
}

/// A `return` at effect level, nested branches included, means a cleanup
/// appended after the body could be skipped or reordered. Returns inside
/// nested function bodies do not count.
fn has_effect_level_return(block: &Block) -> bool {
    block.statements.iter().any(|statement| match statement {
        Statement::Return(_) => true,
        Statement::Opaque(run) => run_has_top_level_return(&run.tokens),
        _ => false,
    })
}

fn run_has_top_level_return(tokens: &[TokenSpan]) -> bool {
    // Braces opened right after `=>` or `function` start a nested function
    // body; a `return` under one of those belongs to that function.
    let mut brace_stack: Vec<bool> = Vec::new();
    let mut pending_fn_body = false;
    for tok in tokens {
        match &tok.token {
            Token::Operator(Operator::Arrow) | Token::Keyword(Keyword::Function) => {
                pending_fn_body = true;
            }
            Token::Delimiter(Delimiter::OpenBrace) => {
                brace_stack.push(pending_fn_body);
                pending_fn_body = false;
            }
            Token::Delimiter(Delimiter::CloseBrace) => {
                brace_stack.pop();
            }
            Token::Keyword(Keyword::Return) => {
                if !brace_stack.iter().any(|is_fn| *is_fn) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
