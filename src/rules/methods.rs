use crate::ast::{ComponentDef, LocalFn};

use super::{ConvertResult, RewriteRule, RuleContext};

/// Turns every method into a locally-scoped function binding, in original
/// order. Callers' `this.<method>` references are rewritten by the
/// self-reference rule using the names registered in the context.
pub struct MethodRule;

impl RewriteRule for MethodRule {
    fn name(&self) -> &'static str {
        "method-defunctionalization"
    }

    fn apply(&self, def: &mut ComponentDef, _ctx: &mut RuleContext) -> ConvertResult<()> {
        for method in def.methods.drain(..) {
            tracing::debug!(
                method = %method.name,
                reads_state = method.references_instance_state,
                "lowering method to local binding"
            );
            def.locals.push(LocalFn::from(method));
        }
        Ok(())
    }
}
