use crate::ast::ComponentDef;

use super::{ConvertResult, RewriteRule, RuleContext};

/// Inlines the render body: its statements become the function's trailing
/// statement sequence, the returned expression becoming the function's
/// return.
pub struct RenderInlineRule;

impl RewriteRule for RenderInlineRule {
    fn name(&self) -> &'static str {
        "render-inlining"
    }

    fn apply(&self, def: &mut ComponentDef, _ctx: &mut RuleContext) -> ConvertResult<()> {
        if let Some(render) = def.render.take() {
            def.body.extend(render.statements);
        }
        Ok(())
    }
}
