use crate::ast::{ComponentDef, ComponentKind};

use super::{ConvertResult, RewriteRule, RuleContext};

/// Retags the definition as function-based, keeping the name and the props
/// binding. A class without a constructor never named its props parameter,
/// so the conventional name is filled in.
pub struct KindRule;

impl RewriteRule for KindRule {
    fn name(&self) -> &'static str {
        "kind-change"
    }

    fn apply(&self, def: &mut ComponentDef, ctx: &mut RuleContext) -> ConvertResult<()> {
        def.kind = ComponentKind::FunctionBased;
        if def.props_binding.is_none() {
            def.props_binding = Some(ctx.props_binding.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::parse_unit;
    use super::*;

    #[test]
    fn test_retag_keeps_name_and_props() {
        let unit = parse_unit(
            r#"
            class Greeting extends Component {
              constructor(myProps) {
                super(myProps);
              }
              render() {
                return (<p>hi</p>);
              }
            }
            "#,
        );
        let mut def = unit.component;
        let mut ctx = RuleContext::new(&def);
        KindRule.apply(&mut def, &mut ctx).unwrap();
        assert_eq!(def.kind, ComponentKind::FunctionBased);
        assert_eq!(def.origin, ComponentKind::ClassBased);
        assert_eq!(def.name, "Greeting");
        assert_eq!(def.props_binding.as_deref(), Some("myProps"));
    }

    #[test]
    fn test_default_props_binding() {
        let unit = parse_unit(
            r#"
            class Greeting extends Component {
              render() {
                return (<p>hi</p>);
              }
            }
            "#,
        );
        let mut def = unit.component;
        let mut ctx = RuleContext::new(&def);
        KindRule.apply(&mut def, &mut ctx).unwrap();
        assert_eq!(def.props_binding.as_deref(), Some("props"));
    }
}
