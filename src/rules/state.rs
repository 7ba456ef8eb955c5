use crate::ast::{ComponentDef, Statement};

use super::{ConvertError, ConvertResult, RewriteRule, RuleContext};

/// Materializes each state field into a state cell and discards the
/// constructor.
///
/// Only three constructor statement shapes survive extraction: the `super`
/// call, the state assignment, and handler bindings (made unnecessary by the
/// target form, so dropped). Anything else means the constructor carries
/// logic this tool cannot safely decompose, and the run aborts rather than
/// silently dropping it.
pub struct StateRule;

impl RewriteRule for StateRule {
    fn name(&self) -> &'static str {
        "state-materialization"
    }

    fn apply(&self, def: &mut ComponentDef, _ctx: &mut RuleContext) -> ConvertResult<()> {
        for field in def.field_initializers.drain(..) {
            def.state_cells.push(field.into());
        }

        if let Some(ctor) = def.constructor.take() {
            for statement in ctor.body.statements {
                match statement {
                    Statement::Super(_) => {}
                    Statement::MethodBind { name, .. } => {
                        tracing::debug!(handler = %name, "dropping handler binding");
                    }
                    Statement::StateInit { fields, .. } => {
                        for field in fields {
                            def.state_cells.push(field.into());
                        }
                    }
                    other => {
                        return Err(ConvertError::UnsupportedConstructor {
                            detail: describe(&other),
                            span: other.span(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn describe(statement: &Statement) -> String {
    match statement {
        Statement::Return(_) => "return statement".to_string(),
        Statement::SetState { .. } => "state mutation".to_string(),
        _ => "statement that is neither field initialization nor handler binding".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::parse_unit;
    use super::*;

    fn apply_to(source: &str) -> ConvertResult<ComponentDef> {
        let unit = parse_unit(source);
        let mut def = unit.component;
        let mut ctx = RuleContext::new(&def);
        StateRule.apply(&mut def, &mut ctx).map(|_| def)
    }

    #[test]
    fn test_fields_become_cells_in_order() {
        let def = apply_to(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.state = {
                  data: null,
                  isLoading: false,
                  error: null
                }
              }
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        )
        .unwrap();
        assert!(def.constructor.is_none());
        let names: Vec<_> = def
            .state_cells
            .iter()
            .map(|c| (c.value_binding.as_str(), c.updater_binding.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("data", "setData"),
                ("isLoading", "setIsLoading"),
                ("error", "setError"),
            ]
        );
    }

    #[test]
    fn test_field_initializer_cells() {
        let def = apply_to(
            r#"
            class MyComponent extends Component {
              state = { count: 0 };
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        )
        .unwrap();
        assert_eq!(def.state_cells.len(), 1);
        assert_eq!(def.state_cells[0].value_binding, "count");
    }

    #[test]
    fn test_bindings_are_dropped() {
        let def = apply_to(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.onClickHandler = this.onClickHandler.bind(this);
              }
              onClickHandler(e) {
                console.log('hi');
              }
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        )
        .unwrap();
        assert!(def.constructor.is_none());
        assert!(def.state_cells.is_empty());
    }

    #[test]
    fn test_constructor_logic_aborts() {
        let result = apply_to(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                if (props.debug) {
                  console.log('constructed');
                }
              }
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        );
        assert!(matches!(
            result,
            Err(ConvertError::UnsupportedConstructor { .. })
        ));
    }

    #[test]
    fn test_constructor_set_state_aborts() {
        let result = apply_to(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.setState({count: 0});
              }
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        );
        assert!(matches!(
            result,
            Err(ConvertError::UnsupportedConstructor { ref detail, .. }) if detail == "state mutation"
        ));
    }
}
