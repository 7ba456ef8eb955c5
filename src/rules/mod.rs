//! The rewrite rule engine.
//!
//! Conversion is an ordered list of small rules, each adjusting one aspect of
//! the component model. The order is load-bearing: later rules assume the
//! normalization done by earlier ones (render inlining before self-reference
//! elimination, state materialization before lifecycle translation).

pub mod kind;
pub mod lifecycle;
pub mod methods;
pub mod render;
pub mod self_refs;
pub mod set_state;
pub mod state;

use std::collections::HashSet;

use thiserror::Error;

use crate::ast::{updater_name, ComponentDef, ComponentKind};
use crate::tokenizer::Span;
use crate::warning::Warning;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("constructor contains logic beyond field initialization and handler binding: {detail} at {span}")]
    UnsupportedConstructor { detail: String, span: Span },
    #[error("cannot resolve 'this.{name}' to a known field or method at {span}")]
    AmbiguousSelfReference { name: String, span: Span },
    #[error("mount and unmount bodies cannot merge into one effect without reordering side effects at {span}")]
    LifecycleConflict { span: Span },
    #[error("internal rewrite error: {0}")]
    Internal(String),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Shared state for one engine run: the renaming tables consulted during
/// self-reference elimination plus the warning sink.
///
/// Both tables are derived from the class model up front. The state table is
/// keyed by field name; the value binding is the field name itself and the
/// updater binding follows the `setX` convention.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub props_binding: String,
    methods: HashSet<String>,
    state_fields: Vec<String>,
    warnings: Vec<Warning>,
}

impl RuleContext {
    pub fn new(def: &ComponentDef) -> Self {
        let methods = def.methods.iter().map(|m| m.name.clone()).collect();
        let state_fields = def
            .state_fields()
            .iter()
            .map(|field| field.name.clone())
            .collect();
        Self {
            props_binding: def
                .props_binding
                .clone()
                .unwrap_or_else(|| "props".to_string()),
            methods,
            state_fields,
            warnings: Vec::new(),
        }
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn is_state_field(&self, name: &str) -> bool {
        self.state_fields.iter().any(|f| f == name)
    }

    pub fn updater_for(&self, field: &str) -> Option<String> {
        self.is_state_field(field).then(|| updater_name(field))
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// One rewrite step. Rules are independently testable; the engine only
/// guarantees their order.
pub trait RewriteRule {
    fn name(&self) -> &'static str;
    fn apply(&self, def: &mut ComponentDef, ctx: &mut RuleContext) -> ConvertResult<()>;
}

pub struct RuleEngine {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(kind::KindRule),
                Box::new(render::RenderInlineRule),
                Box::new(methods::MethodRule),
                Box::new(self_refs::SelfRefRule),
                Box::new(state::StateRule),
                Box::new(set_state::SetStateRule),
                Box::new(lifecycle::LifecycleRule),
            ],
        }
    }

    /// Runs every rule in order. FunctionBased input passes through
    /// untouched; that is what makes the pipeline idempotent on its own
    /// output.
    #[tracing::instrument(level = "debug", skip(self, def, ctx), fields(component = %def.name))]
    pub fn run(&self, def: &mut ComponentDef, ctx: &mut RuleContext) -> ConvertResult<()> {
        if def.kind == ComponentKind::FunctionBased {
            tracing::debug!("already function-based, passing through");
            return Ok(());
        }
        for rule in &self.rules {
            tracing::debug!(rule = rule.name(), "applying rewrite rule");
            rule.apply(def, ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ast::SourceUnit;
    use crate::parser::parse_source_unit;
    use crate::tokenizer::Tokenizer;

    pub fn parse_unit(source: &str) -> SourceUnit {
        let tokens = Tokenizer::new().tokenize(source).unwrap();
        parse_source_unit(&tokens).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::parse_unit;
    use super::*;

    #[test]
    fn test_context_tables() {
        let unit = parse_unit(
            r#"
            class MyComponent extends Component {
              constructor(props) {
                super(props);
                this.state = { count: 0, name: "" }
              }
              onClickHandler(e) {
                this.setState({count: this.state.count + 1})
              }
              render() {
                return (<p>{this.state.count}</p>);
              }
            }
            "#,
        );
        let ctx = RuleContext::new(&unit.component);
        assert_eq!(ctx.props_binding, "props");
        assert!(ctx.is_method("onClickHandler"));
        assert!(!ctx.is_method("render"));
        assert!(ctx.is_state_field("count"));
        assert!(ctx.is_state_field("name"));
        assert_eq!(ctx.updater_for("count").as_deref(), Some("setCount"));
        assert_eq!(ctx.updater_for("missing"), None);
    }

    #[test]
    fn test_engine_converts_kind() {
        let unit = parse_unit(
            r#"
            class MyComponent extends Component {
              render() {
                return (<p>ok</p>);
              }
            }
            "#,
        );
        let mut def = unit.component;
        let mut ctx = RuleContext::new(&def);
        RuleEngine::new().run(&mut def, &mut ctx).unwrap();
        assert_eq!(def.kind, ComponentKind::FunctionBased);
        assert_eq!(def.origin, ComponentKind::ClassBased);
        assert!(def.render.is_none());
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn test_engine_passthrough() {
        let unit = parse_unit(
            r#"
            function MyComponent(props) {
              const [count, setCount] = useState(0);
              return (<p>{count}</p>);
            }
            "#,
        );
        let mut def = unit.component;
        let before = def.clone();
        let mut ctx = RuleContext::new(&def);
        RuleEngine::new().run(&mut def, &mut ctx).unwrap();
        assert_eq!(def, before);
        assert!(ctx.warnings().is_empty());
    }
}
