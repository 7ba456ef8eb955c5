use std::fmt;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::tokenizer::{Keyword, Operator, Span, Token, TokenSpan};

// Root of one parsed source unit
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub preamble: Vec<ImportDecl>,
    pub component: ComponentDef,
}

impl SourceUnit {
    pub fn new(preamble: Vec<ImportDecl>, component: ComponentDef) -> Self {
        Self {
            preamble,
            component,
        }
    }
}

/// One `import …;` line captured ahead of the component declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub tokens: Vec<TokenSpan>,
    pub module: Option<String>,
    pub span: Span,
}

impl ImportDecl {
    /// True for the UI framework import whose named list the emitter rewrites
    /// to the hooks the converted component actually uses.
    pub fn is_framework(&self) -> bool {
        self.module.as_deref() == Some("react")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    ClassBased,
    FunctionBased,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComponentKind::ClassBased => write!(f, "class"),
            ComponentKind::FunctionBased => write!(f, "function"),
        }
    }
}

// Component definition, both before and after conversion.
//
// A ClassBased definition populates constructor/methods/lifecycle/render and
// leaves the function-form fields empty; the rule engine moves everything
// across and a FunctionBased definition holds only state_cells, locals,
// effects, and body. `origin` keeps the parse-time kind so the emitter knows
// whether the framework import needs its named list rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub kind: ComponentKind,
    pub origin: ComponentKind,
    pub props_binding: Option<String>,
    pub constructor: Option<ConstructorBlock>,
    /// State fields declared with the `state = { … }` class field form.
    pub field_initializers: Vec<StateField>,
    pub methods: Vec<MethodDef>,
    pub lifecycle: Vec<LifecycleHook>,
    pub render: Option<Block>,
    pub state_cells: Vec<StateCell>,
    pub locals: Vec<LocalFn>,
    pub effects: Vec<EffectDef>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl ComponentDef {
    pub fn new(name: String, kind: ComponentKind, span: Span) -> Self {
        Self {
            name,
            kind,
            origin: kind,
            props_binding: None,
            constructor: None,
            field_initializers: Vec::new(),
            methods: Vec::new(),
            lifecycle: Vec::new(),
            render: None,
            state_cells: Vec::new(),
            locals: Vec::new(),
            effects: Vec::new(),
            body: Vec::new(),
            span,
        }
    }

    pub fn lifecycle_hook(&self, kind: LifecycleKind) -> Option<&LifecycleHook> {
        self.lifecycle.iter().find(|hook| hook.kind == kind)
    }

    /// State fields in declaration order: field initializers first, then the
    /// constructor's state assignment.
    pub fn state_fields(&self) -> Vec<&StateField> {
        let mut fields: Vec<&StateField> = self.field_initializers.iter().collect();
        if let Some(ctor) = &self.constructor {
            for statement in &ctor.body.statements {
                if let Statement::StateInit { fields: fs, .. } = statement {
                    fields.extend(fs.iter());
                }
            }
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorBlock {
    pub params: TokenRun,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub params: TokenRun,
    pub is_async: bool,
    pub body: Block,
    /// Derived at parse time by scanning the body for `this.state` accesses.
    pub references_instance_state: bool,
    pub span: Span,
}

/// A method converted into a locally-scoped function binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFn {
    pub name: String,
    pub params: TokenRun,
    pub is_async: bool,
    pub body: Block,
    pub span: Span,
}

impl From<MethodDef> for LocalFn {
    fn from(method: MethodDef) -> Self {
        Self {
            name: method.name,
            params: method.params,
            is_async: method.is_async,
            body: method.body,
            span: method.span,
        }
    }
}

/// The three lifecycle points translated into effect blocks, keyed by the
/// host framework's method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter, AsRefStr)]
pub enum LifecycleKind {
    #[strum(serialize = "componentDidMount")]
    Mount,
    #[strum(serialize = "componentDidUpdate")]
    Update,
    #[strum(serialize = "componentWillUnmount")]
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleHook {
    pub kind: LifecycleKind,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateField {
    pub name: String,
    pub initial: TokenRun,
    pub span: Span,
}

/// A state cell: the value binding plus its updater, both derived from one
/// state field (`count` becomes `[count, setCount]`).
#[derive(Debug, Clone, PartialEq)]
pub struct StateCell {
    pub field: StateField,
    pub value_binding: String,
    pub updater_binding: String,
}

impl From<StateField> for StateCell {
    fn from(field: StateField) -> Self {
        let value_binding = field.name.clone();
        let updater_binding = updater_name(&field.name);
        Self {
            field,
            value_binding,
            updater_binding,
        }
    }
}

/// `count` → `setCount`, `isLoading` → `setIsLoading`.
pub fn updater_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOrigin {
    Lifecycle,
    StateCallback,
}

/// A reactive effect block.
///
/// `deps` is `None` when the effect takes no dependency argument at all (it
/// re-runs after every render) and `Some(vec![])` for the run-once form.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDef {
    pub deps: Option<Vec<String>>,
    pub body: Block,
    pub cleanup: Option<Block>,
    pub origin: EffectOrigin,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    pub fn empty(span: Span) -> Self {
        Self {
            statements: Vec::new(),
            span,
        }
    }

    pub fn visit_runs(&self, f: &mut impl FnMut(&TokenRun)) {
        for statement in &self.statements {
            statement.visit_runs(f);
        }
    }

    pub fn visit_runs_mut(&mut self, f: &mut impl FnMut(&mut TokenRun)) {
        for statement in &mut self.statements {
            statement.visit_runs_mut(f);
        }
    }

    /// True if any token run in this block reads `this.state`.
    pub fn references_instance_state(&self) -> bool {
        let mut found = false;
        self.visit_runs(&mut |run| {
            if run.contains_member_access("state") {
                found = true;
            }
        });
        found
    }
}

// Statement forms the rewrite rules dispatch on. Anything without a
// recognized shape stays opaque and survives the pipeline token-for-token.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Opaque(TokenRun),
    /// `return <expr>;` with the full run kept, keyword included.
    Return(TokenRun),
    /// `super(…);` in a constructor, dropped during state materialization.
    Super(TokenRun),
    /// `this.state = { … };` or the `state = { … }` field initializer.
    StateInit { fields: Vec<StateField>, span: Span },
    /// `this.m = this.m.bind(this);`, dropped during state materialization.
    MethodBind { name: String, span: Span },
    /// `this.setState({ … }, callback?);` in statement position.
    SetState {
        fields: Vec<(String, TokenRun)>,
        callback: Option<Block>,
        span: Span,
    },
    /// Updater invocation produced from one setState field.
    UpdaterCall {
        updater: String,
        value: TokenRun,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Opaque(run) | Statement::Return(run) | Statement::Super(run) => run.span(),
            Statement::StateInit { span, .. }
            | Statement::MethodBind { span, .. }
            | Statement::SetState { span, .. }
            | Statement::UpdaterCall { span, .. } => *span,
        }
    }

    pub fn visit_runs(&self, f: &mut impl FnMut(&TokenRun)) {
        match self {
            Statement::Opaque(run) | Statement::Return(run) | Statement::Super(run) => f(run),
            Statement::StateInit { fields, .. } => {
                for field in fields {
                    f(&field.initial);
                }
            }
            Statement::MethodBind { .. } => {}
            Statement::SetState {
                fields, callback, ..
            } => {
                for (_, value) in fields {
                    f(value);
                }
                if let Some(block) = callback {
                    block.visit_runs(f);
                }
            }
            Statement::UpdaterCall { value, .. } => f(value),
        }
    }

    pub fn visit_runs_mut(&mut self, f: &mut impl FnMut(&mut TokenRun)) {
        match self {
            Statement::Opaque(run) | Statement::Return(run) | Statement::Super(run) => f(run),
            Statement::StateInit { fields, .. } => {
                for field in fields {
                    f(&mut field.initial);
                }
            }
            Statement::MethodBind { .. } => {}
            Statement::SetState {
                fields, callback, ..
            } => {
                for (_, value) in fields {
                    f(value);
                }
                if let Some(block) = callback {
                    block.visit_runs_mut(f);
                }
            }
            Statement::UpdaterCall { value, .. } => f(value),
        }
    }
}

/// A spanned, delimiter-balanced slice of the token stream treated as an
/// opaque expression. Runs never contain trivia tokens; the emitter recovers
/// spacing and comments from the gaps between spans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenRun {
    pub tokens: Vec<TokenSpan>,
}

impl TokenRun {
    pub fn new(tokens: Vec<TokenSpan>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => Span {
                start: first.start,
                end: last.end,
                line: first.line,
                column: first.column,
            },
            _ => Span {
                start: 0,
                end: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Looks for `this.<member>` anywhere in the run.
    pub fn contains_member_access(&self, member: &str) -> bool {
        self.tokens.windows(3).any(|w| {
            matches!(&w[0].token, Token::Keyword(Keyword::This))
                && matches!(&w[1].token, Token::Operator(Operator::Dot))
                && w[2].token.identifier() == Some(member)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn run_of(source: &str) -> TokenRun {
        let tokens = Tokenizer::new().tokenize(source).unwrap();
        TokenRun::new(tokens.into_iter().filter(|t| !t.is_trivia()).collect())
    }

    #[test]
    fn test_updater_name() {
        assert_eq!(updater_name("count"), "setCount");
        assert_eq!(updater_name("isLoading"), "setIsLoading");
        assert_eq!(updater_name("name"), "setName");
    }

    #[test]
    fn test_lifecycle_kind_names() {
        use std::str::FromStr;
        assert_eq!(
            LifecycleKind::from_str("componentDidMount").unwrap(),
            LifecycleKind::Mount
        );
        assert_eq!(
            LifecycleKind::from_str("componentWillUnmount").unwrap(),
            LifecycleKind::Unmount
        );
        assert_eq!(LifecycleKind::Update.to_string(), "componentDidUpdate");
        assert!(LifecycleKind::from_str("render").is_err());
    }

    #[test]
    fn test_contains_member_access() {
        let run = run_of("this.state.count + 1");
        assert!(run.contains_member_access("state"));
        assert!(!run.contains_member_access("props"));

        let run = run_of("props.count || 0");
        assert!(!run.contains_member_access("state"));
    }

    #[test]
    fn test_run_span_covers_tokens() {
        let run = run_of("count + 1");
        let span = run.span();
        assert_eq!(span.start, 0);
        assert_eq!(span.end, "count + 1".len());
    }

    #[test]
    fn test_block_state_reference_scan() {
        let span = Span {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        };
        let block = Block::new(vec![Statement::Opaque(run_of("this.state.count"))], span);
        assert!(block.references_instance_state());

        let block = Block::new(vec![Statement::Opaque(run_of("count + 1"))], span);
        assert!(!block.references_instance_state());
    }
}
