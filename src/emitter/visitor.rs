//! Serializes a function-form component back into source text.
//!
//! Declared order: preamble imports, function header, state cells (original
//! field order), local function bindings (original method order), effect
//! blocks (mount/unmount merged block first, then the update block, then
//! dependency-specific blocks in call-site order), trailing statements and
//! return.
//!
//! Opaque token runs are re-emitted from the original source wherever the
//! spans between neighboring tokens are still contiguous, so untouched
//! expressions keep their exact text, embedded comments included. Around
//! synthetic tokens the spacing falls back to a small set of adjacency
//! rules.

use crate::ast::{
    ComponentDef, ComponentKind, EffectDef, EffectOrigin, ImportDecl, SourceUnit, Statement,
    TokenRun,
};
use crate::emitter::config::EmitterConfig;
use crate::emitter::error::EmitError;
use crate::tokenizer::{Delimiter, Operator, Token, TokenSpan};

pub struct EmitterVisitor<'a> {
    config: EmitterConfig,
    source: &'a str,
    indent_level: usize,
    output: String,
}

impl<'a> EmitterVisitor<'a> {
    pub fn new(source: &'a str, config: EmitterConfig) -> Self {
        Self {
            config,
            source,
            indent_level: 0,
            output: String::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, unit), fields(component = %unit.component.name))]
    pub fn emit(&mut self, unit: &SourceUnit) -> Result<String, EmitError> {
        let def = &unit.component;
        if def.kind == ComponentKind::ClassBased {
            return Err(EmitError::Format(
                "definition is still class-based".to_string(),
            ));
        }

        self.emit_preamble(unit)?;

        self.write(&format!(
            "function {}({}) {{",
            def.name,
            def.props_binding.as_deref().unwrap_or("")
        ))?;
        self.indent();
        let mut wrote_section = false;

        if !def.state_cells.is_empty() {
            self.section_break(&mut wrote_section)?;
            for cell in &def.state_cells {
                self.newline()?;
                self.write(&format!(
                    "const [{}, {}] = useState(",
                    cell.value_binding, cell.updater_binding
                ))?;
                self.write_run(&cell.field.initial)?;
                self.write(");")?;
            }
        }

        for local in &def.locals {
            self.section_break(&mut wrote_section)?;
            self.newline()?;
            let marker = if local.is_async { "async " } else { "" };
            self.write(&format!("const {} = {}(", local.name, marker))?;
            self.write_run(&local.params)?;
            self.write(") => {")?;
            self.indent();
            for statement in &local.body.statements {
                self.newline()?;
                self.emit_statement(statement)?;
            }
            self.dedent();
            self.newline()?;
            self.write("};")?;
        }

        for effect in ordered_effects(def) {
            self.section_break(&mut wrote_section)?;
            self.emit_effect(effect)?;
        }

        if !def.body.is_empty() {
            self.section_break(&mut wrote_section)?;
            let mut prev_end: Option<usize> = None;
            for statement in &def.body {
                let span = statement.span();
                if let Some(end) = prev_end {
                    if self.gap_has_blank_line(end, span.start) {
                        self.blank_line();
                    }
                }
                self.newline()?;
                self.emit_statement(statement)?;
                prev_end = Some(span.end);
            }
        }

        self.dedent();
        self.newline()?;
        self.write("}")?;
        self.output.push('\n');
        Ok(self.output.clone())
    }

    fn emit_preamble(&mut self, unit: &SourceUnit) -> Result<(), EmitError> {
        if unit.preamble.is_empty() {
            return Ok(());
        }
        for import in &unit.preamble {
            let rewritten = if unit.component.origin == ComponentKind::ClassBased
                && import.is_framework()
            {
                self.framework_import_line(import, &unit.component)
            } else {
                None
            };
            match rewritten {
                Some(line) => self.write(&line)?,
                None => {
                    let run = TokenRun::new(import.tokens.clone());
                    self.write_run(&run)?;
                }
            }
            self.output.push('\n');
        }
        self.output.push('\n');
        Ok(())
    }

    /// Rebuilds the framework import's named list from the hooks the
    /// converted component actually calls. Returns `None` when the original
    /// line can stand as-is.
    fn framework_import_line(&self, import: &ImportDecl, def: &ComponentDef) -> Option<String> {
        let mut hooks = Vec::new();
        if !def.state_cells.is_empty() {
            hooks.push("useState");
        }
        if !def.effects.is_empty() {
            hooks.push("useEffect");
        }

        let default_name = import
            .tokens
            .get(1)
            .and_then(|t| t.token.identifier())
            .map(str::to_string);
        let path = import.tokens.iter().find_map(|t| match &t.token {
            Token::Literal(_) => Some(self.token_text(t)),
            _ => None,
        })?;

        match (default_name, hooks.is_empty()) {
            (Some(name), false) => Some(format!(
                "import {}, {{{}}} from {};",
                name,
                hooks.join(", "),
                path
            )),
            (Some(name), true) => Some(format!("import {} from {};", name, path)),
            (None, false) => Some(format!("import {{{}}} from {};", hooks.join(", "), path)),
            (None, true) => None,
        }
    }

    fn emit_effect(&mut self, effect: &EffectDef) -> Result<(), EmitError> {
        self.newline()?;
        self.write("useEffect(() => {")?;
        self.indent();
        for statement in &effect.body.statements {
            self.newline()?;
            self.emit_statement(statement)?;
        }
        if let Some(cleanup) = &effect.cleanup {
            if !effect.body.statements.is_empty() {
                self.blank_line();
            }
            self.newline()?;
            self.write("return () => {")?;
            self.indent();
            for statement in &cleanup.statements {
                self.newline()?;
                self.emit_statement(statement)?;
            }
            self.dedent();
            self.newline()?;
            self.write("};")?;
        }
        self.dedent();
        self.newline()?;
        match &effect.deps {
            None => self.write("});")?,
            Some(deps) if deps.is_empty() => self.write("}, []);")?,
            Some(deps) => self.write(&format!("}}, [{}]);", deps.join(", ")))?,
        }
        Ok(())
    }

    fn emit_statement(&mut self, statement: &Statement) -> Result<(), EmitError> {
        match statement {
            Statement::Opaque(run) | Statement::Return(run) => self.write_run(run),
            Statement::UpdaterCall { updater, value, .. } => {
                self.write(&format!("{}(", updater))?;
                self.write_run(value)?;
                self.write(");")
            }
            other => Err(EmitError::Statement(format!("{:?}", other))),
        }
    }

    /// Emits a token run, recovering inter-token text from the source where
    /// spans are contiguous and falling back to adjacency spacing around
    /// synthetic tokens. Newlines inside gaps are re-indented relative to
    /// the run's first-token column.
    fn write_run(&mut self, run: &TokenRun) -> Result<(), EmitError> {
        let source = self.source;
        let base_column = run.tokens.first().map(|t| t.column).unwrap_or(1);
        let mut prev: Option<&TokenSpan> = None;
        for tok in &run.tokens {
            if let Some(p) = prev {
                if p.end <= tok.start && tok.start <= source.len() {
                    let gap = &source[p.end..tok.start];
                    self.write_gap(gap, base_column)?;
                } else {
                    self.write(adjacency_gap(p, tok))?;
                }
            }
            let text = self.token_text(tok);
            self.write(&text)?;
            prev = Some(tok);
        }
        Ok(())
    }

    fn token_text(&self, tok: &TokenSpan) -> String {
        if !tok.synthetic && tok.start <= tok.end && tok.end <= self.source.len() {
            self.source[tok.start..tok.end].to_string()
        } else {
            tok.token.to_string()
        }
    }

    fn write_gap(&mut self, gap: &str, base_column: usize) -> Result<(), EmitError> {
        if !gap.contains('\n') {
            return self.write(gap);
        }
        let lines: Vec<&str> = gap.split('\n').collect();
        self.write(lines[0].trim_end_matches('\r'))?;
        let last = lines.len() - 1;
        for (i, raw) in lines.iter().enumerate().skip(1) {
            self.output.push('\n');
            let line = raw.trim_end_matches('\r');
            let content = line.trim_start_matches([' ', '\t']);
            if content.is_empty() && i != last {
                continue;
            }
            let original_leading = line.len() - content.len();
            let relative = original_leading.saturating_sub(base_column.saturating_sub(1));
            let pad = " ".repeat(self.indent_width() + relative);
            self.output.push_str(&pad);
            self.output.push_str(content);
        }
        Ok(())
    }

    fn gap_has_blank_line(&self, end: usize, start: usize) -> bool {
        if end <= start && start <= self.source.len() {
            self.source[end..start].matches('\n').count() >= 2
        } else {
            false
        }
    }

    fn write(&mut self, text: &str) -> Result<(), EmitError> {
        self.output.push_str(text);
        Ok(())
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn indent_width(&self) -> usize {
        self.indent_level * self.config.indent_spaces
    }

    fn newline(&mut self) -> Result<(), EmitError> {
        self.output.push('\n');
        let pad = " ".repeat(self.indent_width());
        self.write(&pad)
    }

    fn blank_line(&mut self) {
        self.output.push('\n');
    }

    fn section_break(&mut self, wrote_section: &mut bool) -> Result<(), EmitError> {
        if *wrote_section && self.config.section_spacing {
            self.blank_line();
        }
        *wrote_section = true;
        Ok(())
    }
}

/// Mount/unmount block first, then the update block, then the
/// dependency-specific blocks in the order their triggering calls appeared.
fn ordered_effects(def: &ComponentDef) -> Vec<&EffectDef> {
    let lifecycle_mount = def
        .effects
        .iter()
        .filter(|e| e.origin == EffectOrigin::Lifecycle && e.deps.is_some());
    let lifecycle_update = def
        .effects
        .iter()
        .filter(|e| e.origin == EffectOrigin::Lifecycle && e.deps.is_none());
    let callbacks = def
        .effects
        .iter()
        .filter(|e| e.origin == EffectOrigin::StateCallback);
    lifecycle_mount
        .chain(lifecycle_update)
        .chain(callbacks)
        .collect()
}

fn adjacency_gap(prev: &TokenSpan, next: &TokenSpan) -> &'static str {
    match &next.token {
        Token::Delimiter(
            Delimiter::CloseParen
            | Delimiter::CloseBracket
            | Delimiter::Comma
            | Delimiter::Semicolon
            | Delimiter::Colon,
        ) => "",
        Token::Operator(Operator::Dot | Operator::Increment | Operator::Decrement) => "",
        Token::Delimiter(Delimiter::OpenParen | Delimiter::OpenBracket) => match &prev.token {
            Token::Identifier(_)
            | Token::Delimiter(Delimiter::CloseParen | Delimiter::CloseBracket) => "",
            _ => " ",
        },
        _ => match &prev.token {
            Token::Operator(Operator::Dot | Operator::Not) => "",
            Token::Delimiter(Delimiter::OpenParen | Delimiter::OpenBracket) => "",
            _ => " ",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source_unit;
    use crate::rules::{RuleContext, RuleEngine};
    use crate::tokenizer::Tokenizer;

    fn emit(source: &str) -> String {
        let tokens = Tokenizer::new().tokenize(source).unwrap();
        let mut unit = parse_source_unit(&tokens).unwrap();
        let mut ctx = RuleContext::new(&unit.component);
        RuleEngine::new().run(&mut unit.component, &mut ctx).unwrap();
        EmitterVisitor::new(source, EmitterConfig::default())
            .emit(&unit)
            .unwrap()
    }

    #[test]
    fn test_minimal_render_only() {
        let output = emit(
            r#"class MyComponent extends React.Component {
  render() {
    return <p>Hello, {this.props.name}</p>;
  }
}"#,
        );
        assert!(output.starts_with("function MyComponent(props) {"));
        assert!(output.contains("return <p>Hello, {props.name}</p>;"));
        assert!(!output.contains("useState"));
        assert!(!output.contains("useEffect"));
        assert!(!output.contains("this"));
    }

    #[test]
    fn test_state_cells_before_locals() {
        let output = emit(
            r#"class MyComponent extends React.Component {
  constructor(props) {
    super(props);
    this.state = {
      count: props.count || 0
    }
  }
  onClickHandler(e) {
    this.setState({count: this.state.count + 1})
  }
  render() {
    return (<p>{this.state.count}</p>);
  }
}"#,
        );
        let cell = output.find("const [count, setCount] = useState(props.count || 0);");
        let local = output.find("const onClickHandler = (e) => {");
        let update = output.find("setCount(count + 1);");
        let ret = output.find("return (<p>{count}</p>);");
        assert!(cell.is_some(), "missing state cell in:\n{}", output);
        assert!(local.is_some(), "missing local fn in:\n{}", output);
        assert!(update.is_some(), "missing updater call in:\n{}", output);
        assert!(ret.is_some(), "missing return in:\n{}", output);
        assert!(cell < local && local < update && update < ret);
    }

    #[test]
    fn test_effect_rendering() {
        let output = emit(
            r#"class MyComponent extends React.Component {
  componentDidMount() {
    loadAsyncData();
  }
  componentWillUnmount() {
    console.log('component will unmount');
  }
  componentDidUpdate() {
    console.log('component updated!');
  }
  render() {
    return (<p>ok</p>);
  }
}"#,
        );
        let mount = output.find("useEffect(() => {\n    loadAsyncData();").unwrap();
        assert!(output.contains("return () => {\n      console.log('component will unmount');"));
        assert!(output.contains("}, []);"));
        let update = output
            .find("useEffect(() => {\n    console.log('component updated!');\n  });")
            .unwrap();
        assert!(mount < update);
    }

    #[test]
    fn test_framework_import_rewrite() {
        let output = emit(
            r#"import React, {Component} from 'react';

class MyComponent extends Component {
  constructor(props) {
    super(props);
    this.state = { count: 0 }
  }
  render() {
    return (<p>{this.state.count}</p>);
  }
}"#,
        );
        assert!(output.starts_with("import React, {useState} from 'react';\n"));
        assert!(!output.contains("Component"));
    }

    #[test]
    fn test_other_imports_kept_verbatim() {
        let output = emit(
            r#"import {helper} from './helper';

class MyComponent extends Component {
  render() {
    return (<p>{helper()}</p>);
  }
}"#,
        );
        assert!(output.contains("import {helper} from './helper';"));
    }

    #[test]
    fn test_passthrough_function() {
        let source = r#"function MyComponent(props) {
  const [count, setCount] = useState(props.count || 0);
  return (<p>{count}</p>);
}"#;
        let output = emit(source);
        assert!(output.contains("const [count, setCount] = useState(props.count || 0);"));
        assert!(output.contains("return (<p>{count}</p>);"));
    }

    #[test]
    fn test_balanced_output() {
        let output = emit(
            r#"class MyComponent extends React.Component {
  constructor(props) {
    super(props);
    this.state = { a: 1, b: 2 }
  }
  onClick(e) {
    this.setState({a: this.state.a + 1, b: this.state.b - 1}, () => {
      console.log('both updated');
    });
  }
  render() {
    return (<div onClick={this.onClick}>{this.state.a}</div>);
  }
}"#,
        );
        for (open, close) in [('(', ')'), ('{', '}'), ('[', ']')] {
            let opens = output.matches(open).count();
            let closes = output.matches(close).count();
            assert_eq!(opens, closes, "unbalanced {}{} in:\n{}", open, close, output);
        }
    }
}
