use std::time::{Duration, Instant};

use crate::emitter::{EmitterConfig, EmitterVisitor};
use crate::error::Error;
use crate::parser::parse_source_unit;
use crate::rules::{RuleContext, RuleEngine};
use crate::tokenizer::Tokenizer;
use crate::warning::Warning;

/// Options that affect conversion behavior.
///
/// This is intentionally minimal today; emitter knobs live in
/// [`EmitterConfig`] and new options grow here.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub emitter: EmitterConfig,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The function-based source text.
    pub output: String,
    /// Non-fatal notes about approximated rewrites.
    pub warnings: Vec<Warning>,
    /// Total elapsed time spent tokenizing, rewriting, and emitting.
    pub elapsed: Duration,
}

/// Converts one source unit containing a single component definition.
///
/// Class-based input comes back function-based; function-based input passes
/// through. Each run is pure and stateless, so converting the same input
/// twice gives the same output, and independent inputs may be converted
/// concurrently with no coordination.
pub fn convert(input: &str) -> Result<Conversion, Error> {
    convert_with(input, &ConvertOptions::default())
}

#[tracing::instrument(level = "debug", skip(input, options))]
pub fn convert_with(input: &str, options: &ConvertOptions) -> Result<Conversion, Error> {
    let started = Instant::now();

    let tokens = Tokenizer::new().tokenize(input)?;
    let mut unit = parse_source_unit(&tokens)?;

    let mut ctx = RuleContext::new(&unit.component);
    RuleEngine::new().run(&mut unit.component, &mut ctx)?;

    let output = EmitterVisitor::new(input, options.emitter.clone()).emit(&unit)?;

    Ok(Conversion {
        output,
        warnings: ctx.into_warnings(),
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_is_deterministic() {
        let input = r#"class MyComponent extends React.Component {
  render() {
    return (<p>Hello, World</p>);
  }
}"#;
        let first = convert(input).unwrap();
        let second = convert(input).unwrap();
        assert_eq!(first.output, second.output);
        assert!(first.warnings.is_empty());
    }

    #[test]
    fn test_convert_reports_errors() {
        assert!(convert("const x = 1;").is_err());
    }
}
