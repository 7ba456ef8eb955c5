use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::tokenizer::Span;

/// Codes follow a `W{rule}{number}` convention so host tooling can filter on
/// the rewrite rule that produced the warning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum WarningCode {
    /// A compound state update with a completion callback became one updater
    /// call per field plus an effect block. The effect re-runs on any future
    /// change to those fields, not only the change made at the call site.
    #[strum(serialize = "W0601")]
    EffectApproximation,
}

/// A non-fatal note attached to otherwise-successful output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    pub span: Span,
}

impl Warning {
    pub fn effect_approximation(fields: &[String], span: Span) -> Self {
        Self {
            code: WarningCode::EffectApproximation,
            message: format!(
                "state update callback became an effect depending on [{}]; it re-runs on any future change to those fields, not only this update",
                fields.join(", ")
            ),
            span,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.code, self.message, self.span)
    }
}
