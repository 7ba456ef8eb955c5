use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Reserved words of the host language that the converter needs to see as
/// distinct tokens.
///
/// Contextual names (`constructor`, `render`, `state`, `setState`, the
/// lifecycle method names) are deliberately not listed here. The host
/// language does not reserve them, so they tokenize as plain identifiers and
/// the parser gives them meaning by position.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Display, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Class,
    Extends,
    Function,
    Return,
    Const,
    Let,
    Var,
    This,
    Super,
    New,
    If,
    Else,
    For,
    While,
    Switch,
    Case,
    Try,
    Catch,
    Finally,
    Throw,
    Async,
    Await,
    Typeof,
    Import,
    From,
    Export,
    Default,
    Static,
}
