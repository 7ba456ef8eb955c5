use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("Emitting error: {0}")]
    Format(String),
    #[error("Unexpected statement in function form: {0}")]
    Statement(String),
}
