use thiserror::Error;

use crate::emitter::EmitError;
use crate::parser::ParseError;
use crate::rules::ConvertError;
use crate::tokenizer::TokenizeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),
    // model builder
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    // rewrite rules
    #[error("Convert error: {0}")]
    Convert(#[from] ConvertError),
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
}

pub type Result<T> = std::result::Result<T, Error>;
