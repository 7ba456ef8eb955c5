pub mod config;
pub mod error;
pub mod visitor;

pub use config::EmitterConfig;
pub use error::EmitError;
pub use visitor::EmitterVisitor;
