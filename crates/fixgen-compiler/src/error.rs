use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("blueprint {blueprint} has no model type")]
    MissingModel { blueprint: String },
}
