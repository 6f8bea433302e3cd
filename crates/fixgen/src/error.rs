use fixgen_codegen::MaterializeError;
use fixgen_compiler::CompileError;
use fixgen_runtime::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("blueprint {0} is abstract and cannot be registered")]
    AbstractBlueprint(String),
    #[error("blueprint {0} has no model type")]
    MissingModel(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
