//! Compiles blueprints into ordered fixture definitions.

mod build;
mod deps;
pub mod error;

pub use build::generate_fixture_defs;
pub use deps::blueprint_deps;
pub use error::CompileError;
