//! Blueprint-driven fixtures.
//!
//! A [`Blueprint`] registered through [`Register`] becomes a set of fixtures: one per
//! declared attribute, one for the blueprint itself and one for the model instance.
//! Tests (or other fixtures) ask a [`FixtureSession`] for any of them by name.

pub mod error;
mod register;

pub use error::RegisterError;
pub use register::{Register, Registration};

pub use fixgen_codegen::{MaterializeConfig, MaterializeError, MaterializedModule, Materializer};
pub use fixgen_compiler::{CompileError, blueprint_deps, generate_fixture_defs};
pub use fixgen_runtime::{
    DeferredCoordinator, DeferredQueue, DeferredUnit, FixtureBinding, FixtureError,
    FixtureRegistry, FixtureRequest, FixtureSession, RegistryError, SharedCoordinator,
};
pub use fixgen_types::{
    Blueprint, BlueprintRef, BuildStep, Declaration, FixtureDefinition, FixtureKind,
    FixtureParams, LazyValue, ModelType, ObjectRef, PostGenerationContext, PostHook, Sequence,
    Value, fixture_name, underscore,
};
