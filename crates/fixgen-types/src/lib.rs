//! Core data model for blueprint-driven fixtures: dynamic values, blueprints and their
//! declarations, and the fixture definitions compiled from them.

mod blueprint;
pub mod classify;
mod definition;
mod lazy;
pub mod naming;
pub mod validate;
mod value;

pub use blueprint::{
    AfterPostgenerationFn, Blueprint, BlueprintBuilder, BlueprintRef, BuildStep, Constructor,
    Declaration, HookFn, ModelType, PostGenerationContext, PostHook,
};
pub use classify::{DeclarationClass, classify};
pub use definition::{FixtureDefinition, FixtureKind, FixtureParams};
pub use lazy::{LazyFn, LazyTarget, LazyValue};
pub use naming::{SEPARATOR, fixture_name, underscore};
pub use validate::{ValidationError, validate_definitions};
pub use value::{Object, ObjectRef, Sequence, Value};
