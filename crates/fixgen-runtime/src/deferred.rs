//! Deferred post-generation units and the coordinator contract that runs them.

use std::fmt;
use std::sync::Arc;

use fixgen_types::{Blueprint, BuildStep, PostGenerationContext, PostHook, Value, fixture_name};

use crate::error::FixtureError;
use crate::request::FixtureRequest;

pub type DeferredAction =
    Box<dyn FnOnce(&mut dyn FixtureRequest) -> Result<Value, FixtureError> + Send>;

/// Post-construction work queued by a model fixture.
///
/// The action closes over everything it needs (instance, build step, context); the
/// request is only handed over so reverse associations can resolve their fixture.
pub struct DeferredUnit {
    name: String,
    model: String,
    attr: String,
    blueprint: Arc<Blueprint>,
    is_related: bool,
    action: DeferredAction,
}

impl DeferredUnit {
    /// `model__attr`, which is also the name of the fixture the unit belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model fixture that queued the unit.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.blueprint
    }

    pub fn is_related(&self) -> bool {
        self.is_related
    }

    pub fn run(self, request: &mut dyn FixtureRequest) -> Result<Value, FixtureError> {
        (self.action)(request)
    }
}

impl fmt::Debug for DeferredUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredUnit")
            .field("name", &self.name)
            .field("blueprint", &self.blueprint.name())
            .field("is_related", &self.is_related)
            .finish()
    }
}

/// Unit for a reverse association: resolves `fixture__attr`, which builds the child
/// through its own model fixture.
pub fn make_deferred_related(blueprint: &Arc<Blueprint>, fixture: &str, attr: &str) -> DeferredUnit {
    let name = fixture_name(fixture, attr);
    let target = name.clone();
    DeferredUnit {
        name,
        model: fixture.to_string(),
        attr: attr.to_string(),
        blueprint: blueprint.clone(),
        is_related: true,
        action: Box::new(move |request| request.get_fixture_value(&target)),
    }
}

/// Unit for a post-generation hook called against the already-built instance.
pub fn make_deferred_postgen(
    step: BuildStep,
    blueprint: &Arc<Blueprint>,
    fixture: &str,
    instance: Value,
    attr: &str,
    hook: PostHook,
    context: PostGenerationContext,
) -> DeferredUnit {
    let name = fixture_name(fixture, attr);
    let unit = name.clone();
    DeferredUnit {
        name,
        model: fixture.to_string(),
        attr: attr.to_string(),
        blueprint: blueprint.clone(),
        is_related: false,
        action: Box::new(move |_request| {
            hook.call(&instance, &step, &context)
                .map_err(|source| FixtureError::Hook { unit, source })
        }),
    }
}

/// Request-scoped store of deferred units.
///
/// `evaluate` is best-effort: it runs what is ready, leaves the rest queued, and
/// must tolerate being called when nothing is ready. Each unit runs at most once.
pub trait DeferredCoordinator: Send + Sync {
    fn defer(&self, units: Vec<DeferredUnit>);
    fn evaluate(&self, request: &mut dyn FixtureRequest) -> Result<(), FixtureError>;
    /// Names of queued units that have not run.
    fn pending(&self) -> Vec<String>;
}

pub type SharedCoordinator = Arc<dyn DeferredCoordinator>;
