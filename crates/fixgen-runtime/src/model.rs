//! Model construction protocol.
//!
//! A model fixture builds its instance from the pre-construction declarations only,
//! publishes it in the fixture cache, and queues everything else (hooks, reverse
//! associations) as deferred units. Publishing before deferring lets a unit that comes
//! back to this fixture, directly or through a child, see the same instance instead of
//! constructing a second one.

use std::collections::HashSet;

use fixgen_types::{BuildStep, Declaration, PostGenerationContext, Value, fixture_name};
use indexmap::IndexMap;
use log::debug;

use crate::deferred::{make_deferred_postgen, make_deferred_related};
use crate::error::FixtureError;
use crate::lazy::evaluate;
use crate::request::FixtureRequest;

pub fn model_fixture(
    request: &mut dyn FixtureRequest,
    factory_name: &str,
) -> Result<Value, FixtureError> {
    let coordinator = request.coordinator();
    coordinator.evaluate(request)?;

    let fixture = request
        .fixture_name()
        .ok_or(FixtureError::NoFixtureContext("model_fixture"))?
        .to_string();
    let blueprint = match request.get_fixture_value(factory_name)? {
        Value::Blueprint(blueprint) => blueprint,
        other => {
            return Err(FixtureError::UnexpectedValue {
                fixture: factory_name.to_string(),
                expected: "blueprint",
                found: other.type_name(),
            });
        }
    };
    let argnames: HashSet<String> = request.argnames().iter().cloned().collect();

    let mut kwargs = IndexMap::new();
    for key in blueprint.pre_declarations() {
        let argname = fixture_name(&fixture, key);
        if argnames.contains(&argname) {
            let value = request.get_fixture_value(&argname)?;
            kwargs.insert(key.clone(), evaluate(request, &value)?);
        }
    }

    let step = BuildStep {
        fixture: fixture.clone(),
        sequence: blueprint.next_sequence(),
    };
    let instance = blueprint
        .create(&step, kwargs)
        .map_err(|source| FixtureError::Construction {
            fixture: fixture.clone(),
            source,
        })?;
    request.cache_early(instance.clone())?;
    debug!("created {fixture} as {instance:?}");

    let mut deferred = Vec::new();
    for attr in blueprint.post_declarations() {
        match blueprint.declaration(attr) {
            Some(Declaration::Reverse(_)) => {
                deferred.push(make_deferred_related(&blueprint, &fixture, attr));
            }
            Some(Declaration::PostHook(hook)) => {
                let argname = fixture_name(&fixture, attr);
                let mut extra = IndexMap::new();
                for (key, default) in blueprint.hook_context(attr).into_iter().flatten() {
                    if key.is_empty() {
                        continue;
                    }
                    let post_attr = fixture_name(&argname, key);
                    let value = if argnames.contains(&post_attr) {
                        let value = request.get_fixture_value(&post_attr)?;
                        evaluate(request, &value)?
                    } else {
                        default.clone()
                    };
                    extra.insert(key.clone(), value);
                }
                let value = request.get_fixture_value(&argname)?;
                let value = evaluate(request, &value)?;
                let context = PostGenerationContext {
                    value_provided: value.is_provided(),
                    value,
                    extra,
                };
                deferred.push(make_deferred_postgen(
                    step.clone(),
                    &blueprint,
                    &fixture,
                    instance.clone(),
                    attr,
                    hook.clone(),
                    context,
                ));
            }
            _ => {}
        }
    }
    coordinator.defer(deferred);

    coordinator.evaluate(request)?;
    Ok(instance)
}
