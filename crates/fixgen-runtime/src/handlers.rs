//! Kind handlers backing materialized fixtures.

use std::sync::Arc;

use fixgen_types::{Blueprint, FixtureKind, FixtureParams, Value};

use crate::error::FixtureError;
use crate::model::model_fixture;
use crate::request::FixtureRequest;

pub fn attr_fixture(value: &Value) -> Value {
    value.clone()
}

pub fn factory_fixture(blueprint: &Arc<Blueprint>) -> Value {
    Value::Blueprint(blueprint.clone())
}

/// Nested objects and reverse associations resolve the child's model fixture.
pub fn subfactory_fixture(
    request: &mut dyn FixtureRequest,
    blueprint: &Blueprint,
) -> Result<Value, FixtureError> {
    let model = blueprint
        .model_name()
        .ok_or_else(|| FixtureError::MissingModel(blueprint.name().to_string()))?;
    request.get_fixture_value(&model)
}

/// Applies the handler for `kind` to the fixture's static parameters.
pub fn invoke_handler(
    kind: FixtureKind,
    request: &mut dyn FixtureRequest,
    params: &FixtureParams,
) -> Result<Value, FixtureError> {
    match (kind, params) {
        (FixtureKind::Attribute, FixtureParams::Attribute { value }) => Ok(attr_fixture(value)),
        (FixtureKind::Blueprint, FixtureParams::Blueprint { blueprint }) => {
            Ok(factory_fixture(blueprint))
        }
        (FixtureKind::Nested, FixtureParams::Nested { blueprint }) => {
            subfactory_fixture(request, blueprint)
        }
        (FixtureKind::Model, FixtureParams::Model { factory_name }) => {
            model_fixture(request, factory_name)
        }
        _ => Err(FixtureError::ParamsUnset(
            request.fixture_name().unwrap_or(kind.handler_name()).to_string(),
        )),
    }
}
