use std::sync::Arc;

use fixgen_types::{
    Blueprint, Declaration, FixtureDefinition, FixtureKind, FixtureParams, Value, fixture_name,
};
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::deps::{blueprint_deps, require_model_name};
use crate::error::CompileError;

/// Compiles a blueprint into its fixture definitions.
///
/// Emits one attribute or nested definition per declaration (in declaration order,
/// `overrides` replacing declarations by attribute name), then the blueprint-reference
/// definition unless `existing` already binds its name, then the model definition.
pub fn generate_fixture_defs(
    blueprint: &Arc<Blueprint>,
    model_name: &str,
    overrides: &IndexMap<String, Declaration>,
    existing: &dyn Fn(&str) -> bool,
) -> Result<Vec<FixtureDefinition>, CompileError> {
    let factory_name = blueprint.factory_name();

    let mut related = Vec::new();
    let mut defs = Vec::with_capacity(blueprint.declarations().len() + 2);
    for (attr, declaration) in blueprint.declarations() {
        let declaration = overrides.get(attr).unwrap_or(declaration);
        let attr_name = fixture_name(model_name, attr);
        defs.push(declaration_fixture_def(attr_name, declaration, blueprint, &mut related)?);
    }

    if !existing(&factory_name) {
        defs.push(FixtureDefinition::new(
            factory_name.clone(),
            FixtureKind::Blueprint,
            FixtureParams::Blueprint { blueprint: blueprint.clone() },
        ));
    }

    let deps = blueprint_deps(blueprint, None, Some(model_name))?;
    defs.push(
        FixtureDefinition::new(model_name, FixtureKind::Model, FixtureParams::Model { factory_name })
            .with_deps(dedup(deps))
            .with_related(related),
    );

    debug!(
        "compiled {} fixtures for {model_name}: {:?}",
        defs.len(),
        defs.iter().map(|def| def.name.as_str()).collect::<Vec<_>>()
    );
    Ok(defs)
}

fn declaration_fixture_def(
    attr_name: String,
    declaration: &Declaration,
    blueprint: &Blueprint,
    related: &mut Vec<String>,
) -> Result<FixtureDefinition, CompileError> {
    let (value, deps) = match declaration {
        Declaration::Nested(child) | Declaration::Reverse(child) => {
            let child = child.get();
            let child_deps = blueprint_deps(&child, Some(blueprint), None)?;
            let child_model = require_model_name(&child)?;

            let mut deps = child_deps.clone();
            if matches!(declaration, Declaration::Reverse(_)) {
                related.push(child_model.clone());
                related.push(attr_name.clone());
                related.extend(child_deps);
            }
            deps.push(child_model);

            return Ok(FixtureDefinition::new(
                attr_name,
                FixtureKind::Nested,
                FixtureParams::Nested { blueprint: child },
            )
            .with_deps(dedup(deps)));
        }
        Declaration::PostHook(hook) => (hook.extract().clone(), Vec::new()),
        Declaration::Plain(Value::Lazy(lazy)) => (Value::Lazy(lazy.clone()), lazy.args().to_vec()),
        Declaration::Plain(value) => (value.clone(), Vec::new()),
    };

    Ok(
        FixtureDefinition::new(attr_name, FixtureKind::Attribute, FixtureParams::Attribute { value })
            .with_deps(dedup(deps)),
    )
}

fn dedup(names: Vec<String>) -> Vec<String> {
    names.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
