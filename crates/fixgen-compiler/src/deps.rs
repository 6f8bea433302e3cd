use fixgen_types::{Blueprint, Declaration, fixture_name};

use crate::error::CompileError;

/// Fixture names a blueprint's model fixture injects, one per declaration.
///
/// Reverse associations are never dependencies. When `parent` is given, nested
/// declarations pointing back at the parent's model are dropped as well, so a child
/// resolved on behalf of its parent does not resolve the parent again.
/// Post-generation hooks stay in: their fixture carries the extracted value.
pub fn blueprint_deps(
    blueprint: &Blueprint,
    parent: Option<&Blueprint>,
    model_name: Option<&str>,
) -> Result<Vec<String>, CompileError> {
    let model_name = match model_name {
        Some(name) => name.to_string(),
        None => require_model_name(blueprint)?,
    };
    let parent_model = parent.and_then(Blueprint::model_name);

    let mut deps = Vec::new();
    for (attr, declaration) in blueprint.declarations() {
        let is_dep = match declaration {
            Declaration::Reverse(_) => false,
            Declaration::Nested(child) => {
                let child_model = require_model_name(&child.get())?;
                parent_model.as_deref() != Some(child_model.as_str())
            }
            Declaration::PostHook(_) | Declaration::Plain(_) => true,
        };
        if is_dep {
            deps.push(fixture_name(&model_name, attr));
        }
    }
    Ok(deps)
}

pub(crate) fn require_model_name(blueprint: &Blueprint) -> Result<String, CompileError> {
    blueprint.model_name().ok_or_else(|| CompileError::MissingModel {
        blueprint: blueprint.name().to_string(),
    })
}
