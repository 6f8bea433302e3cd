use std::collections::HashSet;

use petgraph::{algo::toposort, graphmap::DiGraphMap};
use thiserror::Error;

use crate::definition::FixtureDefinition;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("fixtures for {model} define {name} more than once")]
    DuplicateFixture { model: String, name: String },
    #[error("fixtures for {model} form a dependency cycle through {name}")]
    CyclicDefinitions { model: String, name: String },
}

/// Checks one batch of definitions: unique names and no dependency cycle among them.
/// Dependencies outside the batch are left to the host's resolution.
pub fn validate_definitions(model: &str, defs: &[FixtureDefinition]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for def in defs {
        if !names.insert(def.name.as_str()) {
            return Err(ValidationError::DuplicateFixture {
                model: model.to_string(),
                name: def.name.clone(),
            });
        }
    }

    let mut graph = DiGraphMap::<&str, ()>::new();
    for def in defs {
        graph.add_node(def.name.as_str());
    }
    for def in defs {
        for dep in &def.deps {
            if names.contains(dep.as_str()) {
                graph.add_edge(def.name.as_str(), dep.as_str(), ());
            }
        }
    }
    toposort(&graph, None).map_err(|cycle| ValidationError::CyclicDefinitions {
        model: model.to_string(),
        name: cycle.node_id().to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixtureKind, FixtureParams, Value};

    fn attr(name: &str, deps: &[&str]) -> FixtureDefinition {
        FixtureDefinition::new(
            name,
            FixtureKind::Attribute,
            FixtureParams::Attribute { value: Value::Null },
        )
        .with_deps(deps.iter().map(|dep| dep.to_string()).collect())
    }

    #[test]
    fn valid_batch_passes() {
        let defs = vec![
            attr("book__title", &[]),
            attr("book__author", &["author__name", "author"]),
            attr("book", &["book__title", "book__author"]),
        ];
        assert!(validate_definitions("book", &defs).is_ok());
    }

    #[test]
    fn duplicate_name_fails() {
        let defs = vec![attr("book__title", &[]), attr("book__title", &[])];
        let err = validate_definitions("book", &defs).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateFixture { name, .. } if name == "book__title"));
    }

    #[test]
    fn cycle_inside_batch_fails() {
        let defs = vec![attr("book__summary", &["book"]), attr("book", &["book__summary"])];
        let err = validate_definitions("book", &defs).unwrap_err();
        assert!(matches!(err, ValidationError::CyclicDefinitions { .. }));
    }
}
