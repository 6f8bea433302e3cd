use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::blueprint::Blueprint;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    /// Ties the attribute fixtures together and builds the instance.
    Model,
    /// One declared attribute value.
    Attribute,
    /// The blueprint itself.
    Blueprint,
    /// Nested object or reverse association: resolves the child's model fixture.
    Nested,
}

impl FixtureKind {
    /// Name of the handler implementing this kind, as shown in generated listings.
    pub fn handler_name(self) -> &'static str {
        match self {
            FixtureKind::Model => "model_fixture",
            FixtureKind::Attribute => "attr_fixture",
            FixtureKind::Blueprint => "factory_fixture",
            FixtureKind::Nested => "subfactory_fixture",
        }
    }
}

/// Static parameters of a fixture, passed to its kind handler.
#[derive(Clone, Default)]
pub enum FixtureParams {
    #[default]
    Unset,
    Attribute { value: Value },
    Blueprint { blueprint: Arc<Blueprint> },
    Nested { blueprint: Arc<Blueprint> },
    Model { factory_name: String },
}

impl fmt::Debug for FixtureParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureParams::Unset => f.write_str("{}"),
            FixtureParams::Attribute { value } => write!(f, "{{value: {value:?}}}"),
            FixtureParams::Blueprint { blueprint } => {
                write!(f, "{{factory_class: {}}}", blueprint.name())
            }
            FixtureParams::Nested { blueprint } => {
                write!(f, "{{factory_class: {}}}", blueprint.name())
            }
            FixtureParams::Model { factory_name } => write!(f, "{{factory_name: {factory_name}}}"),
        }
    }
}

/// A named fixture produced by compiling a blueprint.
#[derive(Clone, Debug, Serialize)]
pub struct FixtureDefinition {
    pub name: String,
    pub kind: FixtureKind,
    #[serde(skip)]
    pub params: FixtureParams,
    pub deps: Vec<String>,
    pub related: Vec<String>,
}

impl FixtureDefinition {
    pub fn new(name: impl Into<String>, kind: FixtureKind, params: FixtureParams) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
            deps: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_deps(mut self, deps: Vec<String>) -> Self {
        self.deps = deps;
        self
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }

    /// Key of the fixture's parameter bag in a materialized module.
    pub fn params_key(&self) -> String {
        format!("_{}__params", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_without_params() {
        let def = FixtureDefinition::new(
            "book",
            FixtureKind::Model,
            FixtureParams::Model { factory_name: "book_factory".into() },
        )
        .with_deps(vec!["book__title".into()])
        .with_related(vec!["book__reviews".into()]);
        assert_eq!(
            serde_json::to_value(&def).expect("serialize definition"),
            json!({
                "name": "book",
                "kind": "model",
                "deps": ["book__title"],
                "related": ["book__reviews"]
            })
        );
        assert_eq!(def.params_key(), "_book__params");
        assert_eq!(def.kind.handler_name(), "model_fixture");
    }
}
