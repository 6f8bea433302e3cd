use std::sync::Arc;

use fixgen_codegen::{MaterializedModule, Materializer};
use fixgen_compiler::generate_fixture_defs;
use fixgen_runtime::{FixtureRegistry, RegistryError};
use fixgen_types::{Blueprint, Declaration, FixtureDefinition};
use indexmap::IndexMap;
use log::debug;

use crate::error::RegisterError;

/// Registration of one blueprint under a model fixture name.
///
/// ```ignore
/// Register::new(&BOOK).name("second_book").set("title", "Dombey and Son")
///     .install(&mut registry, &materializer)?;
/// ```
#[derive(Clone, Debug)]
pub struct Register {
    blueprint: Arc<Blueprint>,
    name: Option<String>,
    overrides: IndexMap<String, Declaration>,
}

impl Register {
    pub fn new(blueprint: &Arc<Blueprint>) -> Self {
        Self {
            blueprint: blueprint.clone(),
            name: None,
            overrides: IndexMap::new(),
        }
    }

    /// Model fixture name; defaults to the underscored model type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the declaration of `attr` for this registration only.
    pub fn set(mut self, attr: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.overrides.insert(attr.into(), declaration.into());
        self
    }

    /// Compiles and materializes the fixtures without installing them.
    pub fn bindings(
        &self,
        registry: &FixtureRegistry,
        materializer: &Materializer,
    ) -> Result<Registration, RegisterError> {
        if self.blueprint.is_abstract() {
            return Err(RegisterError::AbstractBlueprint(self.blueprint.name().to_string()));
        }
        let Some(default_name) = self.blueprint.model_name() else {
            return Err(RegisterError::MissingModel(self.blueprint.name().to_string()));
        };
        let model_name = self.name.clone().unwrap_or(default_name);

        let definitions = generate_fixture_defs(
            &self.blueprint,
            &model_name,
            &self.overrides,
            &|name: &str| registry.contains(name),
        )?;
        let module = materializer.materialize(&model_name, &definitions)?;
        Ok(Registration {
            blueprint: self.blueprint.clone(),
            model_name,
            definitions,
            module,
        })
    }

    pub fn install(
        &self,
        registry: &mut FixtureRegistry,
        materializer: &Materializer,
    ) -> Result<Arc<Blueprint>, RegisterError> {
        self.bindings(registry, materializer)?.install(registry)
    }
}

/// Materialized fixtures of one registration, not yet visible to any session.
#[derive(Debug)]
pub struct Registration {
    blueprint: Arc<Blueprint>,
    model_name: String,
    definitions: Vec<FixtureDefinition>,
    module: MaterializedModule,
}

impl Registration {
    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.blueprint
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn definitions(&self) -> &[FixtureDefinition] {
        &self.definitions
    }

    pub fn module(&self) -> &MaterializedModule {
        &self.module
    }

    /// Installs every binding, or none of them if any name is already taken.
    pub fn install(self, registry: &mut FixtureRegistry) -> Result<Arc<Blueprint>, RegisterError> {
        if let Some(name) = self.module.bindings().keys().find(|name| registry.contains(name)) {
            return Err(RegistryError::DuplicateFixture(name.clone()).into());
        }
        debug!(
            "installing {} fixtures for {}",
            self.module.bindings().len(),
            self.model_name
        );
        for binding in self.module.into_bindings() {
            registry.install(binding)?;
        }
        Ok(self.blueprint)
    }
}
