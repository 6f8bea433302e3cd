use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use fixgen_runtime::{FixtureBinding, invoke_handler};
use fixgen_types::{FixtureDefinition, FixtureParams, validate_definitions};
use indexmap::IndexMap;
use log::{debug, info};

use crate::artifact::ArtifactDir;
use crate::config::MaterializeConfig;
use crate::error::MaterializeError;
use crate::render::{fingerprint, render_listing};

const LISTING_EXT: &str = "fixtures";

type ParamsBag = Arc<RwLock<FixtureParams>>;

/// Produces fixture bindings from compiled definitions, one module per call.
pub struct Materializer {
    config: MaterializeConfig,
    dir: Option<ArtifactDir>,
    modules: Mutex<HashSet<String>>,
}

impl Materializer {
    pub fn new(config: MaterializeConfig) -> Result<Self, MaterializeError> {
        let dir = if config.write_artifacts {
            Some(ArtifactDir::acquire(&config)?)
        } else {
            None
        };
        Ok(Self {
            config,
            dir,
            modules: Mutex::new(HashSet::new()),
        })
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Directory the listings are written to, if artifacts are enabled.
    pub fn artifact_dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(ArtifactDir::path)
    }

    pub fn materialize(
        &self,
        model_name: &str,
        defs: &[FixtureDefinition],
    ) -> Result<MaterializedModule, MaterializeError> {
        validate_definitions(model_name, defs)?;

        let listing = render_listing(model_name, defs);
        let fingerprint = fingerprint(&listing);
        let module_name = self.claim_module_name(model_name);
        let path = match &self.dir {
            Some(dir) => {
                let path = dir.path().join(format!("{module_name}.{LISTING_EXT}"));
                fs::write(&path, &listing).map_err(|source| MaterializeError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!("wrote fixtures for {model_name} to {}", path.display());
                Some(path)
            }
            None => None,
        };
        debug!("materialized {module_name} (fingerprint {fingerprint})");

        let mut bindings = IndexMap::with_capacity(defs.len());
        let mut bags = IndexMap::with_capacity(defs.len());
        for def in defs {
            let bag: ParamsBag = Arc::new(RwLock::new(FixtureParams::default()));
            let binding = make_binding(def, bag.clone());
            *bag.write().unwrap_or_else(PoisonError::into_inner) = def.params.clone();
            bindings.insert(def.name.clone(), binding);
            bags.insert(def.name.clone(), bag);
        }

        Ok(MaterializedModule {
            module_name,
            path,
            fingerprint,
            bindings,
            bags,
        })
    }

    /// Picks `model_name`, or the first free `model_name_N`, among the modules
    /// produced so far and the files already on disk.
    fn claim_module_name(&self, model_name: &str) -> String {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        let taken = |name: &str| {
            modules.contains(name)
                || self.dir.as_ref().is_some_and(|dir| {
                    dir.path().join(format!("{name}.{LISTING_EXT}")).exists()
                })
        };
        let mut name = model_name.to_string();
        let mut counter = 0;
        while taken(&name) {
            counter += 1;
            name = format!("{model_name}_{counter}");
        }
        modules.insert(name.clone());
        name
    }
}

fn make_binding(def: &FixtureDefinition, bag: ParamsBag) -> FixtureBinding {
    let kind = def.kind;
    FixtureBinding::new(def.name.clone(), def.deps.clone(), move |request, _args| {
        let params = bag.read().unwrap_or_else(PoisonError::into_inner).clone();
        invoke_handler(kind, request, &params)
    })
    .with_related(def.related.clone())
}

/// Bindings for one model plus the parameter bags backing them.
#[derive(Debug)]
pub struct MaterializedModule {
    module_name: String,
    path: Option<PathBuf>,
    fingerprint: String,
    bindings: IndexMap<String, FixtureBinding>,
    bags: IndexMap<String, ParamsBag>,
}

impl MaterializedModule {
    /// Module (file stem) name; may carry a numeric suffix.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn bindings(&self) -> &IndexMap<String, FixtureBinding> {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&FixtureBinding> {
        self.bindings.get(name)
    }

    pub fn into_bindings(self) -> impl Iterator<Item = FixtureBinding> {
        self.bindings.into_values()
    }

    pub fn params(&self, name: &str) -> Result<FixtureParams, MaterializeError> {
        let bag = self.bag(name)?;
        Ok(bag.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Replaces a fixture's parameters; later resolutions see the new values.
    pub fn patch_params(&self, name: &str, params: FixtureParams) -> Result<(), MaterializeError> {
        let bag = self.bag(name)?;
        *bag.write().unwrap_or_else(PoisonError::into_inner) = params;
        Ok(())
    }

    fn bag(&self, name: &str) -> Result<&ParamsBag, MaterializeError> {
        self.bags
            .get(name)
            .ok_or_else(|| MaterializeError::UnknownFixture(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgen_runtime::{FixtureRegistry, FixtureSession};
    use fixgen_types::{FixtureKind, Value};
    use tempfile::TempDir;

    fn attr(name: &str, value: &str) -> FixtureDefinition {
        FixtureDefinition::new(
            name,
            FixtureKind::Attribute,
            FixtureParams::Attribute { value: Value::from(value) },
        )
    }

    fn persistent(tmp: &TempDir) -> Materializer {
        Materializer::new(MaterializeConfig {
            cache_dir: Some(tmp.path().to_path_buf()),
            ..MaterializeConfig::default()
        })
        .expect("materializer")
    }

    #[test]
    fn repeated_model_names_get_suffixed_files() {
        let tmp = TempDir::new().expect("tempdir");
        let materializer = persistent(&tmp);
        let defs = [attr("book__title", "Alice in Wonderland")];

        let first = materializer.materialize("book", &defs).expect("first");
        let second = materializer.materialize("book", &defs).expect("second");
        let third = materializer.materialize("book", &defs).expect("third");

        assert_eq!(first.module_name(), "book");
        assert_eq!(second.module_name(), "book_1");
        assert_eq!(third.module_name(), "book_2");
        let path = third.path().expect("listing path");
        assert!(path.ends_with("_fixgen_generated_fixtures/book_2.fixtures"));
        assert!(path.exists());
        assert!(third.binding("book__title").is_some());
        assert_eq!(first.fingerprint(), third.fingerprint());
    }

    #[test]
    fn patched_params_change_the_fixture_value() {
        let materializer = Materializer::new(MaterializeConfig::in_memory()).expect("materializer");
        let module = materializer
            .materialize("book", &[attr("book__title", "Alice in Wonderland")])
            .expect("materialize");
        module
            .patch_params(
                "book__title",
                FixtureParams::Attribute { value: Value::from("Through the Looking-Glass") },
            )
            .expect("patch");
        assert!(matches!(
            module.params("book__title").expect("params"),
            FixtureParams::Attribute { value } if value == Value::from("Through the Looking-Glass")
        ));

        let mut registry = FixtureRegistry::new();
        for binding in module.into_bindings() {
            registry.install(binding).expect("install");
        }
        let mut session = FixtureSession::new(Arc::new(registry));
        assert_eq!(
            session.get_fixture_value("book__title").expect("title"),
            Value::from("Through the Looking-Glass")
        );
    }

    #[test]
    fn unknown_params_are_rejected() {
        let materializer = Materializer::new(MaterializeConfig::in_memory()).expect("materializer");
        let module = materializer.materialize("book", &[]).expect("materialize");
        let err = module.params("book__title").unwrap_err();
        assert!(matches!(err, MaterializeError::UnknownFixture(name) if name == "book__title"));
    }

    #[test]
    fn disabled_artifacts_write_nothing() {
        let materializer = Materializer::new(MaterializeConfig::in_memory()).expect("materializer");
        assert!(materializer.artifact_dir().is_none());
        let module = materializer
            .materialize("book", &[attr("book__title", "x")])
            .expect("materialize");
        assert!(module.path().is_none());
        assert_eq!(
            materializer.materialize("book", &[]).expect("again").module_name(),
            "book_1"
        );
    }

    #[test]
    fn invalid_batch_is_rejected() {
        let materializer = Materializer::new(MaterializeConfig::in_memory()).expect("materializer");
        let err = materializer
            .materialize("book", &[attr("book__title", "a"), attr("book__title", "b")])
            .unwrap_err();
        assert!(matches!(err, MaterializeError::Invalid(_)));
    }
}
