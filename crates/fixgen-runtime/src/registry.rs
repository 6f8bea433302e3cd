use std::fmt;
use std::sync::Arc;

use fixgen_types::Value;
use indexmap::IndexMap;

use crate::error::{FixtureError, RegistryError};
use crate::request::FixtureRequest;

pub type FixtureFn = Arc<
    dyn Fn(&mut dyn FixtureRequest, &IndexMap<String, Value>) -> Result<Value, FixtureError>
        + Send
        + Sync,
>;

/// A callable fixture: the host injects `argnames` and passes the request alongside.
#[derive(Clone)]
pub struct FixtureBinding {
    pub name: String,
    pub argnames: Vec<String>,
    /// Names the host resolves alongside this fixture so deferred work completes.
    pub related: Vec<String>,
    pub func: FixtureFn,
}

impl FixtureBinding {
    pub fn new(
        name: impl Into<String>,
        argnames: Vec<String>,
        func: impl Fn(&mut dyn FixtureRequest, &IndexMap<String, Value>) -> Result<Value, FixtureError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            argnames,
            related: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Fixture returning a fixed value.
    pub fn value(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, Vec::new(), move |_, _| Ok(value.clone()))
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }

    pub fn call(
        &self,
        request: &mut dyn FixtureRequest,
        args: &IndexMap<String, Value>,
    ) -> Result<Value, FixtureError> {
        (self.func)(request, args)
    }
}

impl fmt::Debug for FixtureBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureBinding")
            .field("name", &self.name)
            .field("argnames", &self.argnames)
            .field("related", &self.related)
            .finish()
    }
}

/// Fixtures visible to a test suite, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct FixtureRegistry {
    fixtures: IndexMap<String, FixtureBinding>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FixtureBinding> {
        self.fixtures.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fixtures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Adds a fixture; names are never silently replaced.
    pub fn install(&mut self, binding: FixtureBinding) -> Result<(), RegistryError> {
        if self.fixtures.contains_key(&binding.name) {
            return Err(RegistryError::DuplicateFixture(binding.name));
        }
        self.fixtures.insert(binding.name.clone(), binding);
        Ok(())
    }
}
