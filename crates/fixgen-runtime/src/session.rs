//! In-memory host: resolves fixtures from a registry for a single test invocation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fixgen_types::Value;
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::deferred::SharedCoordinator;
use crate::error::FixtureError;
use crate::queue::DeferredQueue;
use crate::registry::{FixtureBinding, FixtureRegistry};
use crate::request::FixtureRequest;

/// Per-test fixture cache and resolution stack.
pub struct FixtureSession {
    registry: Arc<FixtureRegistry>,
    coordinator: SharedCoordinator,
    cache: HashMap<String, Value>,
    stack: Vec<String>,
}

impl FixtureSession {
    pub fn new(registry: Arc<FixtureRegistry>) -> Self {
        Self::with_coordinator(registry, Arc::new(DeferredQueue::new()))
    }

    pub fn with_coordinator(registry: Arc<FixtureRegistry>, coordinator: SharedCoordinator) -> Self {
        Self {
            registry,
            coordinator,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn registry(&self) -> &FixtureRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> SharedCoordinator {
        self.coordinator.clone()
    }

    pub fn cached(&self, name: &str) -> Option<&Value> {
        self.cache.get(name)
    }

    /// Resolves a fixture and its dependencies, reusing cached values.
    pub fn get_fixture_value(&mut self, name: &str) -> Result<Value, FixtureError> {
        self.resolve(name)
    }

    /// Resolves the fixtures a test asks for, plus the related fixtures of everything in
    /// their dependency closure, then finishes the test.
    pub fn run_test(&mut self, fixturenames: &[&str]) -> Result<IndexMap<String, Value>, FixtureError> {
        let names = self.with_related(fixturenames);
        debug!("test fixtures: {names:?}");
        for name in &names {
            self.resolve(name)?;
        }
        self.finish()?;
        fixturenames
            .iter()
            .map(|name| Ok((name.to_string(), self.resolve(name)?)))
            .collect()
    }

    /// Final evaluation of deferred units; anything still queued is an error.
    pub fn finish(&mut self) -> Result<(), FixtureError> {
        let coordinator = self.coordinator.clone();
        coordinator.evaluate(&mut Frame::test(self))?;
        let pending = coordinator.pending();
        if !pending.is_empty() {
            return Err(FixtureError::UnevaluatedDeferred(pending));
        }
        Ok(())
    }

    fn with_related(&self, fixturenames: &[&str]) -> IndexSet<String> {
        let mut names: IndexSet<String> = fixturenames.iter().map(|name| name.to_string()).collect();
        let mut seen = HashSet::new();
        let mut todo: Vec<String> = names.iter().cloned().collect();
        while let Some(name) = todo.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(binding) = self.registry.get(&name) else {
                continue;
            };
            todo.extend(binding.argnames.iter().cloned());
            for related in &binding.related {
                if names.insert(related.clone()) {
                    todo.push(related.clone());
                }
            }
        }
        names
    }

    fn resolve(&mut self, name: &str) -> Result<Value, FixtureError> {
        if let Some(value) = self.cache.get(name) {
            return Ok(value.clone());
        }
        let binding = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| FixtureError::Lookup(name.to_string()))?;
        if self.stack.iter().any(|active| active == name) {
            return Err(FixtureError::RecursiveDependency {
                name: name.to_string(),
                chain: self.stack.join(" -> "),
            });
        }

        self.stack.push(name.to_string());
        let result = self.invoke(&binding);
        self.stack.pop();
        let value = result?;

        // A model fixture may already have published its instance.
        Ok(self.cache.entry(name.to_string()).or_insert(value).clone())
    }

    fn invoke(&mut self, binding: &FixtureBinding) -> Result<Value, FixtureError> {
        let mut args = IndexMap::with_capacity(binding.argnames.len());
        for dep in &binding.argnames {
            let value = self.resolve(dep)?;
            args.insert(dep.clone(), value);
        }
        let mut frame = Frame {
            session: self,
            fixture: Some(binding.name.clone()),
            argnames: binding.argnames.clone(),
        };
        binding.call(&mut frame, &args)
    }
}

/// Request handed to a fixture while it is being resolved.
struct Frame<'a> {
    session: &'a mut FixtureSession,
    fixture: Option<String>,
    argnames: Vec<String>,
}

impl<'a> Frame<'a> {
    fn test(session: &'a mut FixtureSession) -> Self {
        Self {
            session,
            fixture: None,
            argnames: Vec::new(),
        }
    }
}

impl FixtureRequest for Frame<'_> {
    fn fixture_name(&self) -> Option<&str> {
        self.fixture.as_deref()
    }

    fn argnames(&self) -> &[String] {
        &self.argnames
    }

    fn get_fixture_value(&mut self, name: &str) -> Result<Value, FixtureError> {
        self.session.resolve(name)
    }

    fn cache_early(&mut self, value: Value) -> Result<(), FixtureError> {
        let fixture = self
            .fixture
            .clone()
            .ok_or(FixtureError::NoFixtureContext("cache_early"))?;
        self.session.cache.insert(fixture, value);
        Ok(())
    }

    fn fixture_argnames(&self, name: &str) -> Option<Vec<String>> {
        self.session
            .registry
            .get(name)
            .map(|binding| binding.argnames.clone())
    }

    fn pending_fixtures(&self) -> Vec<String> {
        self.session
            .stack
            .iter()
            .filter(|name| !self.session.cache.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    fn coordinator(&self) -> SharedCoordinator {
        self.session.coordinator.clone()
    }
}
