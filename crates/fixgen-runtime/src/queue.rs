use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fixgen_types::{Blueprint, Value};
use indexmap::IndexMap;
use log::debug;

use crate::deferred::{DeferredCoordinator, DeferredUnit};
use crate::error::FixtureError;
use crate::request::FixtureRequest;

/// In-memory coordinator for one test.
///
/// Batches drain last-in-first-out, units within a batch in order. A unit is ready
/// once none of its transitive fixture dependencies is still being resolved. Hook
/// results are collected per model and handed to the blueprint's after-postgeneration
/// callback once the queue is empty.
#[derive(Default)]
pub struct DeferredQueue {
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    batches: Vec<Vec<DeferredUnit>>,
    running: usize,
    results: IndexMap<String, ModelResults>,
}

struct ModelResults {
    blueprint: Arc<Blueprint>,
    values: IndexMap<String, Value>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().batches.iter().all(Vec::is_empty)
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes and returns the next ready unit; the lock is released before it runs.
    fn take_ready(&self, request: &dyn FixtureRequest) -> Option<DeferredUnit> {
        let pending: HashSet<String> = request.pending_fixtures().into_iter().collect();
        let mut state = self.lock();
        state.batches.retain(|batch| !batch.is_empty());
        for index in (0..state.batches.len()).rev() {
            let position = state.batches[index]
                .iter()
                .position(|unit| is_ready(unit, &pending, request));
            if let Some(position) = position {
                let unit = state.batches[index].remove(position);
                if state.batches[index].is_empty() {
                    state.batches.remove(index);
                }
                return Some(unit);
            }
        }
        None
    }

    fn after_postgeneration(&self, request: &mut dyn FixtureRequest) -> Result<(), FixtureError> {
        let finished = {
            let mut state = self.lock();
            if state.running > 0 || state.batches.iter().any(|batch| !batch.is_empty()) {
                return Ok(());
            }
            std::mem::take(&mut state.results)
        };
        for (model, results) in finished {
            let Some(callback) = results.blueprint.after_postgeneration().cloned() else {
                continue;
            };
            let instance = request.get_fixture_value(&model)?;
            debug!("after-postgeneration for {model} with {} results", results.values.len());
            callback(&instance, &results.values)
                .map_err(|source| FixtureError::AfterPostgeneration { model, source })?;
        }
        Ok(())
    }
}

impl DeferredCoordinator for DeferredQueue {
    fn defer(&self, units: Vec<DeferredUnit>) {
        if units.is_empty() {
            return;
        }
        debug!(
            "deferring {:?}",
            units.iter().map(DeferredUnit::name).collect::<Vec<_>>()
        );
        self.lock().batches.push(units);
    }

    fn evaluate(&self, request: &mut dyn FixtureRequest) -> Result<(), FixtureError> {
        while let Some(unit) = self.take_ready(&*request) {
            debug!("running deferred {}", unit.name());
            let model = unit.model().to_string();
            let attr = unit.attr().to_string();
            let blueprint = unit.blueprint().clone();
            let is_related = unit.is_related();

            self.lock().running += 1;
            let result = unit.run(request);
            let mut state = self.lock();
            state.running -= 1;
            let value = result?;
            if !is_related {
                state
                    .results
                    .entry(model)
                    .or_insert_with(|| ModelResults { blueprint, values: IndexMap::new() })
                    .values
                    .insert(attr, value);
            }
        }
        self.after_postgeneration(request)
    }

    fn pending(&self) -> Vec<String> {
        self.lock()
            .batches
            .iter()
            .flatten()
            .map(|unit| unit.name().to_string())
            .collect()
    }
}

fn is_ready(unit: &DeferredUnit, pending: &HashSet<String>, request: &dyn FixtureRequest) -> bool {
    if pending.is_empty() {
        return true;
    }
    let mut seen = HashSet::new();
    let mut stack = vec![unit.name().to_string()];
    while let Some(name) = stack.pop() {
        if pending.contains(&name) {
            return false;
        }
        if !seen.insert(name.clone()) {
            continue;
        }
        stack.extend(request.fixture_argnames(&name).unwrap_or_default());
    }
    true
}
