use fixgen_types::{LazyTarget, Value};
use indexmap::IndexMap;

use crate::error::FixtureError;
use crate::request::FixtureRequest;

/// Resolves lazy values against the request; every other value evaluates to itself.
pub fn evaluate(request: &mut dyn FixtureRequest, value: &Value) -> Result<Value, FixtureError> {
    let Value::Lazy(lazy) = value else {
        return Ok(value.clone());
    };
    match lazy.target() {
        LazyTarget::Fixture(name) => request.get_fixture_value(name),
        LazyTarget::Callable(func) => {
            let mut kwargs = IndexMap::with_capacity(lazy.args().len());
            for arg in lazy.args() {
                kwargs.insert(arg.clone(), request.get_fixture_value(arg)?);
            }
            func(&kwargs).map_err(|source| FixtureError::Lazy {
                target: format!("{lazy:?}"),
                source,
            })
        }
    }
}
