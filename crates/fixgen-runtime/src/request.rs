use fixgen_types::Value;

use crate::deferred::SharedCoordinator;
use crate::error::FixtureError;

/// View of the host's fixture resolution service from inside one resolution.
///
/// Resolution is re-entrant: `get_fixture_value` may build further fixtures, which
/// receive their own request.
pub trait FixtureRequest {
    /// Fixture being resolved; `None` at test level.
    fn fixture_name(&self) -> Option<&str>;

    /// Dependency names injected into the fixture being resolved.
    fn argnames(&self) -> &[String];

    fn get_fixture_value(&mut self, name: &str) -> Result<Value, FixtureError>;

    /// Records `value` as the resolved value of the current fixture before it returns.
    fn cache_early(&mut self, value: Value) -> Result<(), FixtureError>;

    /// Declared dependency names of any registered fixture.
    fn fixture_argnames(&self, name: &str) -> Option<Vec<String>>;

    /// Fixtures currently being resolved that have no cached value yet.
    fn pending_fixtures(&self) -> Vec<String>;

    /// Deferred-evaluation coordinator of the running test.
    fn coordinator(&self) -> SharedCoordinator;
}
