//! Fixture runtime: the two-phase model construction protocol, deferred post-generation
//! units, lazy value resolution, and an in-memory host (registry + per-test session).

pub mod deferred;
pub mod error;
pub mod handlers;
pub mod lazy;
pub mod model;
pub mod queue;
pub mod registry;
pub mod request;
pub mod session;

pub use deferred::{
    DeferredAction, DeferredCoordinator, DeferredUnit, SharedCoordinator, make_deferred_postgen,
    make_deferred_related,
};
pub use error::{FixtureError, RegistryError};
pub use handlers::{attr_fixture, factory_fixture, invoke_handler, subfactory_fixture};
pub use lazy::evaluate;
pub use model::model_fixture;
pub use queue::DeferredQueue;
pub use registry::{FixtureBinding, FixtureFn, FixtureRegistry};
pub use request::FixtureRequest;
pub use session::FixtureSession;
