use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture '{0}' not found")]
    Lookup(String),
    #[error("recursive dependency involving fixture '{name}' (resolving {chain})")]
    RecursiveDependency { name: String, chain: String },
    #[error("blueprint '{0}' has no model type")]
    MissingModel(String),
    #[error("constructing '{fixture}' failed: {source}")]
    Construction {
        fixture: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("lazy value {target} failed: {source}")]
    Lazy {
        target: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("post-generation '{unit}' failed: {source}")]
    Hook {
        unit: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("after-postgeneration for '{model}' failed: {source}")]
    AfterPostgeneration {
        model: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("fixture '{fixture}' expected a {expected} value, got {found}")]
    UnexpectedValue {
        fixture: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0} must run while a fixture is being resolved")]
    NoFixtureContext(&'static str),
    #[error("parameters of fixture '{0}' are not set")]
    ParamsUnset(String),
    #[error("deferred post-generation units were never evaluated: {0:?}")]
    UnevaluatedDeferred(Vec<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("fixture '{0}' is already registered")]
    DuplicateFixture(String),
}
