use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

pub type LazyFn = Arc<dyn Fn(&IndexMap<String, Value>) -> anyhow::Result<Value> + Send + Sync>;

#[derive(Clone)]
pub enum LazyTarget {
    Fixture(String),
    Callable(LazyFn),
}

/// A value computed from other fixtures when it is evaluated.
///
/// The argument names are fixed when the value is created and double as the
/// fixture's dependency list.
#[derive(Clone)]
pub struct LazyValue {
    target: LazyTarget,
    args: Vec<String>,
}

impl LazyValue {
    /// Refers to another fixture by name.
    pub fn fixture(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            args: vec![name.clone()],
            target: LazyTarget::Fixture(name),
        }
    }

    /// Wraps a function receiving the named fixtures as a name -> value map.
    pub fn from_fn<I, S, F>(args: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&IndexMap<String, Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            target: LazyTarget::Callable(Arc::new(f)),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn target(&self) -> &LazyTarget {
        &self.target
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            LazyTarget::Fixture(name) => write!(f, "Lazy({name})"),
            LazyTarget::Callable(_) => write!(f, "Lazy(fn({}))", self.args.join(", ")),
        }
    }
}
