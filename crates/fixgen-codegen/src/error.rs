use std::path::PathBuf;

use fixgen_types::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("fixture '{0}' is not part of this module")]
    UnknownFixture(String),
}
