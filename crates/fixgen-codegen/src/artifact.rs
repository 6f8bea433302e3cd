use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;

use crate::config::MaterializeConfig;
use crate::error::MaterializeError;

const README: &str = "Generated fixture listings. This directory is recreated on every run.\n";

/// Directory holding the generated listings for one materializer.
#[derive(Debug)]
pub(crate) enum ArtifactDir {
    Persistent(PathBuf),
    /// Removed when dropped.
    Temporary(TempDir),
}

impl ArtifactDir {
    pub(crate) fn acquire(config: &MaterializeConfig) -> Result<Self, MaterializeError> {
        if let Some(cache_dir) = &config.cache_dir {
            let root = cache_dir.join(&config.package);
            match prepare(&root) {
                Ok(()) => {
                    debug!("using artifact directory {}", root.display());
                    return Ok(ArtifactDir::Persistent(root));
                }
                Err(err) => {
                    warn!(
                        "cannot use artifact directory {}: {err}; falling back to a temporary directory",
                        root.display()
                    );
                }
            }
        }
        let temp = tempfile::Builder::new()
            .prefix(&config.package)
            .tempdir()
            .map_err(|source| MaterializeError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        debug!("using temporary artifact directory {}", temp.path().display());
        Ok(ArtifactDir::Temporary(temp))
    }

    pub(crate) fn path(&self) -> &Path {
        match self {
            ArtifactDir::Persistent(path) => path,
            ArtifactDir::Temporary(temp) => temp.path(),
        }
    }
}

fn prepare(root: &Path) -> std::io::Result<()> {
    if root.exists() {
        fs::remove_dir_all(root)?;
    }
    fs::create_dir_all(root)?;
    fs::write(root.join("README.md"), README)
}
