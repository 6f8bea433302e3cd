use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "FIXGEN_CACHE_DIR";
pub const DEFAULT_PACKAGE: &str = "_fixgen_generated_fixtures";

#[derive(Clone, Debug)]
pub struct MaterializeConfig {
    /// Parent of the artifact package; a temporary directory is used when unset.
    pub cache_dir: Option<PathBuf>,
    pub package: String,
    pub write_artifacts: bool,
}

impl MaterializeConfig {
    /// Config that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            package: DEFAULT_PACKAGE.into(),
            write_artifacts: false,
        }
    }
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from),
            package: DEFAULT_PACKAGE.into(),
            write_artifacts: true,
        }
    }
}
