//! tempfile wrappers for config round-trip tests

use std::path::PathBuf;

pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory for test")
}

/// Path for a config file inside `dir` that does not exist yet
pub fn temp_config_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
