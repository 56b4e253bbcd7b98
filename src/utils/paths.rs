//! Filesystem layout of the application home directory.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

pub const HOME_ENV: &str = "EXPENSE_TRACKER_HOME";

const DEFAULT_DIR_NAME: &str = ".expense_tracker";
const DATABASE_FILE: &str = "expense_tracker.db";
const SETTINGS_FILE: &str = "settings.json";
const EXPORTS_DIR: &str = "exports";

/// Returns the application data directory, defaulting to `~/.expense_tracker`.
pub fn app_home() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn database_file_in(base: &Path) -> PathBuf {
    base.join(DATABASE_FILE)
}

pub fn settings_file_in(base: &Path) -> PathBuf {
    base.join(SETTINGS_FILE)
}

pub fn exports_dir_in(base: &Path) -> PathBuf {
    base.join(EXPORTS_DIR)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_in_base() {
        let base = Path::new("/tmp/tracker");
        assert_eq!(database_file_in(base), base.join("expense_tracker.db"));
        assert_eq!(settings_file_in(base), base.join("settings.json"));
        assert_eq!(exports_dir_in(base), base.join("exports"));
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
