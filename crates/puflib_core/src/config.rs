//! Storage root configuration.
//!
//! # Responsibility
//! - Resolve the directory under which all NV stores live.
//!
//! # Invariants
//! - A resolved root is always absolute.
//! - Resolution never panics; failures are returned as `ConfigError`.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the storage root.
pub const STORAGE_ROOT_ENV: &str = "PUFLIB_STORAGE_ROOT";

const DEFAULT_DATA_SUBDIR: &str = ".local/share/puflib";

/// Resolved storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl StorageConfig {
    /// Builds a config from an already-known root.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = normalize_root(root.into())?;
        Ok(Self { root })
    }

    /// Resolves the storage root from process environment.
    ///
    /// Precedence: `explicit`, then `PUFLIB_STORAGE_ROOT`, then
    /// `$HOME/.local/share/puflib`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_with(
            explicit,
            std::env::var_os(STORAGE_ROOT_ENV),
            std::env::var_os("HOME"),
        )
    }

    fn resolve_with(
        explicit: Option<&Path>,
        env_root: Option<OsString>,
        home: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        if let Some(value) = env_root.filter(|value| !value.is_empty()) {
            return Self::new(PathBuf::from(value));
        }
        match home.filter(|value| !value.is_empty()) {
            Some(home) => Self::new(PathBuf::from(home).join(DEFAULT_DATA_SUBDIR)),
            None => Err(ConfigError::Missing),
        }
    }
}

pub(crate) fn normalize_root(root: PathBuf) -> Result<PathBuf, ConfigError> {
    if root.as_os_str().is_empty() {
        return Err(ConfigError::Empty);
    }
    if !root.is_absolute() {
        return Err(ConfigError::NotAbsolute(root));
    }
    Ok(root)
}

/// Storage root resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing,
    Empty,
    NotAbsolute(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(
                f,
                "storage root is not configured; set {STORAGE_ROOT_ENV} or HOME"
            ),
            Self::Empty => write!(f, "storage root must not be empty"),
            Self::NotAbsolute(path) => write!(
                f,
                "storage root must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StorageConfig};
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};

    #[test]
    fn explicit_root_wins_over_environment() {
        let config = StorageConfig::resolve_with(
            Some(Path::new("/srv/puf")),
            Some(OsString::from("/env/puf")),
            Some(OsString::from("/home/op")),
        )
        .expect("explicit root resolves");
        assert_eq!(config.root, PathBuf::from("/srv/puf"));
    }

    #[test]
    fn environment_wins_over_home() {
        let config = StorageConfig::resolve_with(
            None,
            Some(OsString::from("/env/puf")),
            Some(OsString::from("/home/op")),
        )
        .expect("env root resolves");
        assert_eq!(config.root, PathBuf::from("/env/puf"));
    }

    #[test]
    fn falls_back_to_home_data_dir() {
        let config = StorageConfig::resolve_with(
            None,
            Some(OsString::new()),
            Some(OsString::from("/home/op")),
        )
        .expect("home root resolves");
        assert_eq!(config.root, PathBuf::from("/home/op/.local/share/puflib"));
    }

    #[test]
    fn missing_everything_is_an_error() {
        let err = StorageConfig::resolve_with(None, None, None).expect_err("nothing to resolve");
        assert_eq!(err, ConfigError::Missing);
    }

    #[test]
    fn rejects_relative_and_empty_roots() {
        let err = StorageConfig::new("relative/root").expect_err("relative root must fail");
        assert!(matches!(err, ConfigError::NotAbsolute(_)));
        let err = StorageConfig::new("").expect_err("empty root must fail");
        assert_eq!(err, ConfigError::Empty);
    }
}
