//! Non-volatile store management for module provisioning state.
//!
//! # Responsibility
//! - Derive deterministic store paths from module name and storage kind.
//! - Create, re-attach to and delete stores with shape checks.
//! - Probe final/disabled markers into a module status.
//!
//! # Invariants
//! - Temp and directory store creation is exclusive: an existing one is
//!   never reused. Final and disabled file stores are truncated.
//! - A temp file store never appears without its initial content.
//! - Distinct module names never map to the same store path.
//! - A partially deleted directory store is a valid state for later calls.

use crate::config::ConfigError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

mod kind;
mod manager;
mod probe;

pub use kind::StorageKind;
pub use manager::NvStore;
pub use probe::ModuleStatus;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation attached to an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Create,
    Open,
    Read,
    Write,
    Delete,
}

impl StoreOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

/// NV store errors.
#[derive(Debug)]
pub enum StoreError {
    /// Storage root cannot be resolved.
    Root(ConfigError),
    /// Module name cannot be used as a path component.
    InvalidModuleName(String),
    /// Content helpers were called with a directory kind.
    NotAFileKind(StorageKind),
    /// Underlying OS failure.
    Io {
        op: StoreOp,
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(op: StoreOp, path: PathBuf, source: io::Error) -> Self {
        Self::Io { op, path, source }
    }

    /// Returns the OS error kind, when this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Returns the underlying OS error, when this is an I/O failure.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::AlreadyExists)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root(err) => write!(f, "storage root unavailable: {err}"),
            Self::InvalidModuleName(value) => {
                write!(f, "module name cannot be used for storage: `{value}`")
            }
            Self::NotAFileKind(kind) => write!(f, "storage kind is not a file store: {kind}"),
            Self::Io { op, path, source } => write!(
                f,
                "nv store {} failed for `{}`: {}",
                op.as_str(),
                path.display(),
                crate::status::describe_os_error(source)
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Root(err) => Some(err),
            Self::InvalidModuleName(_) => None,
            Self::NotAFileKind(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(value: ConfigError) -> Self {
        Self::Root(value)
    }
}
