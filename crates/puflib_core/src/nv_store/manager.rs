use super::{StorageKind, StoreError, StoreOp, StoreResult};
use crate::config::{normalize_root, StorageConfig};
use crate::module::ModuleInfo;
use log::{error, info, warn};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// NV store manager rooted at one storage directory.
///
/// Paths are `<root>/<module>/<kind segment>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvStore {
    root: PathBuf,
}

impl NvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derives the store path for one module and kind.
    ///
    /// # Errors
    /// - `StoreError::Root` when the root is empty or relative.
    /// - `StoreError::InvalidModuleName` when the name is not a single
    ///   normal path component.
    pub fn derive_path(&self, module_name: &str, kind: StorageKind) -> StoreResult<PathBuf> {
        let root = normalize_root(self.root.clone())?;
        if !is_single_component(module_name) {
            return Err(StoreError::InvalidModuleName(module_name.to_string()));
        }
        Ok(root.join(module_name).join(kind.path_segment()))
    }

    /// Creates a store and returns its path.
    ///
    /// Temp stores and every directory store are created exclusively: an
    /// existing store yields an `AlreadyExists` I/O error and is left
    /// untouched. Final and disabled file stores are created or truncated.
    /// Missing ancestor directories are created.
    pub fn create(&self, module: &ModuleInfo, kind: StorageKind) -> StoreResult<PathBuf> {
        let path = self.derive_path(module.name, kind)?;
        let started_at = Instant::now();

        let result = if kind.is_dir() {
            create_dir_exclusive(&path)
        } else if kind.is_temp() {
            create_file_exclusive(&path)
        } else {
            create_file_truncated(&path)
        };
        log_create(module, kind, path, started_at, result)
    }

    /// Creates a file store that already holds `contents` when it appears.
    ///
    /// Temp kinds are published by hard-linking a fully written staging
    /// file onto the store path, so the store is never observed empty and
    /// creation stays exclusive. Other file kinds are truncated and
    /// rewritten. A failed write leaves no store behind.
    pub fn create_with_contents(
        &self,
        module: &ModuleInfo,
        kind: StorageKind,
        contents: &str,
    ) -> StoreResult<PathBuf> {
        require_file_kind(kind)?;
        let path = self.derive_path(module.name, kind)?;
        let started_at = Instant::now();

        let result = if kind.is_temp() {
            let staging = staging_path_for(&path);
            publish_exclusive(&path, &staging, contents)
        } else {
            create_file_truncated(&path).and_then(|()| fs::write(&path, contents))
        };
        log_create(module, kind, path, started_at, result)
    }

    /// Resolves an existing store with the expected file/dir shape.
    ///
    /// Missing or wrongly shaped stores fail with `PermissionDenied`.
    pub fn get(&self, module: &ModuleInfo, kind: StorageKind) -> StoreResult<PathBuf> {
        let path = self.derive_path(module.name, kind)?;
        if has_shape(&path, kind) {
            Ok(path)
        } else {
            let err = io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("no accessible {} store", kind),
            );
            Err(StoreError::io(StoreOp::Open, path, err))
        }
    }

    /// Deletes one store.
    ///
    /// Directory stores are removed recursively. A failure can leave the
    /// tree partially removed; repeating the call is always valid.
    pub fn delete(&self, module: &ModuleInfo, kind: StorageKind) -> StoreResult<()> {
        let path = self.derive_path(module.name, kind)?;
        let result = if kind.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => {
                info!(
                    "event=nv_store_delete module=nv_store status=ok store={} kind={}",
                    module.name, kind
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=nv_store_delete module=nv_store status=error store={} kind={} error={}",
                    module.name, kind, err
                );
                Err(StoreError::io(StoreOp::Delete, path, err))
            }
        }
    }

    /// Reads the content of an existing file store.
    pub fn read_file(&self, module: &ModuleInfo, kind: StorageKind) -> StoreResult<String> {
        require_file_kind(kind)?;
        let path = self.get(module, kind)?;
        fs::read_to_string(&path).map_err(|err| StoreError::io(StoreOp::Read, path, err))
    }

    /// Replaces the content of an existing file store.
    pub fn write_file(
        &self,
        module: &ModuleInfo,
        kind: StorageKind,
        contents: &str,
    ) -> StoreResult<()> {
        require_file_kind(kind)?;
        let path = self.get(module, kind)?;
        fs::write(&path, contents).map_err(|err| StoreError::io(StoreOp::Write, path, err))
    }

    /// Removes the final markers of one module.
    ///
    /// Absent markers are skipped. Disabled markers are left in place.
    pub fn deprovision(&self, module: &ModuleInfo) -> StoreResult<()> {
        for kind in [StorageKind::FinalFile, StorageKind::FinalDir] {
            let path = self.derive_path(module.name, kind)?;
            if has_shape(&path, kind) {
                self.delete(module, kind)?;
            }
        }
        info!(
            "event=module_deprovision module=nv_store status=ok store={}",
            module.name
        );
        Ok(())
    }
}

fn log_create(
    module: &ModuleInfo,
    kind: StorageKind,
    path: PathBuf,
    started_at: Instant,
    result: io::Result<()>,
) -> StoreResult<PathBuf> {
    match result {
        Ok(()) => {
            info!(
                "event=nv_store_create module=nv_store status=ok store={} kind={} duration_ms={}",
                module.name,
                kind,
                started_at.elapsed().as_millis()
            );
            Ok(path)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            info!(
                "event=nv_store_create module=nv_store status=exists store={} kind={}",
                module.name, kind
            );
            Err(StoreError::io(StoreOp::Create, path, err))
        }
        Err(err) => {
            error!(
                "event=nv_store_create module=nv_store status=error store={} kind={} error={}",
                module.name, kind, err
            );
            Err(StoreError::io(StoreOp::Create, path, err))
        }
    }
}

pub(super) fn has_shape(path: &Path, kind: StorageKind) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_dir() == kind.is_dir(),
        Err(_) => false,
    }
}

fn require_file_kind(kind: StorageKind) -> StoreResult<()> {
    if kind.is_dir() {
        return Err(StoreError::NotAFileKind(kind));
    }
    Ok(())
}

fn create_dir_exclusive(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(path)
}

fn create_file_exclusive(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
}

fn create_file_truncated(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map(drop)
}

/// Writes `contents` to `staging`, then links it onto `path`.
///
/// `fs::hard_link` refuses an existing destination, which keeps the
/// publication exclusive. The staging file is always removed.
fn publish_exclusive(path: &Path, staging: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let result = fs::write(staging, contents).and_then(|()| fs::hard_link(staging, path));
    if let Err(err) = fs::remove_file(staging) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(
                "event=nv_store_staging module=nv_store status=cleanup_failed path={} error={}",
                staging.display(),
                err
            );
        }
    }
    result
}

/// Sibling staging path, unique per process and call.
fn staging_path_for(path: &Path) -> PathBuf {
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".staging-{}-{}", std::process::id(), seq));
    path.with_file_name(name)
}

fn is_single_component(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !value.contains(['/', '\\'])
}
