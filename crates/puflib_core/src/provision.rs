//! Resumable multi-invocation provisioning sessions.
//!
//! # Responsibility
//! - Turn exclusive temp-store creation into a fresh/resumed decision.
//! - Persist and parse the step counter that carries progress between
//!   process invocations.
//! - Swap the temp store for the final marker on completion.
//!
//! # Invariants
//! - No session state survives in memory; every decision is re-derived from
//!   the temp store on each invocation.
//! - A temp store appears together with its initial state; a blank one is
//!   an abandoned start and is restarted, never resumed.
//! - Corrupted temp state is reported and never rewritten automatically.
//! - Of two processes racing to create the temp store, exactly one sees a
//!   fresh session.
//! - Completion never deletes the temp store while the final store is
//!   known to be unwritable.

use crate::module::{ModuleInfo, ProvisionContext};
use crate::nv_store::{StorageKind, StoreError, StoreOp};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// State file name inside directory-shaped stores.
pub const DIR_STATE_FILE: &str = "state";

/// Marker written into the final store by the step-counter pattern.
pub const PROVISIONED_MARKER: &str = "provisioned";

/// Observed position of a module in its provisioning progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    NotStarted,
    /// Temp store holds this step counter.
    Step(u32),
    Complete,
}

impl ProvisionState {
    /// Derives the state from durable stores without modifying them.
    ///
    /// An absent or blank temp store is `NotStarted`.
    ///
    /// # Errors
    /// - `ProvisionError::Corrupted` when the temp store is unparseable.
    /// - `ProvisionError::Store` when paths cannot be derived, the temp store
    ///   has the wrong shape, or reads fail.
    pub fn observe(
        ctx: &ProvisionContext,
        module: &ModuleInfo,
        temp_kind: StorageKind,
    ) -> Result<Self, ProvisionError> {
        require_temp_kind(temp_kind)?;
        if ctx.store().module_status(module)?.provisioned {
            return Ok(Self::Complete);
        }
        let path = ctx.store().derive_path(module.name, temp_kind)?;
        if let Err(err) = fs::metadata(&path) {
            if err.kind() == io::ErrorKind::NotFound {
                return Ok(Self::NotStarted);
            }
        }

        let session = StepSession {
            ctx,
            module,
            kind: temp_kind,
            path: ctx.store().get(module, temp_kind)?,
        };
        if session.is_abandoned()? {
            return Ok(Self::NotStarted);
        }
        Ok(Self::Step(session.read_step()?))
    }
}

/// How `StepSession::begin` attached to the temp store.
pub enum SessionStart<'a> {
    /// The temp store was just created by this invocation.
    Fresh(StepSession<'a>),
    /// The temp store already existed; progress is in its content.
    Resumed(StepSession<'a>),
}

/// Handle on one module's temp store for the current invocation.
pub struct StepSession<'a> {
    ctx: &'a ProvisionContext,
    module: &'a ModuleInfo,
    kind: StorageKind,
    path: PathBuf,
}

impl<'a> StepSession<'a> {
    /// Creates or re-attaches to the temp store of `module`.
    ///
    /// A fresh store is created holding `initial` as its state. Creation is
    /// exclusive; `AlreadyExists` means another invocation started
    /// provisioning earlier and this one resumes it, unless that store was
    /// left blank, in which case `initial` is written and the session starts
    /// fresh. Any other creation failure is returned and leaves no store.
    pub fn begin(
        ctx: &'a ProvisionContext,
        module: &'a ModuleInfo,
        kind: StorageKind,
        initial: &str,
    ) -> Result<SessionStart<'a>, ProvisionError> {
        require_temp_kind(kind)?;
        match create_with_state(ctx, module, kind, initial) {
            Ok(path) => {
                info!(
                    "event=provision_begin module=provision status=fresh store={} kind={}",
                    module.name, kind
                );
                Ok(SessionStart::Fresh(Self {
                    ctx,
                    module,
                    kind,
                    path,
                }))
            }
            Err(err) if err.is_already_exists() => {
                let session = Self {
                    ctx,
                    module,
                    kind,
                    path: ctx.store().get(module, kind)?,
                };
                if session.is_abandoned()? {
                    session.write_state(initial)?;
                    warn!(
                        "event=provision_begin module=provision status=restarted store={} kind={}",
                        module.name, kind
                    );
                    return Ok(SessionStart::Fresh(session));
                }
                info!(
                    "event=provision_begin module=provision status=resumed store={} kind={}",
                    module.name, kind
                );
                Ok(SessionStart::Resumed(session))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Reads the raw persisted state.
    pub fn read_state(&self) -> Result<String, ProvisionError> {
        let path = self.state_path();
        fs::read_to_string(&path)
            .map_err(|err| StoreError::io(StoreOp::Read, path, err).into())
    }

    /// Replaces the persisted state.
    pub fn write_state(&self, contents: &str) -> Result<(), ProvisionError> {
        let path = self.state_path();
        fs::write(&path, contents).map_err(|err| StoreError::io(StoreOp::Write, path, err))?;
        Ok(())
    }

    /// Parses the persisted decimal step counter.
    pub fn read_step(&self) -> Result<u32, ProvisionError> {
        let content = self.read_state()?;
        match parse_step(&content) {
            Some(step) => Ok(step),
            None => {
                warn!(
                    "event=provision_state module=provision status=corrupted store={} kind={}",
                    self.module.name, self.kind
                );
                Err(ProvisionError::Corrupted {
                    path: self.path.clone(),
                    content,
                })
            }
        }
    }

    /// Persists `step` as the new step counter.
    pub fn write_step(&self, step: u32) -> Result<(), ProvisionError> {
        self.write_state(&format_step(step))?;
        info!(
            "event=provision_step module=provision status=ok store={} step={}",
            self.module.name, step
        );
        Ok(())
    }

    /// Deletes the temp store and writes `marker` into the final store.
    ///
    /// The final store has the same shape as the temp store and replaces
    /// any final store left by an earlier provisioning. An entry of the
    /// other shape in its place fails before the temp store is touched.
    pub fn finish(self, marker: &str) -> Result<PathBuf, ProvisionError> {
        let store = self.ctx.store();
        let final_kind = if self.kind.is_dir() {
            StorageKind::FinalDir
        } else {
            StorageKind::FinalFile
        };
        let final_path = store.derive_path(self.module.name, final_kind)?;
        match fs::metadata(&final_path) {
            Ok(meta) if meta.is_dir() != final_kind.is_dir() => {
                let err = io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{final_kind} path is occupied by another entry"),
                );
                return Err(StoreError::io(StoreOp::Create, final_path, err).into());
            }
            Ok(_) if final_kind.is_dir() => store.delete(self.module, final_kind)?,
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::io(StoreOp::Open, final_path, err).into()),
        }

        store.delete(self.module, self.kind)?;
        let final_path = create_with_state(self.ctx, self.module, final_kind, marker)?;

        info!(
            "event=provision_finish module=provision status=ok store={} kind={}",
            self.module.name, final_kind
        );
        Ok(final_path)
    }

    /// True when the store exists but carries no state yet.
    fn is_abandoned(&self) -> Result<bool, ProvisionError> {
        let path = self.state_path();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.trim().is_empty()),
            Err(err) if err.kind() == io::ErrorKind::NotFound && self.kind.is_dir() => Ok(true),
            Err(err) => Err(StoreError::io(StoreOp::Read, path, err).into()),
        }
    }

    fn state_path(&self) -> PathBuf {
        state_path_for(&self.path, self.kind)
    }
}

/// Creates a store of `kind` whose state is `contents` from the start.
///
/// A directory store whose state file cannot be written is deleted again.
fn create_with_state(
    ctx: &ProvisionContext,
    module: &ModuleInfo,
    kind: StorageKind,
    contents: &str,
) -> Result<PathBuf, StoreError> {
    let store = ctx.store();
    if !kind.is_dir() {
        return store.create_with_contents(module, kind, contents);
    }

    let path = store.create(module, kind)?;
    let state_path = state_path_for(&path, kind);
    if let Err(err) = fs::write(&state_path, contents) {
        if let Err(cleanup) = store.delete(module, kind) {
            warn!(
                "event=provision_begin module=provision status=cleanup_failed store={} kind={} error={}",
                module.name, kind, cleanup
            );
        }
        return Err(StoreError::io(StoreOp::Write, state_path, err));
    }
    Ok(path)
}

fn state_path_for(path: &Path, kind: StorageKind) -> PathBuf {
    if kind.is_dir() {
        path.join(DIR_STATE_FILE)
    } else {
        path.to_path_buf()
    }
}

fn require_temp_kind(kind: StorageKind) -> Result<(), ProvisionError> {
    if kind.is_temp() {
        Ok(())
    } else {
        Err(ProvisionError::NotATempKind(kind))
    }
}

/// Renders a step counter the way `read_step` parses it.
pub fn format_step(step: u32) -> String {
    format!("{step}\n")
}

/// Parses a persisted step counter; surrounding whitespace is ignored.
pub fn parse_step(content: &str) -> Option<u32> {
    content.trim().parse().ok()
}

/// Session helper errors.
#[derive(Debug)]
pub enum ProvisionError {
    Store(StoreError),
    /// Temp store content cannot be interpreted.
    Corrupted { path: PathBuf, content: String },
    NotATempKind(StorageKind),
}

impl Display for ProvisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Corrupted { path, .. } => {
                write!(f, "NV store corrupted: `{}`", path.display())
            }
            Self::NotATempKind(kind) => {
                write!(f, "storage kind cannot hold session state: {kind}")
            }
        }
    }
}

impl Error for ProvisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Corrupted { .. } => None,
            Self::NotATempKind(_) => None,
        }
    }
}

impl From<StoreError> for ProvisionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
