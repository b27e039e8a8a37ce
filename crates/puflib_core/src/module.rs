//! Module capability contract.
//!
//! # Responsibility
//! - Define the metadata and capability set every provisioning module exposes.
//! - Carry the explicit context (NV store + callback bus) into module calls.
//!
//! # Invariants
//! - Modules hold no provisioning state in memory between calls; durable
//!   state lives only in their NV stores.
//! - Module names are unique within one registry.

use crate::callback::CallbackBus;
use crate::nv_store::NvStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Static descriptor of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleInfo {
    /// Unique registry key, also the NV store namespace.
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
}

impl ModuleInfo {
    pub const fn new(name: &'static str, author: &'static str, description: &'static str) -> Self {
        Self {
            name,
            author,
            description,
        }
    }
}

/// Result of one `provision()` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// Provisioning finished; the final marker is in place.
    Complete,
    /// Progress was persisted; invoke again later.
    Incomplete,
    /// The attempt failed; whether to retry is the caller's decision.
    Error,
}

impl ProvisionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::Error => "error",
        }
    }

    /// Returns true when re-invoking cannot make further progress on its own.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Incomplete)
    }
}

/// Explicit context threaded through every capability call.
#[derive(Clone)]
pub struct ProvisionContext {
    store: NvStore,
    bus: Arc<CallbackBus>,
}

impl ProvisionContext {
    pub fn new(store: NvStore, bus: Arc<CallbackBus>) -> Self {
        Self { store, bus }
    }

    /// Context with a fresh, handler-less callback bus.
    pub fn with_store(store: NvStore) -> Self {
        Self::new(store, Arc::new(CallbackBus::new()))
    }

    pub fn store(&self) -> &NvStore {
        &self.store
    }

    pub fn bus(&self) -> &CallbackBus {
        &self.bus
    }

    pub fn shared_bus(&self) -> Arc<CallbackBus> {
        Arc::clone(&self.bus)
    }
}

/// Capability set implemented by each provisioning module.
pub trait PufModule: Send + Sync {
    fn info(&self) -> &ModuleInfo;

    /// Returns whether the current hardware carries this module's primitive.
    fn is_hw_supported(&self, ctx: &ProvisionContext) -> bool;

    /// Runs one provisioning step and persists its progress.
    fn provision(&self, ctx: &ProvisionContext) -> ProvisionOutcome;

    /// Produces a challenge response, if the module supports one.
    fn chal_resp(&self, ctx: &ProvisionContext) -> Option<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::ProvisionOutcome;

    #[test]
    fn only_incomplete_is_non_terminal() {
        assert!(ProvisionOutcome::Complete.is_terminal());
        assert!(ProvisionOutcome::Error.is_terminal());
        assert!(!ProvisionOutcome::Incomplete.is_terminal());
    }
}
