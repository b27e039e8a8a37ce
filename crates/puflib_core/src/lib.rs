//! Host core for pluggable PUF provisioning modules.
//! Modules keep their provisioning progress in NV stores, so a provisioning
//! run may span any number of process invocations.

pub mod callback;
pub mod config;
pub mod logging;
pub mod module;
pub mod modules;
pub mod nv_store;
pub mod provision;
pub mod registry;
pub mod status;

pub use callback::{CallbackBus, QueryError, QueryHandler, QueryRequest, StatusHandler};
pub use config::{ConfigError, StorageConfig, STORAGE_ROOT_ENV};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use module::{ModuleInfo, ProvisionContext, ProvisionOutcome, PufModule};
pub use modules::selftest::SelfTestModule;
pub use nv_store::{ModuleStatus, NvStore, StorageKind, StoreError, StoreOp, StoreResult};
pub use provision::{
    format_step, ProvisionError, ProvisionState, SessionStart, StepSession, PROVISIONED_MARKER,
};
pub use registry::{ModuleRegistry, RegistryError};
pub use status::{describe_os_error, render_status_line, StatusLevel, INTERNAL_FORMAT_ERROR};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
