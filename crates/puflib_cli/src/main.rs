//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `puflib_core` linkage and storage root resolution.
//! - Start file logging under the storage root.
//! - Print every built-in module with its provisioning status.

use puflib_core::{
    default_log_level, init_logging, LoggingError, ModuleRegistry, NvStore, ProvisionContext,
    ProvisionState, StorageConfig, StorageKind,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Log directory under the storage root; never a valid module name.
const LOG_SUBDIR: &str = ".logs";

fn main() -> ExitCode {
    println!("puflib_core version={}", puflib_core::core_version());

    let config = match StorageConfig::resolve(None) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = start_file_logging(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let registry = match ModuleRegistry::builtin() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = ProvisionContext::with_store(NvStore::from_config(&config));
    println!("storage_root={}", config.root.display());
    for module in registry.modules() {
        let info = module.info();
        let status = match ctx.store().module_status(info) {
            Ok(status) => format!(
                "provisioned={} disabled={}",
                status.provisioned, status.disabled
            ),
            Err(err) => format!("status_error=\"{err}\""),
        };
        let state = match ProvisionState::observe(&ctx, info, StorageKind::TempFile) {
            Ok(state) => format!("{state:?}"),
            Err(err) => format!("error(\"{err}\")"),
        };
        println!(
            "module={} hw_supported={} {} state={} author=\"{}\" description=\"{}\"",
            info.name,
            module.is_hw_supported(&ctx),
            status,
            state,
            info.author,
            info.description
        );
    }
    ExitCode::SUCCESS
}

fn start_file_logging(config: &StorageConfig) -> Result<PathBuf, LoggingError> {
    let log_dir = config.root.join(LOG_SUBDIR);
    init_logging(default_log_level(), &log_dir)?;
    Ok(log_dir)
}

#[cfg(test)]
mod tests {
    use super::start_file_logging;
    use puflib_core::{default_log_level, logging_status, StorageConfig};

    #[test]
    fn file_logging_starts_under_storage_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig::new(dir.path()).expect("absolute root");

        let log_dir = start_file_logging(&config).expect("logging starts");
        assert_eq!(log_dir, dir.path().join(".logs"));
        assert!(log_dir.is_dir());
        assert_eq!(logging_status(), Some((default_log_level(), log_dir)));
    }
}
