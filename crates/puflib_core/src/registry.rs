//! In-process module registry.
//!
//! # Responsibility
//! - Hold the modules known to this process in registration order.
//! - Look modules up by exact name.
//!
//! # Invariants
//! - Names are unique and match `[a-z0-9][a-z0-9_-]*`.
//! - Lookup is case-sensitive; a miss is `None`, never an error.

use crate::module::PufModule;
use crate::modules::selftest::SelfTestModule;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static MODULE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid module name regex"));

/// Module registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidModuleName(String),
    DuplicateModuleName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidModuleName(value) => write!(f, "module name is invalid: {value}"),
            Self::DuplicateModuleName(value) => {
                write!(f, "module name already registered: {value}")
            }
        }
    }
}

impl Error for RegistryError {}

/// Ordered set of provisioning modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn PufModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module built into this library.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register_builtin()?;
        Ok(registry)
    }

    /// Registers the built-in modules.
    pub fn register_builtin(&mut self) -> Result<(), RegistryError> {
        self.register(Arc::new(SelfTestModule::new()))
    }

    /// Appends one module.
    pub fn register(&mut self, module: Arc<dyn PufModule>) -> Result<(), RegistryError> {
        let name = module.info().name;
        if !MODULE_NAME_RE.is_match(name) {
            return Err(RegistryError::InvalidModuleName(name.to_string()));
        }
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateModuleName(name.to_string()));
        }

        log::debug!("event=module_register module=registry status=ok name={name}");
        self.modules.push(module);
        Ok(())
    }

    /// All modules in registration order.
    pub fn modules(&self) -> &[Arc<dyn PufModule>] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PufModule>> {
        self.modules
            .iter()
            .find(|module| module.info().name == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.info().name).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
