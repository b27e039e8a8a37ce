use super::manager::has_shape;
use super::{NvStore, StorageKind, StoreResult};
use crate::module::ModuleInfo;
use serde::{Deserialize, Serialize};

/// Provisioning status flags derived from final/disabled markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleStatus {
    pub provisioned: bool,
    pub disabled: bool,
}

impl ModuleStatus {
    pub const PROVISIONED: ModuleStatus = ModuleStatus {
        provisioned: true,
        disabled: false,
    };
    pub const DISABLED: ModuleStatus = ModuleStatus {
        provisioned: false,
        disabled: true,
    };

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(self) -> bool {
        !self.provisioned && !self.disabled
    }

    /// Returns true when every flag set in `other` is also set here.
    pub fn contains(self, other: ModuleStatus) -> bool {
        (self.provisioned || !other.provisioned) && (self.disabled || !other.disabled)
    }

    pub fn union(self, other: ModuleStatus) -> Self {
        Self {
            provisioned: self.provisioned || other.provisioned,
            disabled: self.disabled || other.disabled,
        }
    }
}

impl NvStore {
    /// Probes final and disabled markers of one module, both shapes.
    ///
    /// Only existence and shape are checked; content is not validated.
    /// A disabled marker implies `PROVISIONED | DISABLED`.
    ///
    /// # Errors
    /// Returns an error only when store paths cannot be derived.
    pub fn module_status(&self, module: &ModuleInfo) -> StoreResult<ModuleStatus> {
        let final_file = self.derive_path(module.name, StorageKind::FinalFile)?;
        let final_dir = self.derive_path(module.name, StorageKind::FinalDir)?;
        let disabled_file = self.derive_path(module.name, StorageKind::DisabledFile)?;
        let disabled_dir = self.derive_path(module.name, StorageKind::DisabledDir)?;

        let mut status = ModuleStatus::empty();
        if has_shape(&disabled_file, StorageKind::DisabledFile)
            || has_shape(&disabled_dir, StorageKind::DisabledDir)
        {
            status = status
                .union(ModuleStatus::PROVISIONED)
                .union(ModuleStatus::DISABLED);
        }
        if has_shape(&final_file, StorageKind::FinalFile)
            || has_shape(&final_dir, StorageKind::FinalDir)
        {
            status = status.union(ModuleStatus::PROVISIONED);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::ModuleStatus;

    #[test]
    fn contains_checks_subset() {
        let both = ModuleStatus::PROVISIONED.union(ModuleStatus::DISABLED);
        assert!(both.contains(ModuleStatus::PROVISIONED));
        assert!(both.contains(ModuleStatus::DISABLED));
        assert!(!ModuleStatus::PROVISIONED.contains(ModuleStatus::DISABLED));
        assert!(ModuleStatus::empty().contains(ModuleStatus::empty()));
        assert!(ModuleStatus::empty().is_empty());
    }
}
