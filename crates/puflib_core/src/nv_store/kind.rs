//! Storage kind taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Shape and role of one NV store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// In-progress provisioning state, single file.
    TempFile,
    /// In-progress provisioning state, directory tree.
    TempDir,
    /// Completion marker, single file.
    FinalFile,
    /// Completion marker, directory tree.
    FinalDir,
    /// Administrative override marker, single file.
    DisabledFile,
    /// Administrative override marker, directory tree.
    DisabledDir,
}

impl StorageKind {
    pub const ALL: [StorageKind; 6] = [
        Self::TempFile,
        Self::TempDir,
        Self::FinalFile,
        Self::FinalDir,
        Self::DisabledFile,
        Self::DisabledDir,
    ];

    pub fn is_dir(self) -> bool {
        matches!(self, Self::TempDir | Self::FinalDir | Self::DisabledDir)
    }

    /// Temp stores double as the provisioning lock and are created exclusively.
    pub fn is_temp(self) -> bool {
        matches!(self, Self::TempFile | Self::TempDir)
    }

    /// Path segment under `<root>/<module>/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::TempFile => "temp.file",
            Self::TempDir => "temp.dir",
            Self::FinalFile => "final.file",
            Self::FinalDir => "final.dir",
            Self::DisabledFile => "disabled.file",
            Self::DisabledDir => "disabled.dir",
        }
    }

    /// Stable id used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TempFile => "temp_file",
            Self::TempDir => "temp_dir",
            Self::FinalFile => "final_file",
            Self::FinalDir => "final_dir",
            Self::DisabledFile => "disabled_file",
            Self::DisabledDir => "disabled_dir",
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::StorageKind;
    use std::collections::BTreeSet;

    #[test]
    fn directory_kinds_are_exactly_the_dir_variants() {
        let dirs: Vec<_> = StorageKind::ALL
            .into_iter()
            .filter(|kind| kind.is_dir())
            .collect();
        assert_eq!(
            dirs,
            vec![
                StorageKind::TempDir,
                StorageKind::FinalDir,
                StorageKind::DisabledDir
            ]
        );
    }

    #[test]
    fn only_temp_kinds_are_exclusive_locks() {
        let temps: Vec<_> = StorageKind::ALL
            .into_iter()
            .filter(|kind| kind.is_temp())
            .collect();
        assert_eq!(temps, vec![StorageKind::TempFile, StorageKind::TempDir]);
    }

    #[test]
    fn path_segments_are_distinct() {
        let segments: BTreeSet<_> = StorageKind::ALL
            .into_iter()
            .map(StorageKind::path_segment)
            .collect();
        assert_eq!(segments.len(), StorageKind::ALL.len());
    }
}
