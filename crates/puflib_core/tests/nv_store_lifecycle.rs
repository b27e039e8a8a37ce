use puflib_core::{ModuleInfo, ModuleStatus, NvStore, StorageKind, StoreError};
use std::fs;
use std::io;

const ALPHA: ModuleInfo = ModuleInfo::new("alpha", "test", "alpha module");
const BETA: ModuleInfo = ModuleInfo::new("beta", "test", "beta module");

#[test]
fn create_then_get_returns_same_path_for_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    for kind in StorageKind::ALL {
        let created = store.create(&ALPHA, kind).unwrap();
        let resolved = store.get(&ALPHA, kind).unwrap();
        assert_eq!(created, resolved, "kind {kind}");
        assert_eq!(resolved.is_dir(), kind.is_dir(), "kind {kind}");
        assert_eq!(created, store.derive_path("alpha", kind).unwrap());
    }
}

#[test]
fn get_on_missing_store_is_an_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let err = store.get(&ALPHA, StorageKind::TempFile).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
}

#[test]
fn creating_existing_dir_store_fails_and_keeps_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let path = store.create(&ALPHA, StorageKind::TempDir).unwrap();
    fs::create_dir(path.join("nested")).unwrap();
    fs::write(path.join("nested/nonce"), "abcd").unwrap();

    let err = store.create(&ALPHA, StorageKind::TempDir).unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(
        fs::read_to_string(path.join("nested/nonce")).unwrap(),
        "abcd"
    );
}

#[test]
fn file_store_creation_builds_missing_ancestors() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("deep/root");
    let store = NvStore::new(&root);

    let path = store.create(&ALPHA, StorageKind::FinalFile).unwrap();
    assert!(path.starts_with(&root));
    assert!(path.is_file());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn delete_removes_files_and_whole_trees() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let file = store.create(&ALPHA, StorageKind::TempFile).unwrap();
    let tree = store.create(&ALPHA, StorageKind::TempDir).unwrap();
    fs::create_dir_all(tree.join("a/b")).unwrap();
    fs::write(tree.join("a/b/c"), "x").unwrap();

    store.delete(&ALPHA, StorageKind::TempFile).unwrap();
    store.delete(&ALPHA, StorageKind::TempDir).unwrap();
    assert!(!file.exists());
    assert!(!tree.exists());
}

#[test]
fn delete_of_missing_store_surfaces_os_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let err = store.delete(&ALPHA, StorageKind::TempFile).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    assert!(matches!(err, StoreError::Io { .. }));
}

#[test]
fn half_deleted_tree_can_be_deleted_again() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let tree = store.create(&ALPHA, StorageKind::TempDir).unwrap();
    fs::create_dir_all(tree.join("left")).unwrap();
    fs::write(tree.join("left/part"), "x").unwrap();
    fs::remove_file(tree.join("left/part")).unwrap();

    assert!(store.create(&ALPHA, StorageKind::TempDir).unwrap_err().is_already_exists());
    store.delete(&ALPHA, StorageKind::TempDir).unwrap();
    store.create(&ALPHA, StorageKind::TempDir).unwrap();
}

#[test]
fn stores_of_distinct_modules_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    store.create(&ALPHA, StorageKind::TempFile).unwrap();
    store.create(&BETA, StorageKind::TempFile).unwrap();
    store.delete(&ALPHA, StorageKind::TempFile).unwrap();
    assert!(store.get(&BETA, StorageKind::TempFile).is_ok());
}

#[test]
fn module_status_without_stores_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    let status = store.module_status(&ALPHA).unwrap();
    assert!(status.is_empty());
}

#[test]
fn disabled_file_implies_provisioned_and_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());
    store.create(&ALPHA, StorageKind::DisabledFile).unwrap();

    let status = store.module_status(&ALPHA).unwrap();
    assert!(status.contains(ModuleStatus::PROVISIONED));
    assert!(status.contains(ModuleStatus::DISABLED));
}

#[test]
fn final_markers_of_either_shape_mean_provisioned() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    store.create(&ALPHA, StorageKind::FinalDir).unwrap();
    store.create(&BETA, StorageKind::FinalFile).unwrap();

    for module in [&ALPHA, &BETA] {
        let status = store.module_status(module).unwrap();
        assert_eq!(status, ModuleStatus::PROVISIONED);
    }
}

#[test]
fn temp_store_alone_does_not_count_as_provisioned() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());
    store.create(&ALPHA, StorageKind::TempFile).unwrap();

    assert!(store.module_status(&ALPHA).unwrap().is_empty());
}

#[test]
fn module_status_fails_when_root_is_unresolvable() {
    let store = NvStore::new("relative/root");
    assert!(matches!(
        store.module_status(&ALPHA),
        Err(StoreError::Root(_))
    ));
}

#[test]
fn deprovision_removes_final_markers_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    store.create(&ALPHA, StorageKind::FinalFile).unwrap();
    let final_dir = store.create(&ALPHA, StorageKind::FinalDir).unwrap();
    fs::write(final_dir.join("marker"), "provisioned").unwrap();
    store.deprovision(&ALPHA).unwrap();
    assert!(store.module_status(&ALPHA).unwrap().is_empty());

    store.create(&BETA, StorageKind::DisabledFile).unwrap();
    store.deprovision(&BETA).unwrap();
    assert!(store.module_status(&BETA).unwrap().disabled);
}

#[test]
fn deprovision_without_markers_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());
    store.deprovision(&ALPHA).unwrap();
}

#[test]
fn file_content_helpers_roundtrip_through_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = NvStore::new(dir.path());

    assert!(store
        .write_file(&ALPHA, StorageKind::TempFile, "nonce=1")
        .is_err());
    store.create(&ALPHA, StorageKind::TempFile).unwrap();
    store
        .write_file(&ALPHA, StorageKind::TempFile, "nonce=1")
        .unwrap();
    assert_eq!(
        store.read_file(&ALPHA, StorageKind::TempFile).unwrap(),
        "nonce=1"
    );
}
