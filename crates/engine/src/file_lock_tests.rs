// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquire_writes_pid_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.lock");
    let lock = FileLock::acquire(&path).unwrap();
    let stamp = FileLock::read_stamp(&path).unwrap().unwrap();
    assert!(stamp.starts_with(&std::process::id().to_string()));
    lock.release().unwrap();
}

#[test]
fn release_truncates_the_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.lock");
    let lock = FileLock::acquire(&path).unwrap();
    assert!(FileLock::read_stamp(&path).unwrap().is_some());
    lock.release().unwrap();
    // Observers tell "free" from the empty file.
    assert_eq!(FileLock::read_stamp(&path).unwrap(), None);
}

#[test]
fn contention_is_a_normal_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.lock");
    let held = FileLock::acquire(&path).unwrap();
    assert!(FileLock::try_acquire(&path).unwrap().is_none());
    held.release().unwrap();
    assert!(FileLock::try_acquire(&path).unwrap().is_some());
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/feed.lock");
    let lock = FileLock::acquire(&path).unwrap();
    assert_eq!(lock.path(), path);
    lock.release().unwrap();
}

#[test]
fn stamp_of_absent_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        FileLock::read_stamp(&dir.path().join("never-created")).unwrap(),
        None
    );
}
