// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn codes_are_stable() {
    assert_eq!(
        ControllerError::not_found("task", "t1").code().as_str(),
        "NOT_FOUND"
    );
    assert_eq!(ControllerError::FeedBusy.code().as_str(), "FEED_BUSY");
    assert_eq!(
        ControllerError::ResumeNotSupported.code().as_str(),
        "RESUMING_NOT_SUPPORTED"
    );
}

#[test]
fn conflict_keeps_its_message() {
    let err = ControllerError::conflict("task is already active");
    assert_eq!(err.to_string(), "task is already active");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[test]
fn invariant_hides_detail_from_display() {
    let err = ControllerError::invariant("status pair (Done, Admit)");
    assert_eq!(err.to_string(), "internal error");
    assert_eq!(err.code(), ErrorCode::InternalInvariant);
}

#[test]
fn permission_denied_names_the_permission() {
    let err = ControllerError::PermissionDenied(crate::acl::Permission::StartTask);
    assert_eq!(err.to_string(), "permission denied: start_task");
}
