// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture builders shared by this crate's tests and downstream crates.

use crate::acl::{Principal, UserId};
use crate::credential::{Credential, CredentialId, CredentialKind, Secret};
use crate::scan_config::{ScanConfig, ScanConfigId, VtSelection};
use crate::scanner::{Scanner, ScannerId, ScannerKind};
use crate::schedule::{Schedule, ScheduleId};
use crate::target::{Target, TargetId};
use crate::task::{Task, TaskId};

/// The fixture user every builder defaults to.
pub fn alice() -> Principal {
    Principal::new("user-alice", "alice")
}

/// A second user for permission tests.
pub fn bob() -> Principal {
    Principal::new("user-bob", "bob")
}

pub fn task(id: &str, scanner: &str) -> Task {
    let mut t = Task::new(id, format!("task {id}"), alice().user);
    t.scanner = ScannerId::new(scanner);
    t
}

pub fn task_for(id: &str, scanner: &str, owner: &UserId) -> Task {
    let mut t = Task::new(id, format!("task {id}"), owner.clone());
    t.scanner = ScannerId::new(scanner);
    t
}

pub fn target(id: &str, hosts: &str) -> Target {
    Target::new(id, format!("target {id}"), alice().user, hosts)
}

pub fn scanner(id: &str, kind: ScannerKind) -> Scanner {
    Scanner::new(id, format!("scanner {id}"), kind, "scanner.example", 9390)
}

pub fn cve_scanner(id: &str) -> Scanner {
    let mut s = scanner(id, ScannerKind::Cve);
    s.host = String::new();
    s.port = 0;
    s
}

pub fn password_credential(id: &str) -> Credential {
    Credential {
        id: CredentialId::new(id),
        name: format!("credential {id}"),
        owner: alice().user,
        kind: CredentialKind::UsernamePassword {
            username: "scanuser".to_string(),
            password: Secret::new("hunter2"),
        },
    }
}

pub fn scan_config(id: &str, oids: &[&str]) -> ScanConfig {
    let mut c = ScanConfig::new(id, format!("config {id}"), alice().user);
    c.vts = oids.iter().map(|o| VtSelection::new(*o)).collect();
    c
}

pub fn daily_schedule(id: &str, start: &str) -> Schedule {
    Schedule::new(
        id,
        format!("schedule {id}"),
        alice().user,
        format!("DTSTART:{start}\nRRULE:FREQ=DAILY"),
        "UTC",
    )
}

pub fn once_schedule(id: &str, start: &str) -> Schedule {
    Schedule::new(
        id,
        format!("schedule {id}"),
        alice().user,
        format!("DTSTART:{start}"),
        "UTC",
    )
}

/// Shorthand for ids in assertions.
pub fn tid(id: &str) -> TaskId {
    TaskId::new(id)
}

pub fn sid(id: &str) -> ScheduleId {
    ScheduleId::new(id)
}

pub fn cid(id: &str) -> ScanConfigId {
    ScanConfigId::new(id)
}

pub fn tgid(id: &str) -> TargetId {
    TargetId::new(id)
}
