// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller identity and permission names.
//!
//! The authentication layer itself is an external collaborator; the core
//! only needs an explicit principal on every access-checked operation.
//! There is deliberately no ambient "current user" anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a user account.
    pub struct UserId;
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user: UserId,
    pub name: String,
}

impl Principal {
    pub fn new(user: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.user.short(8))
    }
}

/// Named permissions checked by the task execution core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    GetTasks,
    StartTask,
    StopTask,
    ResumeTask,
    ModifyTask,
    DeleteTask,
}

impl Permission {
    /// The permission's wire name, as granted by the ACL layer.
    pub fn name(&self) -> &'static str {
        match self {
            Permission::GetTasks => "get_tasks",
            Permission::StartTask => "start_task",
            Permission::StopTask => "stop_task",
            Permission::ResumeTask => "resume_task",
            Permission::ModifyTask => "modify_task",
            Permission::DeleteTask => "delete_task",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "acl_tests.rs"]
mod tests;
