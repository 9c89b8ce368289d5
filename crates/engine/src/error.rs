// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type, folding the collaborator errors into the caller
//! taxonomy.

use sentra_adapters::AdapterError;
use sentra_core::{ControllerError, ErrorCode};
use sentra_storage::StoreError;
use thiserror::Error;

/// Errors produced while driving tasks.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("scanner session error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("lock error: {0}")]
    Lock(std::io::Error),
}

impl EngineError {
    /// The machine code surfaced to clients.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Controller(e) => e.code(),
            EngineError::Store(StoreError::NotFound { .. }) => ErrorCode::NotFound,
            EngineError::Store(StoreError::Conflict(_)) => ErrorCode::Conflict,
            EngineError::Store(StoreError::Invariant(_)) => ErrorCode::InternalInvariant,
            EngineError::Adapter(AdapterError::Unreachable(_)) => ErrorCode::ScannerUnreachable,
            EngineError::Adapter(_) => ErrorCode::ScannerProtocol,
            EngineError::Lock(_) => ErrorCode::InternalInvariant,
        }
    }

    /// Whether this failure should interrupt the affected scan.
    pub fn interrupts_scan(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ScannerUnreachable | ErrorCode::ScannerProtocol | ErrorCode::InternalInvariant
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
