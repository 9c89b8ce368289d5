// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler's authenticated self-connection.
//!
//! Scheduled actions run as the schedule owner through the same entry
//! points a client session uses, so permission checks apply unchanged.
//! The original reached this by forking a child that connected back over
//! the management protocol; a loopback session over the shared engine
//! keeps the semantics without the extra process.

use crate::controller::DaemonEngine;
use async_trait::async_trait;
use sentra_engine::{AuthedSession, ClientConnector, EngineError};
use sentra_core::{Principal, TaskId};
use std::sync::Arc;

pub struct LoopbackConnector {
    engine: Arc<DaemonEngine>,
}

impl LoopbackConnector {
    pub fn new(engine: Arc<DaemonEngine>) -> Self {
        Self { engine }
    }
}

struct LoopbackSession {
    engine: Arc<DaemonEngine>,
    principal: Principal,
}

#[async_trait]
impl AuthedSession for LoopbackSession {
    async fn start_task(&mut self, task: &TaskId) -> Result<(), EngineError> {
        self.engine.start_task(&self.principal, task).await.map(|_| ())
    }

    async fn stop_task(&mut self, task: &TaskId) -> Result<(), EngineError> {
        self.engine.stop_task(&self.principal, task).await.map(|_| ())
    }
}

#[async_trait]
impl ClientConnector for LoopbackConnector {
    async fn connect(&self, owner: &Principal) -> Result<Box<dyn AuthedSession>, EngineError> {
        tracing::debug!(owner = %owner, "opening loopback session");
        Ok(Box::new(LoopbackSession {
            engine: Arc::clone(&self.engine),
            principal: owner.clone(),
        }))
    }
}

#[cfg(test)]
#[path = "self_connect_tests.rs"]
mod tests;
