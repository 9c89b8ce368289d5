// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The controller: the engine plus its production collaborators and the
//! main tick loop.

use crate::feed::{CommandFeedSyncers, ProcMemoryProbe, TimestampFeedProbe};
use crate::importer::PostProcessImporter;
use crate::lifecycle::Config;
use crate::self_connect::LoopbackConnector;
use sentra_adapters::NetworkBroker;
use sentra_core::{Event, SystemClock};
use sentra_engine::{manage_sync, Engine, EngineDeps, FeedSyncDeps, ReportImporter};
use sentra_storage::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Engine with the daemon's concrete collaborator types.
pub type DaemonEngine = Engine<NetworkBroker, SystemClock>;

/// Interval of the controller's main tick.
const TICK_INTERVAL: Duration = Duration::from_secs(10);

/// The running controller.
pub struct Controller {
    config: Config,
    engine: Arc<DaemonEngine>,
    connector: Arc<LoopbackConnector>,
    importer: Arc<dyn ReportImporter>,
    feed_deps: FeedSyncDeps,
    event_rx: mpsc::Receiver<Event>,
}

impl Controller {
    /// Assemble the controller.
    ///
    /// The relational store is an external collaborator; until one is
    /// attached this runs on the in-memory reference store, which is also
    /// what the scenario suite drives.
    pub fn new(config: Config) -> Self {
        let store = MemoryStore::new();
        let broker = NetworkBroker::new(
            config.controller.scanner_connection_retry,
            config.controller.relay_mapper_path.clone(),
        );
        let (event_tx, event_rx) = mpsc::channel(1024);

        let engine = Arc::new(Engine::new(EngineDeps {
            store: Arc::new(store.clone()),
            opener: Arc::new(store),
            broker: Arc::new(broker),
            clock: SystemClock,
            config: config.controller.clone(),
            event_tx,
            vt_refresh_scanner: None,
        }));

        let connector = Arc::new(LoopbackConnector::new(Arc::clone(&engine)));
        let feed_deps = FeedSyncDeps {
            status: Arc::new(TimestampFeedProbe::new(config.feed_dir.clone())),
            syncers: Arc::new(CommandFeedSyncers::new(config.feed_dir.clone(), None)),
            memory: Arc::new(ProcMemoryProbe),
        };

        Self {
            config,
            engine,
            connector,
            importer: Arc::new(PostProcessImporter),
            feed_deps,
            event_rx,
        }
    }

    pub fn engine(&self) -> &Arc<DaemonEngine> {
        &self.engine
    }

    /// One pass of the main loop.
    ///
    /// Errors are logged and swallowed so the loop survives; every
    /// subsystem owns its own terminal bookkeeping.
    pub async fn tick(&mut self) {
        // Drain engine events into the log first.
        while let Ok(event) = self.event_rx.try_recv() {
            debug!(event = %event.log_summary(), "engine event");
        }

        for (task, report, exit) in self.engine.reap_workers().await {
            debug!(task = %task, report = %report, code = exit.code(), "worker reaped");
        }

        match self.engine.schedule_tick(self.connector.clone()).await {
            Ok(summary) => {
                if summary.starts + summary.stops + summary.failures > 0 {
                    info!(?summary, "schedule tick");
                }
            }
            Err(e) => error!(error = %e, "schedule tick failed"),
        }

        if let Err(e) = self.engine.handle_scan_queue().await {
            error!(error = %e, "scan queue tick failed");
        }

        if let Err(e) = self
            .engine
            .process_report_imports(Arc::clone(&self.importer), &self.config.report_locks_dir)
            .await
        {
            error!(error = %e, "report import tick failed");
        }

        let engine_config = self.engine.config();
        match manage_sync(&engine_config, &self.feed_deps, true).await {
            Ok(outcome) => debug!(?outcome, "feed sync pass"),
            Err(e) => error!(error = %e, "feed sync pass failed"),
        }
    }

    /// Run until interrupted.
    pub async fn run(mut self) {
        info!(state_dir = %self.config.state_dir.display(), "controller running");
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, shutting down");
                    break;
                }
            }
        }
        self.engine.abort_workers();
    }
}
