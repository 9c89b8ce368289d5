// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sentrad: the Sentra controller daemon.

use sentra_daemon::lifecycle::PidLock;
use sentra_daemon::{Config, Controller};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config, foreground: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sentra_engine=debug"));
    if foreground {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }
    let file = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or(&config.state_dir),
        config
            .log_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sentrad.log".into()),
    );
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() {
    let foreground = std::env::args().any(|a| a == "--foreground" || a == "-f");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sentrad: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_tracing(&config, foreground);

    let lock = match PidLock::acquire(&config) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("sentrad: {e}");
            std::process::exit(1);
        }
    };

    Controller::new(config).run().await;
    lock.shutdown();
}
