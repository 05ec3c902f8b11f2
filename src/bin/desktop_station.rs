//! Desktop turnout station.
//!
//! Runs the turnout registry with file persistence and the REST API, without
//! track or OpenLCB hardware: refresh requests and produced events are
//! logged instead of transmitted.
//!
//! ```text
//! cargo run --features desktop --bin desktop_station -- [data-dir]
//! ```

use std::sync::Arc;

use anyhow::Context;
use flexi_logger::{FlexiLoggerError, LogSpecBuilder, Logger, LoggerHandle};
use log::{error, info, LevelFilter};

use rs_turnouts::config::{Config, TurnoutConfig};
use rs_turnouts::hal::FileStorage;
use rs_turnouts::services::{run_server, WebServerConfig};
use rs_turnouts::{EventId, EventSink, PacketScheduler, PersistenceTask, TurnoutRegistry};

/// Logs events instead of sending them to an OpenLCB stack.
struct LogEventSink;

impl EventSink for LogEventSink {
    fn send_event(&self, event: EventId) {
        info!("[OpenLCB] Produce event {}", event);
    }
}

/// Logs refresh requests instead of queueing packets for the track.
struct LogScheduler;

impl PacketScheduler for LogScheduler {
    fn notify_update(&self, address: u16, code: u32) {
        info!("[Track] Refresh requested for turnout {} (code {})", address, code);
    }
}

fn start_logger() -> Result<LoggerHandle, FlexiLoggerError> {
    let mut log_spec_builder = LogSpecBuilder::new();
    let _ = log_spec_builder
        .default(LevelFilter::Info)
        .module("rs_turnouts", LevelFilter::Debug);
    Logger::with(log_spec_builder.finalize()).log_to_stderr().start()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", err);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = start_logger().context("Failed to start logger")?;

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let config = Config::default()
        .with_turnouts(TurnoutConfig::default().with_create_on_demand(true));

    info!("Turnout station starting, data in '{}'", data_dir);
    let registry = Arc::new(TurnoutRegistry::load(
        config.turnouts.clone(),
        FileStorage::new(&data_dir),
        LogEventSink,
        LogScheduler,
    ));

    let persistence =
        PersistenceTask::spawn(Arc::clone(&registry), config.turnouts.persistence_interval());

    let served = if config.web.enabled {
        run_server(
            Arc::clone(&registry),
            WebServerConfig::from_config(&config.web),
            shutdown_signal(),
        )
        .await
    } else {
        shutdown_signal().await;
        Ok(())
    };

    info!("Shutting down, flushing turnouts");
    persistence.stop().await;
    info!("Stopped with {} turnout(s)", registry.count());

    served.context("Web server failed")
}
