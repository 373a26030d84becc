//! Sitegate daemon: the safety gating control loop.
//!
//! Default system state is BLOCK. Every tick runs one strictly sequential
//! evaluation cycle (frame -> perception -> zone/behavior/occupancy ->
//! enforce per machine); any initialization failure aborts before a single
//! enable is possible, and shutdown always runs the final disable sweep.

mod backends;
mod feed;

use feed::{JsonPerception, StdinFeed};
use sitegate_core::{GateConfig, Gatekeeper, MachineGate, Supervisor};
use sitegate_store::AuditLog;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[sitegate-daemon] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GateConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration; refusing to start (machines stay blocked)");
            std::process::exit(1);
        }
    };

    let audit = match AuditLog::open(config.audit_db_path.clone()) {
        Ok(audit) => Arc::new(audit),
        Err(e) => {
            tracing::error!(error = %e, db = %config.audit_db_path, "audit store unavailable; refusing to start");
            std::process::exit(1);
        }
    };

    let deadline = Duration::from_millis(config.actuator_deadline_ms);
    let mut gates = Vec::with_capacity(config.machines.len());
    for machine in &config.machines {
        let actuator = match backends::actuator_for(machine) {
            Ok(actuator) => actuator,
            Err(e) => {
                tracing::error!(error = %e, zone_id = %machine.zone_id, "actuator backend init failed; refusing to start");
                std::process::exit(1);
            }
        };
        let indicator = backends::indicator_for(machine);
        gates.push(MachineGate::new(
            machine.zone_id.clone(),
            Gatekeeper::new(actuator, indicator, audit.clone(), deadline),
        ));
    }

    let video = Box::new(StdinFeed::new(Duration::from_millis(config.frame_deadline_ms)));
    let mut supervisor = Supervisor::new(&config, video, Arc::new(JsonPerception), gates);

    // Hold everything blocked until the first cycle has positively evaluated.
    supervisor.block_all().await;

    tracing::info!(
        machines = config.machines.len(),
        tick_ms = config.tick_ms,
        audit_db = %config.audit_db_path,
        "sitegate daemon started"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                for (zone_id, action) in supervisor.run_cycle().await {
                    tracing::debug!(zone_id = %zone_id, action = action.as_str(), "cycle decision");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down daemon");
                break;
            }
        }
    }

    // Cancellation path: disable every machine before releasing anything.
    supervisor.shutdown().await;
}
