//! Actuator and indicator backends, selected once from configuration.
//!
//! The `"log"` backend is the shipped bring-up tier: it holds the gate state
//! in memory and traces every transition, so the whole loop can be exercised
//! end to end before wire-level drivers (networked industrial-control
//! writes, direct pin control) are plugged in. Real drivers implement the
//! same two ports and register a backend name here.

use async_trait::async_trait;
use sitegate_core::ports::{Actuator, HardwareError, Indicator};
use sitegate_core::{ConfigError, MachineConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub fn actuator_for(machine: &MachineConfig) -> Result<Arc<dyn Actuator>, ConfigError> {
    match machine.backend.as_str() {
        "log" => Ok(Arc::new(LogActuator::new(&machine.zone_id))),
        other => Err(ConfigError::Invalid {
            field: "machines.backend".to_string(),
            message: format!("unknown actuator backend {other:?}"),
        }),
    }
}

pub fn indicator_for(machine: &MachineConfig) -> Arc<dyn Indicator> {
    Arc::new(LogIndicator::new(&machine.zone_id))
}

/// In-memory power gate; traces enable/disable edges only.
pub struct LogActuator {
    zone_id: String,
    enabled: AtomicBool,
}

impl LogActuator {
    fn new(zone_id: &str) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            enabled: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Actuator for LogActuator {
    async fn enable(&self) -> Result<(), HardwareError> {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            info!(zone_id = %self.zone_id, "actuator: machine ENABLED");
        }
        Ok(())
    }

    async fn disable(&self) -> Result<(), HardwareError> {
        if self.enabled.swap(false, Ordering::SeqCst) {
            info!(zone_id = %self.zone_id, "actuator: machine DISABLED");
        }
        Ok(())
    }
}

/// Stack-light stand-in; traces state edges only.
pub struct LogIndicator {
    zone_id: String,
    allow: AtomicBool,
}

impl LogIndicator {
    fn new(zone_id: &str) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            allow: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Indicator for LogIndicator {
    async fn set_allow(&self) {
        if !self.allow.swap(true, Ordering::SeqCst) {
            info!(zone_id = %self.zone_id, "indicator: GREEN");
        }
    }

    async fn set_block(&self) {
        if self.allow.swap(false, Ordering::SeqCst) {
            info!(zone_id = %self.zone_id, "indicator: RED");
        }
    }

    async fn off(&self) {
        self.allow.store(false, Ordering::SeqCst);
        info!(zone_id = %self.zone_id, "indicator: off");
    }
}
