//! Per-cycle evaluation engine: one strictly sequential pass per frame.
//!
//! acquire frame -> perception -> zone/behavior/occupancy evaluation ->
//! enforce per gated machine -> done. A missing frame or a perception error
//! short-circuits into a fail-safe sweep that blocks every machine with the
//! zone's full required set. N independent zones are supported, each with
//! its own gatekeeper and ports; within a cycle they are enforced one after
//! another, so no two `enforce` calls ever run concurrently.

use crate::behavior::BehaviorMonitor;
use crate::config::GateConfig;
use crate::detection::GateAction;
use crate::gatekeeper::Gatekeeper;
use crate::occupancy::OccupancyMonitor;
use crate::ports::{Perception, VideoSource};
use crate::zones::ZoneRules;
use std::sync::Arc;
use tracing::{info, warn};

/// One gated machine: the zone whose compliance controls it, plus its
/// gatekeeper (and through it, its actuator and indicator ports).
pub struct MachineGate {
    zone_id: String,
    keeper: Gatekeeper,
}

impl MachineGate {
    pub fn new(zone_id: impl Into<String>, keeper: Gatekeeper) -> Self {
        Self {
            zone_id: zone_id.into(),
            keeper,
        }
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }
}

pub struct Supervisor {
    video: Box<dyn VideoSource>,
    perception: Arc<dyn Perception>,
    rules: ZoneRules,
    behavior: BehaviorMonitor,
    occupancy: OccupancyMonitor,
    gates: Vec<MachineGate>,
}

impl Supervisor {
    pub fn new(
        config: &GateConfig,
        video: Box<dyn VideoSource>,
        perception: Arc<dyn Perception>,
        gates: Vec<MachineGate>,
    ) -> Self {
        Self {
            video,
            perception,
            rules: ZoneRules::from_config(config),
            behavior: BehaviorMonitor::from_config(config),
            occupancy: OccupancyMonitor::from_config(config),
            gates,
        }
    }

    /// Startup state: every machine disabled and every indicator on block
    /// before the first cycle runs. No audit record: no decision was made.
    pub async fn block_all(&self) {
        for gate in &self.gates {
            gate.keeper.release().await;
        }
    }

    /// One evaluation cycle. Returns the action taken per gated zone.
    pub async fn run_cycle(&mut self) -> Vec<(String, GateAction)> {
        let Some(frame) = self.video.read().await else {
            warn!("no frame from video source; blocking all machines");
            return self.fail_safe_sweep().await;
        };

        let detections = match self.perception.predict(&frame).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!(error = %e, "perception failed; blocking all machines");
                return self.fail_safe_sweep().await;
            }
        };

        for (track_id, alerts) in self.behavior.update(&detections) {
            for alert in alerts {
                warn!(track_id, %alert, "behavior alert");
            }
        }
        for alert in self.occupancy.check_overcrowding(&detections.tracks) {
            warn!(%alert, "occupancy alert");
        }

        let mut actions = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            let verdict = self.rules.verdict(&detections.tracks, &gate.zone_id);
            let action = gate
                .keeper
                .enforce(&gate.zone_id, verdict.is_compliant, &verdict.missing)
                .await;
            actions.push((gate.zone_id.clone(), action));
        }
        actions
    }

    /// The fail-safe path for a cycle with no usable perception result:
    /// every gate is enforced non-compliant with its zone's full required
    /// set, producing the usual BLOCK decision and audit record.
    async fn fail_safe_sweep(&self) -> Vec<(String, GateAction)> {
        let mut actions = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            let required = self.rules.required_for(&gate.zone_id);
            let action = gate.keeper.enforce(&gate.zone_id, false, &required).await;
            actions.push((gate.zone_id.clone(), action));
        }
        actions
    }

    /// Shutdown sequence: final best-effort disable + block indication per
    /// machine. Run on cancellation before the process exits.
    pub async fn shutdown(&self) {
        info!("shutting down; releasing all machine gates");
        for gate in &self.gates {
            gate.keeper.release().await;
        }
    }
}
