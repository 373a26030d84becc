//! The fail-safe gating state machine.
//!
//! Two outcomes, recomputed fresh every cycle from a single compliance
//! verdict. No hidden carry-over: replaying an input always yields the same
//! action. Every failure mode inside `enforce` (enable error, device
//! timeout, audit write failure) converges on BLOCK; the only silent
//! suppression allowed anywhere is the best-effort disable on an error path.

use crate::detection::{GateAction, PpeKind};
use crate::ports::{Actuator, AuditSink, HardwareError, Indicator};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, warn};

pub struct Gatekeeper {
    actuator: Arc<dyn Actuator>,
    indicator: Arc<dyn Indicator>,
    audit: Arc<dyn AuditSink>,
    /// Upper bound on any single device call; a hung device must not stall
    /// the control loop.
    deadline: Duration,
}

impl Gatekeeper {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        indicator: Arc<dyn Indicator>,
        audit: Arc<dyn AuditSink>,
        deadline: Duration,
    ) -> Self {
        Self {
            actuator,
            indicator,
            audit,
            deadline,
        }
    }

    /// Convert one compliance verdict into an actuator + indicator command
    /// and exactly one audit record. `enable()` is invoked only on the
    /// compliant path; every other path, including every failure, returns
    /// BLOCK with the machine disabled.
    pub async fn enforce(
        &self,
        zone_id: &str,
        is_compliant: bool,
        missing: &BTreeSet<PpeKind>,
    ) -> GateAction {
        if is_compliant {
            match self.enable_within_deadline().await {
                Ok(()) => {
                    self.bounded(self.indicator.set_allow()).await;
                    self.write_audit(zone_id, &BTreeSet::new(), GateAction::Allow);
                    debug!(zone_id, "compliant; machine enabled");
                    GateAction::Allow
                }
                Err(e) => {
                    warn!(zone_id, error = %e, "enable failed; forcing BLOCK");
                    self.block(zone_id, missing).await
                }
            }
        } else {
            self.block(zone_id, missing).await
        }
    }

    /// Shutdown step: best-effort disable plus a block indication, run once
    /// before releasing resources. Also correct as the very first command
    /// after startup, before any cycle has evaluated.
    pub async fn release(&self) {
        self.disable_best_effort().await;
        self.bounded(self.indicator.set_block()).await;
    }

    async fn block(&self, zone_id: &str, missing: &BTreeSet<PpeKind>) -> GateAction {
        self.disable_best_effort().await;
        self.bounded(self.indicator.set_block()).await;
        self.write_audit(zone_id, missing, GateAction::Block);
        debug!(zone_id, ?missing, "machine blocked");
        GateAction::Block
    }

    async fn enable_within_deadline(&self) -> Result<(), HardwareError> {
        match timeout(self.deadline, self.actuator.enable()).await {
            Ok(result) => result,
            Err(_) => Err(HardwareError::Timeout(self.deadline.as_millis() as u64)),
        }
    }

    /// The one documented suppression point: disable on an error path keeps
    /// going whatever the device says.
    async fn disable_best_effort(&self) {
        match timeout(self.deadline, self.actuator.disable()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "best-effort disable failed"),
            Err(_) => warn!(deadline_ms = self.deadline.as_millis() as u64, "best-effort disable timed out"),
        }
    }

    /// Bound an indicator call by the device deadline; the indicator port is
    /// best-effort by contract, so a timeout is only noted.
    async fn bounded<F: Future<Output = ()>>(&self, call: F) {
        if timeout(self.deadline, call).await.is_err() {
            warn!("indicator call timed out");
        }
    }

    /// A logging failure is reported to diagnostics and nothing else; it
    /// never changes the returned action.
    fn write_audit(&self, zone_id: &str, missing: &BTreeSet<PpeKind>, action: GateAction) {
        if let Err(e) = self.audit.record(zone_id, missing, action) {
            error!(zone_id, action = action.as_str(), error = %e, "audit write failed");
        }
    }
}
