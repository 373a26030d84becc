//! Capability ports the gating core depends on.
//!
//! Concrete backends live outside the core: wire-level actuator drivers
//! (networked industrial-control writes, direct pin control), stack-light
//! hardware, the camera pipeline, and the detector/tracker stack. The core
//! only sees these trait objects, selected once at construction time by
//! configuration, never probed at call time.

use crate::detection::{DetectionFrame, GateAction, PpeKind};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Errors from actuator backends. A timeout imposed by the caller's deadline
/// is reported through the same type so every failure mode converges on the
/// BLOCK outcome.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("device not connected")]
    NotConnected,

    #[error("device write failed: {0}")]
    Write(String),

    #[error("device call exceeded deadline of {0} ms")]
    Timeout(u64),
}

/// Errors from the perception collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PerceptionError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("malformed detection payload: {0}")]
    Decode(String),
}

/// Errors from the audit trail. Never propagated back into gating control
/// flow; the gatekeeper demotes them to diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit write failed: {0}")]
    Write(String),
}

/// Machine power gate. `enable` may only ever be called on a confirmed
/// compliant path; `disable` must be safe to call at any time, repeatedly.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn enable(&self) -> Result<(), HardwareError>;
    async fn disable(&self) -> Result<(), HardwareError>;
}

/// Stack light / buzzer feedback. Best-effort by contract: implementations
/// swallow their own device errors and must never raise into the caller.
#[async_trait]
pub trait Indicator: Send + Sync {
    async fn set_allow(&self);
    async fn set_block(&self);
    async fn off(&self);
}

/// Raw frame handed from the video source to perception. The core never
/// inspects the payload; it only carries the capture timestamp forward.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture time, unix seconds.
    pub captured_at: f64,
    pub payload: Vec<u8>,
}

/// Camera feed. `None` means no frame is available (stream down, EOF); the
/// caller must treat it as cause for the fail-safe path, never as something
/// to silently retry without bound.
#[async_trait]
pub trait VideoSource: Send {
    async fn read(&mut self) -> Option<Frame>;
}

/// Detector + tracker stack. A failed inference is an error, and the caller
/// must resolve it to BLOCK for the cycle.
#[async_trait]
pub trait Perception: Send + Sync {
    async fn predict(&self, frame: &Frame) -> Result<DetectionFrame, PerceptionError>;
}

/// Append-only decision trail. One record per gatekeeper decision; the
/// schema carries no identity, face, or imagery fields.
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        zone_id: &str,
        missing: &BTreeSet<PpeKind>,
        action: GateAction,
    ) -> Result<(), AuditError>;
}
