//! sitegate-core: safety gating decision engine (zone PPE rules, fail-safe
//! gatekeeper, behavior/occupancy monitors, capability ports).
//!
//! The core carries no I/O backends: cameras, detectors,
//! actuator drivers, and the audit store reach it only through the traits in
//! [`ports`]. Default state is BLOCK; a machine is enabled exactly when a
//! compliant person is positively confirmed in its zone and the enable write
//! succeeded.

mod alerts;
mod behavior;
mod config;
mod detection;
mod gatekeeper;
mod occupancy;
mod supervisor;
mod zones;

pub mod geometry;
pub mod ports;

pub use alerts::Alert;
pub use behavior::BehaviorMonitor;
pub use config::{Anchor, ConfigError, GateConfig, MachineConfig, ZoneConfig};
pub use detection::{
    BBox, ComplianceResult, Detection, DetectionFrame, DetectionKind, GateAction, PpeKind, Track,
};
pub use gatekeeper::Gatekeeper;
pub use occupancy::OccupancyMonitor;
pub use supervisor::{MachineGate, Supervisor};
pub use zones::{ZoneRules, DEFAULT_ZONE};
