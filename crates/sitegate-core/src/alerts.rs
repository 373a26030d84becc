//! Alert types shared by the secondary monitors.
//!
//! Alerts are advisory: they go to diagnostics and operator feedback, not to
//! the gate. Only the compliance verdict moves the actuator.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// A tracked person moved faster than the configured speed threshold.
    Running { track_id: u64, speed: f32 },
    /// More people inside a zone polygon than its capacity allows.
    Overcrowding {
        zone_id: String,
        count: u32,
        max_occupancy: u32,
    },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Running { track_id, speed } => {
                write!(f, "Running: track {track_id} at {speed:.1} px/s")
            }
            Alert::Overcrowding {
                zone_id,
                count,
                max_occupancy,
            } => write!(
                f,
                "Overcrowding in {zone_id}: {count} > {max_occupancy}"
            ),
        }
    }
}
