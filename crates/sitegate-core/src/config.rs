//! Gating configuration loaded from file and environment.
//!
//! Everything the engine needs is resolved here once, at startup: zone PPE
//! requirements, monitor thresholds, actuator backend selection, and the
//! audit store location. The resulting object is immutable for the run; an
//! invalid configuration aborts initialization so the process never leaves
//! the implicit BLOCK default.

use crate::detection::PpeKind;
use crate::zones::DEFAULT_ZONE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

fn default_zones() -> Vec<ZoneConfig> {
    vec![ZoneConfig {
        zone_id: DEFAULT_ZONE.to_string(),
        required_ppe: [PpeKind::Helmet, PpeKind::Vest].into_iter().collect(),
        polygon: None,
        max_occupancy: default_max_occupancy(),
    }]
}

fn default_machines() -> Vec<MachineConfig> {
    vec![MachineConfig {
        zone_id: DEFAULT_ZONE.to_string(),
        backend: default_backend(),
    }]
}

fn default_backend() -> String {
    "log".to_string()
}

fn default_max_occupancy() -> u32 {
    5
}

fn default_containment_threshold() -> f32 {
    0.5
}

fn default_speed_threshold() -> f32 {
    // 5 px/frame at the nominal 30 fps.
    150.0
}

fn default_fps() -> u32 {
    30
}

fn default_actuator_deadline_ms() -> u64 {
    500
}

fn default_frame_deadline_ms() -> u64 {
    1000
}

fn default_tick_ms() -> u64 {
    200
}

fn default_db_path() -> String {
    "./data/sitegate_events.db".to_string()
}

/// Configuration errors abort startup; there is no degraded-config mode.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config load failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Where a person track is anchored for the point-in-polygon occupancy test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Centroid,
    /// Ground-contact point; better for floor-plane polygons.
    BottomCenter,
}

/// One named physical area: its PPE requirements, optional occupancy polygon
/// (pixel coordinates), and capacity limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub zone_id: String,
    pub required_ppe: BTreeSet<PpeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<[f32; 2]>>,
    #[serde(default = "default_max_occupancy")]
    pub max_occupancy: u32,
}

/// One gated machine: the zone whose compliance controls it and the actuator
/// backend driving it. Backend selection is resolved once here; `"log"` is
/// the shipped bring-up backend, wire-level drivers register their own names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    pub zone_id: String,
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Canonical containment ratio for associating a PPE box with a person
    /// box. One threshold, one use; in (0, 1].
    #[serde(default = "default_containment_threshold")]
    pub containment_threshold: f32,
    /// Running-alert threshold in px/sec.
    #[serde(default = "default_speed_threshold")]
    pub speed_threshold: f32,
    /// Nominal camera frame rate; sizes the behavior history window.
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub occupancy_anchor: Anchor,
    /// Upper bound on any single actuator/indicator device call.
    #[serde(default = "default_actuator_deadline_ms")]
    pub actuator_deadline_ms: u64,
    /// How long a cycle waits for a frame before declaring the feed down
    /// (which blocks every machine for that cycle).
    #[serde(default = "default_frame_deadline_ms")]
    pub frame_deadline_ms: u64,
    #[serde(default = "default_db_path")]
    pub audit_db_path: String,
    /// Evaluation cycle period for the polling loop.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
    #[serde(default = "default_machines")]
    pub machines: Vec<MachineConfig>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            containment_threshold: default_containment_threshold(),
            speed_threshold: default_speed_threshold(),
            fps: default_fps(),
            occupancy_anchor: Anchor::default(),
            actuator_deadline_ms: default_actuator_deadline_ms(),
            frame_deadline_ms: default_frame_deadline_ms(),
            audit_db_path: default_db_path(),
            tick_ms: default_tick_ms(),
            zones: default_zones(),
            machines: default_machines(),
        }
    }
}

impl GateConfig {
    /// Load from file and environment, then validate.
    /// Precedence: env `SITEGATE_CONFIG` path > `config/sitegate.toml` > defaults,
    /// with `SITEGATE__*` environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("SITEGATE_CONFIG").unwrap_or_else(|_| "config/sitegate".to_string());

        let builder = config::Config::builder();
        let path = Path::new(&config_path);
        let builder = if path.exists() || Path::new(&format!("{config_path}.toml")).exists() {
            builder.add_source(config::File::with_name(&config_path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("SITEGATE").separator("__"))
            .build()?;

        let cfg: Self = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject anything the engine cannot run safely with. Called by `load`;
    /// exposed for configs constructed in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(invalid("zones", "at least one zone must be configured"));
        }
        if !self.zones.iter().any(|z| z.zone_id == DEFAULT_ZONE) {
            return Err(invalid(
                "zones",
                "a reserved \"default\" zone entry is required",
            ));
        }
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.zone_id.trim().is_empty() {
                return Err(invalid("zones.zone_id", "zone id must not be empty"));
            }
            if !seen.insert(zone.zone_id.as_str()) {
                return Err(invalid(
                    "zones.zone_id",
                    &format!("duplicate zone id {:?}", zone.zone_id),
                ));
            }
            if let Some(polygon) = &zone.polygon {
                if polygon.len() < 3 {
                    return Err(invalid(
                        "zones.polygon",
                        &format!("zone {:?} polygon needs at least 3 points", zone.zone_id),
                    ));
                }
            }
        }
        if !(self.containment_threshold > 0.0 && self.containment_threshold <= 1.0) {
            return Err(invalid(
                "containment_threshold",
                "must be within (0, 1]",
            ));
        }
        if !self.speed_threshold.is_finite() || self.speed_threshold <= 0.0 {
            return Err(invalid("speed_threshold", "must be a positive number"));
        }
        if self.fps == 0 {
            return Err(invalid("fps", "must be at least 1"));
        }
        if self.actuator_deadline_ms == 0 {
            return Err(invalid("actuator_deadline_ms", "must be at least 1"));
        }
        if self.frame_deadline_ms == 0 {
            return Err(invalid("frame_deadline_ms", "must be at least 1"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be at least 1"));
        }
        if self.machines.is_empty() {
            return Err(invalid("machines", "at least one gated machine is required"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
