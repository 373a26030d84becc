//! Shared detection data model: PPE kinds, tracked boxes, per-frame payloads.
//!
//! Everything here is produced by the external perception collaborator
//! (detector + multi-object tracker) and lives for exactly one evaluation
//! cycle. Track identities are carried as plain numbers; tracker lifecycle
//! and re-identification stay outside the core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A category of protective equipment a zone can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpeKind {
    Helmet,
    Vest,
    Gloves,
    Goggles,
    Boots,
}

impl PpeKind {
    /// Lowercase token used in config files and audit rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            PpeKind::Helmet => "helmet",
            PpeKind::Vest => "vest",
            PpeKind::Gloves => "gloves",
            PpeKind::Goggles => "goggles",
            PpeKind::Boots => "boots",
        }
    }
}

impl fmt::Display for PpeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label attached to a detection box.
///
/// Labels the model emits that the engine does not know map to `Other`
/// instead of failing deserialization; an unknown label can never satisfy a
/// PPE requirement, so the degradation fails toward BLOCK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    Person,
    Helmet,
    Vest,
    Gloves,
    Goggles,
    Boots,
    #[serde(other)]
    Other,
}

impl DetectionKind {
    pub fn is_person(self) -> bool {
        matches!(self, DetectionKind::Person)
    }

    /// The PPE category this label represents, if any.
    pub fn as_ppe(self) -> Option<PpeKind> {
        match self {
            DetectionKind::Helmet => Some(PpeKind::Helmet),
            DetectionKind::Vest => Some(PpeKind::Vest),
            DetectionKind::Gloves => Some(PpeKind::Gloves),
            DetectionKind::Goggles => Some(PpeKind::Goggles),
            DetectionKind::Boots => Some(PpeKind::Boots),
            DetectionKind::Person | DetectionKind::Other => None,
        }
    }
}

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Area, clamped to 0 for inverted/degenerate boxes.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Ground-contact reference point (useful for floor-plane polygons).
    pub fn bottom_center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, self.y2)
    }
}

/// One labeled box from the detector. Immutable; scoped to a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub kind: DetectionKind,
    /// Model confidence in [0, 1].
    pub confidence: f32,
    pub bbox: BBox,
}

/// A detection plus the stable identity assigned by the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    #[serde(flatten)]
    pub detection: Detection,
}

impl Track {
    pub fn kind(&self) -> DetectionKind {
        self.detection.kind
    }

    pub fn bbox(&self) -> BBox {
        self.detection.bbox
    }
}

/// Tracked detections for one frame, as handed over by perception.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Capture time, unix seconds.
    pub ts: f64,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Per-cycle compliance outcome for a zone or a single person in it.
/// Recomputed every cycle; never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub zone_id: String,
    pub is_compliant: bool,
    pub missing: BTreeSet<PpeKind>,
}

/// The engine's only possible output per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateAction {
    Allow,
    Block,
}

impl GateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateAction::Allow => "ALLOW",
            GateAction::Block => "BLOCK",
        }
    }
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
