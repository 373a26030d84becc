//! Behavior monitor: per-track speed estimation from bounded position
//! history.
//!
//! Holds the only cross-cycle state in the evaluation path, and keeps it
//! bounded two ways: each track's window caps at two seconds of samples, and
//! identities absent from the current frame are dropped on every update.

use crate::alerts::Alert;
use crate::config::GateConfig;
use crate::detection::DetectionFrame;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Speed computation spans the newest sample and the one this many positions
/// back, once the window holds more than this many samples.
const SPEED_SPAN: usize = 5;

#[derive(Debug, Clone)]
pub struct BehaviorMonitor {
    /// track id -> (cx, cy, unix seconds), newest at the back.
    history: HashMap<u64, VecDeque<(f32, f32, f64)>>,
    /// Window capacity: 2x the nominal frame rate.
    window: usize,
    /// Running-alert threshold, px/sec.
    speed_threshold: f32,
}

impl BehaviorMonitor {
    pub fn new(fps: u32, speed_threshold: f32) -> Self {
        Self {
            history: HashMap::new(),
            window: (fps as usize).max(1) * 2,
            speed_threshold,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.fps, config.speed_threshold)
    }

    /// Append the current frame's person positions and report any tracks
    /// moving faster than the threshold. Non-person tracks are ignored.
    pub fn update(&mut self, frame: &DetectionFrame) -> BTreeMap<u64, Vec<Alert>> {
        let current: HashSet<u64> = frame
            .tracks
            .iter()
            .filter(|t| t.kind().is_person())
            .map(|t| t.id)
            .collect();
        // Stale-identity GC: anything not seen this cycle is gone.
        self.history.retain(|id, _| current.contains(id));

        let mut alerts: BTreeMap<u64, Vec<Alert>> = BTreeMap::new();
        for track in frame.tracks.iter().filter(|t| t.kind().is_person()) {
            let (cx, cy) = track.bbox().center();
            let window = self.window;
            let samples = self
                .history
                .entry(track.id)
                .or_insert_with(|| VecDeque::with_capacity(window));
            if samples.len() == window {
                samples.pop_front();
            }
            samples.push_back((cx, cy, frame.ts));

            if samples.len() <= SPEED_SPAN {
                continue;
            }
            let newest = samples[samples.len() - 1];
            let past = samples[samples.len() - 1 - SPEED_SPAN];
            let dt = newest.2 - past.2;
            // Out-of-order or duplicate timestamps read as stationary.
            let speed = if dt > 0.0 {
                let dx = newest.0 - past.0;
                let dy = newest.1 - past.1;
                (dx * dx + dy * dy).sqrt() / dt as f32
            } else {
                0.0
            };
            if speed > self.speed_threshold {
                alerts.entry(track.id).or_default().push(Alert::Running {
                    track_id: track.id,
                    speed,
                });
            }
        }
        alerts
    }

    /// Number of identities currently held. Diagnostics only.
    pub fn tracked(&self) -> usize {
        self.history.len()
    }
}
