//! Occupancy monitor: per-zone person counts against capacity limits.
//!
//! Pure per-cycle computation over the static zone list; only zones that
//! carry a polygon participate.

use crate::alerts::Alert;
use crate::config::{Anchor, GateConfig};
use crate::detection::Track;
use crate::geometry::point_in_polygon;

#[derive(Debug, Clone)]
struct PolygonZone {
    zone_id: String,
    polygon: Vec<[f32; 2]>,
    max_occupancy: u32,
}

#[derive(Debug, Clone)]
pub struct OccupancyMonitor {
    zones: Vec<PolygonZone>,
    anchor: Anchor,
}

impl OccupancyMonitor {
    pub fn from_config(config: &GateConfig) -> Self {
        let zones = config
            .zones
            .iter()
            .filter_map(|z| {
                z.polygon.as_ref().map(|polygon| PolygonZone {
                    zone_id: z.zone_id.clone(),
                    polygon: polygon.clone(),
                    max_occupancy: z.max_occupancy,
                })
            })
            .collect();
        Self {
            zones,
            anchor: config.occupancy_anchor,
        }
    }

    /// Count persons per polygon zone and report any zone over capacity.
    pub fn check_overcrowding(&self, tracks: &[Track]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for zone in &self.zones {
            let count = tracks
                .iter()
                .filter(|t| t.kind().is_person())
                .filter(|t| {
                    let point = match self.anchor {
                        Anchor::Centroid => t.bbox().center(),
                        Anchor::BottomCenter => t.bbox().bottom_center(),
                    };
                    point_in_polygon(point, &zone.polygon)
                })
                .count() as u32;
            if count > zone.max_occupancy {
                alerts.push(Alert::Overcrowding {
                    zone_id: zone.zone_id.clone(),
                    count,
                    max_occupancy: zone.max_occupancy,
                });
            }
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::detection::{BBox, Detection, DetectionKind, PpeKind};

    fn person_at(id: u64, x: f32, y: f32) -> Track {
        Track {
            id,
            detection: Detection {
                kind: DetectionKind::Person,
                confidence: 0.9,
                bbox: BBox::new(x - 10.0, y - 10.0, x + 10.0, y + 10.0),
            },
        }
    }

    fn monitor(max_occupancy: u32) -> OccupancyMonitor {
        let mut cfg = GateConfig::default();
        cfg.zones.push(ZoneConfig {
            zone_id: "pit".to_string(),
            required_ppe: [PpeKind::Helmet].into_iter().collect(),
            polygon: Some(vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]]),
            max_occupancy,
        });
        OccupancyMonitor::from_config(&cfg)
    }

    #[test]
    fn test_at_capacity_raises_nothing() {
        let m = monitor(2);
        let tracks = vec![person_at(1, 20.0, 20.0), person_at(2, 60.0, 60.0)];
        assert!(m.check_overcrowding(&tracks).is_empty());
    }

    #[test]
    fn test_over_capacity_alerts() {
        let m = monitor(2);
        let tracks = vec![
            person_at(1, 20.0, 20.0),
            person_at(2, 60.0, 60.0),
            person_at(3, 40.0, 80.0),
        ];
        let alerts = m.check_overcrowding(&tracks);
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            Alert::Overcrowding {
                zone_id: "pit".to_string(),
                count: 3,
                max_occupancy: 2,
            }
        );
    }

    #[test]
    fn test_outside_polygon_not_counted() {
        let m = monitor(0);
        let tracks = vec![person_at(1, 500.0, 500.0)];
        assert!(m.check_overcrowding(&tracks).is_empty());
    }

    #[test]
    fn test_zone_without_polygon_ignored() {
        // Only the default zone (no polygon) is configured.
        let m = OccupancyMonitor::from_config(&GateConfig::default());
        let tracks = vec![person_at(1, 20.0, 20.0)];
        assert!(m.check_overcrowding(&tracks).is_empty());
    }

    #[test]
    fn test_non_person_tracks_not_counted() {
        let m = monitor(0);
        let vest = Track {
            id: 5,
            detection: Detection {
                kind: DetectionKind::Vest,
                confidence: 0.8,
                bbox: BBox::new(40.0, 40.0, 60.0, 60.0),
            },
        };
        assert!(m.check_overcrowding(&[vest]).is_empty());
    }
}
