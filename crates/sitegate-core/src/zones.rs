//! Zone rule engine: per-zone required-PPE sets and compliance evaluation.
//!
//! Presence of a PPE item on a person is decided purely geometrically: the
//! item's box must be mostly contained in the person's box, under the single
//! canonical containment threshold. An item contained in several person
//! boxes credits each of them; there is no exclusive assignment.

use crate::config::GateConfig;
use crate::detection::{ComplianceResult, PpeKind, Track};
use crate::geometry::contains;
use std::collections::{BTreeSet, HashMap};

/// Reserved fallback entry; lookups for unconfigured zones resolve here.
pub const DEFAULT_ZONE: &str = "default";

/// Immutable per-zone PPE requirements, built once from validated config.
#[derive(Debug, Clone)]
pub struct ZoneRules {
    rules: HashMap<String, BTreeSet<PpeKind>>,
    containment_threshold: f32,
}

impl ZoneRules {
    pub fn from_config(config: &GateConfig) -> Self {
        let rules = config
            .zones
            .iter()
            .map(|z| (z.zone_id.clone(), z.required_ppe.clone()))
            .collect();
        Self {
            rules,
            containment_threshold: config.containment_threshold,
        }
    }

    /// The zone's required set, or the `"default"` set for unknown zones.
    /// Config validation guarantees the default entry exists.
    pub fn required_for(&self, zone_id: &str) -> BTreeSet<PpeKind> {
        self.rules
            .get(zone_id)
            .or_else(|| self.rules.get(DEFAULT_ZONE))
            .cloned()
            .unwrap_or_default()
    }

    /// Evaluate one frame against a zone's requirements, one result per
    /// detected person. PPE kinds worn by nobody in frame count for nobody.
    pub fn evaluate(&self, tracks: &[Track], zone_id: &str) -> Vec<ComplianceResult> {
        let required = self.required_for(zone_id);
        let persons: Vec<&Track> = tracks.iter().filter(|t| t.kind().is_person()).collect();
        let items: Vec<(&Track, PpeKind)> = tracks
            .iter()
            .filter_map(|t| t.kind().as_ppe().map(|kind| (t, kind)))
            .collect();

        persons
            .iter()
            .map(|person| {
                let present: BTreeSet<PpeKind> = items
                    .iter()
                    .filter(|(item, _)| {
                        contains(&person.bbox(), &item.bbox(), self.containment_threshold)
                    })
                    .map(|(_, kind)| *kind)
                    .collect();
                let missing: BTreeSet<PpeKind> =
                    required.difference(&present).copied().collect();
                ComplianceResult {
                    zone_id: zone_id.to_string(),
                    is_compliant: missing.is_empty(),
                    missing,
                }
            })
            .collect()
    }

    /// Zone-level verdict feeding the gatekeeper. No person in frame is not
    /// "safe to run unattended": the zone is non-compliant with the full
    /// required set missing. Otherwise the zone is compliant iff every
    /// person is, and `missing` is the union across persons.
    pub fn verdict(&self, tracks: &[Track], zone_id: &str) -> ComplianceResult {
        let per_person = self.evaluate(tracks, zone_id);
        if per_person.is_empty() {
            return ComplianceResult {
                zone_id: zone_id.to_string(),
                is_compliant: false,
                missing: self.required_for(zone_id),
            };
        }
        let mut missing = BTreeSet::new();
        for result in &per_person {
            missing.extend(result.missing.iter().copied());
        }
        ComplianceResult {
            zone_id: zone_id.to_string(),
            is_compliant: missing.is_empty(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::detection::{BBox, Detection, DetectionKind};

    fn track(id: u64, kind: DetectionKind, bbox: BBox) -> Track {
        Track {
            id,
            detection: Detection {
                kind,
                confidence: 0.9,
                bbox,
            },
        }
    }

    fn rules() -> ZoneRules {
        ZoneRules::from_config(&GateConfig::default())
    }

    fn rules_with_hazard() -> ZoneRules {
        let mut cfg = GateConfig::default();
        cfg.zones.push(ZoneConfig {
            zone_id: "hazard".to_string(),
            required_ppe: [PpeKind::Helmet, PpeKind::Vest, PpeKind::Gloves]
                .into_iter()
                .collect(),
            polygon: None,
            max_occupancy: 2,
        });
        ZoneRules::from_config(&cfg)
    }

    // Person box with helmet/vest boxes fully inside it.
    fn person_box() -> BBox {
        BBox::new(100.0, 50.0, 200.0, 350.0)
    }

    fn helmet_box() -> BBox {
        BBox::new(130.0, 55.0, 170.0, 95.0)
    }

    fn vest_box() -> BBox {
        BBox::new(110.0, 140.0, 190.0, 240.0)
    }

    #[test]
    fn test_default_zone_requirements() {
        let required = rules().required_for(DEFAULT_ZONE);
        assert_eq!(
            required,
            [PpeKind::Helmet, PpeKind::Vest].into_iter().collect()
        );
    }

    #[test]
    fn test_unknown_zone_falls_back_to_default() {
        let required = rules().required_for("loading_dock");
        assert_eq!(required, rules().required_for(DEFAULT_ZONE));
    }

    #[test]
    fn test_fully_equipped_person_is_compliant() {
        let tracks = vec![
            track(1, DetectionKind::Person, person_box()),
            track(2, DetectionKind::Helmet, helmet_box()),
            track(3, DetectionKind::Vest, vest_box()),
        ];
        let results = rules().evaluate(&tracks, DEFAULT_ZONE);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_compliant);
        assert!(results[0].missing.is_empty());
    }

    #[test]
    fn test_missing_helmet_detected() {
        let tracks = vec![
            track(1, DetectionKind::Person, person_box()),
            track(3, DetectionKind::Vest, vest_box()),
        ];
        let results = rules().evaluate(&tracks, DEFAULT_ZONE);
        assert!(!results[0].is_compliant);
        assert_eq!(results[0].missing, [PpeKind::Helmet].into_iter().collect());
    }

    #[test]
    fn test_bare_person_missing_everything() {
        let tracks = vec![track(1, DetectionKind::Person, person_box())];
        let results = rules().evaluate(&tracks, DEFAULT_ZONE);
        assert_eq!(
            results[0].missing,
            [PpeKind::Helmet, PpeKind::Vest].into_iter().collect()
        );
    }

    #[test]
    fn test_ppe_outside_person_box_does_not_count() {
        // Helmet lying on the floor, nowhere near the person.
        let tracks = vec![
            track(1, DetectionKind::Person, person_box()),
            track(2, DetectionKind::Helmet, BBox::new(400.0, 300.0, 440.0, 340.0)),
            track(3, DetectionKind::Vest, vest_box()),
        ];
        let results = rules().evaluate(&tracks, DEFAULT_ZONE);
        assert_eq!(results[0].missing, [PpeKind::Helmet].into_iter().collect());
    }

    #[test]
    fn test_custom_zone_requires_gloves() {
        let tracks = vec![
            track(1, DetectionKind::Person, person_box()),
            track(2, DetectionKind::Helmet, helmet_box()),
            track(3, DetectionKind::Vest, vest_box()),
        ];
        let results = rules_with_hazard().evaluate(&tracks, "hazard");
        assert!(!results[0].is_compliant);
        assert_eq!(results[0].missing, [PpeKind::Gloves].into_iter().collect());
    }

    #[test]
    fn test_item_in_overlapping_persons_credits_both() {
        // Two person boxes sharing the area where one vest sits.
        let tracks = vec![
            track(1, DetectionKind::Person, BBox::new(0.0, 0.0, 120.0, 300.0)),
            track(2, DetectionKind::Person, BBox::new(60.0, 0.0, 180.0, 300.0)),
            track(3, DetectionKind::Vest, BBox::new(70.0, 100.0, 110.0, 200.0)),
            track(4, DetectionKind::Helmet, BBox::new(80.0, 10.0, 100.0, 40.0)),
        ];
        let results = rules().evaluate(&tracks, DEFAULT_ZONE);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_compliant));
    }

    #[test]
    fn test_verdict_empty_zone_blocks_with_full_set() {
        let verdict = rules().verdict(&[], DEFAULT_ZONE);
        assert!(!verdict.is_compliant);
        assert_eq!(
            verdict.missing,
            [PpeKind::Helmet, PpeKind::Vest].into_iter().collect()
        );
    }

    #[test]
    fn test_verdict_unions_missing_across_persons() {
        // One compliant person, one bare person: zone blocks with the union.
        let tracks = vec![
            track(1, DetectionKind::Person, person_box()),
            track(2, DetectionKind::Helmet, helmet_box()),
            track(3, DetectionKind::Vest, vest_box()),
            track(4, DetectionKind::Person, BBox::new(400.0, 50.0, 500.0, 350.0)),
        ];
        let verdict = rules().verdict(&tracks, DEFAULT_ZONE);
        assert!(!verdict.is_compliant);
        assert_eq!(
            verdict.missing,
            [PpeKind::Helmet, PpeKind::Vest].into_iter().collect()
        );
    }
}
