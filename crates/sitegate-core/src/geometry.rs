//! Box and polygon helpers used by the rule engine and the occupancy monitor.
//!
//! All functions are total: degenerate input (zero-area boxes, polygons with
//! fewer than three vertices) returns 0 or false rather than an error, so a
//! garbage box from the detector can never take down an evaluation cycle.

use crate::detection::BBox;

/// Fraction of `inner`'s area that lies within `outer`, in [0, 1].
/// Returns 0.0 when `inner` has no area.
pub fn overlap_ratio(outer: &BBox, inner: &BBox) -> f32 {
    let inner_area = inner.area();
    if inner_area <= 0.0 {
        return 0.0;
    }
    let ix = (outer.x2.min(inner.x2) - outer.x1.max(inner.x1)).max(0.0);
    let iy = (outer.y2.min(inner.y2) - outer.y1.max(inner.y1)).max(0.0);
    (ix * iy / inner_area).clamp(0.0, 1.0)
}

/// True iff `inner` is mostly inside `outer`, where "mostly" means the
/// containment ratio meets `threshold`.
pub fn contains(outer: &BBox, inner: &BBox, threshold: f32) -> bool {
    overlap_ratio(outer, inner) >= threshold
}

/// Intersection-over-union of two boxes, in [0, 1]. Kept for perception glue
/// and calibration tooling; the gating core itself only uses containment.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    (intersection / union).clamp(0.0, 1.0)
}

/// Ray-cast point-in-polygon test. Polygons with fewer than three vertices
/// contain nothing.
pub fn point_in_polygon(point: (f32, f32), polygon: &[[f32; 2]]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let (px, py) = point;
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_ratio_full_containment() {
        let outer = BBox::new(0.0, 0.0, 100.0, 200.0);
        let inner = BBox::new(10.0, 10.0, 30.0, 30.0);
        assert_eq!(overlap_ratio(&outer, &inner), 1.0);
    }

    #[test]
    fn test_overlap_ratio_half_containment() {
        let outer = BBox::new(0.0, 0.0, 10.0, 10.0);
        let inner = BBox::new(5.0, 0.0, 15.0, 10.0);
        let r = overlap_ratio(&outer, &inner);
        assert!((r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_ratio_zero_area_inner() {
        let outer = BBox::new(0.0, 0.0, 10.0, 10.0);
        let inner = BBox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(overlap_ratio(&outer, &inner), 0.0);
        assert!(!contains(&outer, &inner, 0.1));
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(overlap_ratio(&a, &b), 0.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_polygon_square() {
        let square = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert!(point_in_polygon((5.0, 5.0), &square));
        assert!(!point_in_polygon((15.0, 5.0), &square));
    }

    #[test]
    fn test_point_in_polygon_concave() {
        // L-shape; the notch at the top-right is outside.
        let shape = [
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 5.0],
            [5.0, 5.0],
            [5.0, 10.0],
            [0.0, 10.0],
        ];
        assert!(point_in_polygon((2.0, 8.0), &shape));
        assert!(!point_in_polygon((8.0, 8.0), &shape));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        assert!(!point_in_polygon((0.0, 0.0), &[]));
        assert!(!point_in_polygon((0.0, 0.0), &[[0.0, 0.0], [1.0, 1.0]]));
    }
}
