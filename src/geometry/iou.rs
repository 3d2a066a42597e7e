//! Intersection-over-Union for corner-form boxes.
//!
//! Intersection is computed per axis from center/width intervals, matching the
//! detection head's native parameterization. A degenerate union (zero area)
//! yields an IoU of 0 rather than NaN.

use crate::geometry::BoundingBox;
use crate::util::math::overlap_1d;

/// Overlap area of two boxes, zero when they are disjoint on either axis.
pub fn box_intersection(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let (acx, acy) = a.center();
    let (bcx, bcy) = b.center();
    let w = overlap_1d(acx, a.width(), bcx, b.width());
    let h = overlap_1d(acy, a.height(), bcy, b.height());
    if w < 0.0 || h < 0.0 {
        return 0.0;
    }
    w * h
}

/// Combined area of two boxes.
pub fn box_union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.width() * a.height() + b.width() * b.height() - box_intersection(a, b)
}

/// Intersection over union in `[0, 1]`.
pub fn box_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let union = box_union(a, b);
    if union <= 0.0 {
        return 0.0;
    }
    let iou = box_intersection(a, b) / union;
    if iou.is_finite() {
        iou
    } else {
        0.0
    }
}
