//! Per-class greedy non-maximum suppression.
//!
//! Candidates are bucketed by class index. Each bucket is stably sorted by
//! descending confidence, so equal confidences keep their decode order, and is
//! scanned once: a candidate survives when its IoU with every box already kept
//! for that class is below the threshold. This is the same selection as
//! repeatedly taking the most confident remaining box and discarding everything
//! overlapping it by `>= nms_threshold`.

use crate::detection::Detection;
use crate::geometry::box_iou;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::is_unit_interval;
use crate::util::{DetPostError, DetPostResult};

/// Default IoU threshold for suppression.
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.6;

/// Applies greedy NMS independently to each class in `0..class_count`.
///
/// The output lists classes in ascending index order and, within a class, boxes
/// in selection order (most confident first). Boxes of different classes never
/// suppress each other.
pub fn nms_per_class(
    candidates: &[Detection],
    class_count: usize,
    nms_threshold: f32,
) -> DetPostResult<Vec<Detection>> {
    let _span = trace_span!("suppress", candidates = candidates.len()).entered();

    if !is_unit_interval(nms_threshold) {
        return Err(DetPostError::InvalidThreshold {
            name: "nms",
            value: nms_threshold,
        });
    }

    let mut buckets: Vec<Vec<&Detection>> = vec![Vec::new(); class_count];
    for det in candidates {
        let bucket =
            buckets
                .get_mut(det.class_index())
                .ok_or(DetPostError::ClassIndexOutOfRange {
                    index: det.class_index(),
                    len: class_count,
                })?;
        bucket.push(det);
    }

    let mut out = Vec::new();
    for (class_index, mut bucket) in buckets.into_iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let before = bucket.len();
        sort_by_confidence_desc(&mut bucket);
        let kept = suppress_sorted(&bucket, nms_threshold);
        trace_debug!(
            "suppress_class",
            class_index = class_index,
            candidates = before,
            kept = kept.len()
        );
        out.extend(kept.into_iter().cloned());
    }

    trace_event!("suppress_kept", count = out.len());
    Ok(out)
}

/// Stable sort by descending confidence.
fn sort_by_confidence_desc(dets: &mut [&Detection]) {
    dets.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));
}

/// Greedy scan over boxes already sorted most-confident first.
fn suppress_sorted<'a>(sorted: &[&'a Detection], nms_threshold: f32) -> Vec<&'a Detection> {
    let mut kept: Vec<&Detection> = Vec::new();

    'outer: for &det in sorted {
        let bbox = det.bbox();
        for kept_det in kept.iter() {
            if box_iou(&kept_det.bbox(), &bbox) >= nms_threshold {
                continue 'outer;
            }
        }
        kept.push(det);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::nms_per_class;
    use crate::detection::Detection;
    use crate::geometry::BoundingBox;
    use crate::util::DetPostError;

    fn det(id: &str, class_index: usize, confidence: f32, bbox: BoundingBox) -> Detection {
        Detection::new(id, format!("class{class_index}"), confidence, bbox, class_index)
    }

    #[test]
    fn equal_confidence_keeps_decode_order() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let out = nms_per_class(&[det("first", 0, 0.8, a), det("second", 0, 0.8, a)], 1, 0.5)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), "first");
    }

    #[test]
    fn iou_equal_to_threshold_is_suppressed() {
        // IoU = 50 / 150 = 1/3.
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        let cands = [det("a", 0, 0.9, a), det("b", 0, 0.8, b)];
        assert_eq!(nms_per_class(&cands, 1, 1.0 / 3.0).unwrap().len(), 1);
        assert_eq!(nms_per_class(&cands, 1, 0.34).unwrap().len(), 2);
    }

    #[test]
    fn out_of_range_class_is_rejected() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let err = nms_per_class(&[det("a", 3, 0.9, a)], 2, 0.6).err().unwrap();
        assert_eq!(err, DetPostError::ClassIndexOutOfRange { index: 3, len: 2 });
    }

    #[test]
    fn threshold_above_one_is_rejected() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let err = nms_per_class(&[det("a", 0, 0.9, a)], 1, 1.2).err().unwrap();
        assert_eq!(
            err,
            DetPostError::InvalidThreshold {
                name: "nms",
                value: 1.2
            }
        );
    }

    #[test]
    fn kept_boxes_are_ordered_by_confidence_within_class() {
        let cands = [
            det("low", 0, 0.6, BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            det("high", 0, 0.9, BoundingBox::new(100.0, 100.0, 110.0, 110.0)),
        ];
        let out = nms_per_class(&cands, 1, 0.6).unwrap();
        let ids: Vec<_> = out.iter().map(Detection::id).collect();
        assert_eq!(ids, ["high", "low"]);
    }
}
