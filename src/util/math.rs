//! Scalar helpers shared by the decoder and the IoU computation.

/// Returns the index and value of the largest strictly positive entry.
///
/// The running maximum starts at zero and is only replaced by a strictly
/// greater value, so ties resolve to the lowest index and a row with no
/// positive score yields `None`.
pub(crate) fn argmax_positive(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    let mut max = 0.0f32;
    for (idx, &value) in values.iter().enumerate() {
        if value > max {
            max = value;
            best = Some((idx, value));
        }
    }
    best
}

/// Overlap length of two 1-D intervals given by center and width.
///
/// Negative when the intervals are disjoint.
pub(crate) fn overlap_1d(c1: f32, w1: f32, c2: f32, w2: f32) -> f32 {
    let left = (c1 - w1 / 2.0).max(c2 - w2 / 2.0);
    let right = (c1 + w1 / 2.0).min(c2 + w2 / 2.0);
    right - left
}

/// Checks that a threshold is finite and within [0, 1].
pub(crate) fn is_unit_interval(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
