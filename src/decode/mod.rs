//! Decoding raw head output into candidate detections.
//!
//! Each cell takes the arg-max over its class scores (lowest index wins ties)
//! and is kept when that score is strictly above the confidence threshold. The
//! center-form box is converted to corners and clamped to the image. Cells with
//! non-finite geometry are skipped.

use crate::detection::Detection;
use crate::geometry::CenterBox;
use crate::labels::LabelTable;
use crate::tensor::{BoxTensor, RawOutputTensors, ScoreTensor};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{argmax_positive, is_unit_interval};
use crate::util::{DetPostError, DetPostResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Default confidence threshold for candidate selection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Parameters for a single decode call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    /// Scores must be strictly greater than this to produce a candidate.
    pub confidence_threshold: f32,
    /// Image width used to clamp `right` to `width - 1`.
    pub image_width: usize,
    /// Image height used to clamp `bottom` to `height - 1`.
    pub image_height: usize,
    /// Decode cells in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl DecodeParams {
    /// Parameters with the default threshold for an image of the given size.
    pub fn for_image(image_width: usize, image_height: usize) -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            image_width,
            image_height,
            parallel: false,
        }
    }

    fn validate(&self) -> DetPostResult<()> {
        if !is_unit_interval(self.confidence_threshold) {
            return Err(DetPostError::InvalidThreshold {
                name: "confidence",
                value: self.confidence_threshold,
            });
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(DetPostError::InvalidDimensions {
                width: self.image_width,
                height: self.image_height,
            });
        }
        Ok(())
    }
}

/// Decodes `tensors` into candidates ordered by cell index.
///
/// Returns `ClassCountMismatch` when the score tensor's class dimension differs
/// from the label table.
pub fn decode(
    tensors: &RawOutputTensors,
    labels: &LabelTable,
    params: &DecodeParams,
) -> DetPostResult<Vec<Detection>> {
    let layout = tensors.layout();
    let _span = trace_span!("decode", cells = layout.cells, classes = layout.classes).entered();

    params.validate()?;
    if layout.classes != labels.len() {
        return Err(DetPostError::ClassCountMismatch {
            expected: labels.len(),
            got: layout.classes,
        });
    }

    #[cfg(feature = "rayon")]
    let candidates = if params.parallel {
        self::rayon::decode_par(tensors, labels, params)
    } else {
        decode_seq(tensors, labels, params)
    };
    #[cfg(not(feature = "rayon"))]
    let candidates = decode_seq(tensors, labels, params);

    trace_event!("decode_candidates", count = candidates.len());
    Ok(candidates)
}

fn decode_seq(
    tensors: &RawOutputTensors,
    labels: &LabelTable,
    params: &DecodeParams,
) -> Vec<Detection> {
    let boxes = tensors.boxes();
    let scores = tensors.scores();
    (0..tensors.layout().cells)
        .filter_map(|cell| decode_cell(cell, boxes, scores, labels, params))
        .collect()
}

/// Decodes one cell, or `None` when it does not clear the threshold.
pub(crate) fn decode_cell(
    cell: usize,
    boxes: BoxTensor<'_>,
    scores: ScoreTensor<'_>,
    labels: &LabelTable,
    params: &DecodeParams,
) -> Option<Detection> {
    let (class_index, score) = argmax_positive(scores.row(cell)?)?;
    if score <= params.confidence_threshold {
        return None;
    }
    // Clamping would turn NaN edges into image borders.
    let center = CenterBox::from_row(boxes.row(cell)?);
    if !center.is_finite() {
        return None;
    }
    let bbox = center
        .to_corners()
        .clamp_to(params.image_width, params.image_height);
    let label = labels.get(class_index)?;
    Some(Detection::new(
        cell.to_string(),
        label,
        score,
        bbox,
        class_index,
    ))
}
