//! Rayon-parallel decoding (feature-gated).
//!
//! Cells are independent, so the scan is split across the rayon pool. Rayon's
//! indexed collect preserves cell order, giving output identical to the
//! sequential decoder.

use crate::decode::{decode_cell, DecodeParams};
use crate::detection::Detection;
use crate::labels::LabelTable;
use crate::tensor::RawOutputTensors;
use rayon::prelude::*;

/// Parallel counterpart of the sequential cell scan.
pub(crate) fn decode_par(
    tensors: &RawOutputTensors,
    labels: &LabelTable,
    params: &DecodeParams,
) -> Vec<Detection> {
    let boxes = tensors.boxes();
    let scores = tensors.scores();
    (0..tensors.layout().cells)
        .into_par_iter()
        .filter_map(|cell| decode_cell(cell, boxes, scores, labels, params))
        .collect()
}
