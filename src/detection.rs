//! Labeled detection records.

use crate::geometry::{BoundingBox, FrameTransform};

/// One labeled box produced by the decoder.
///
/// Fields are read-only; suppression selects a subset of detections and frame
/// mapping builds new ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    id: String,
    class_label: String,
    confidence: f32,
    bbox: BoundingBox,
    class_index: usize,
}

impl Detection {
    pub fn new(
        id: impl Into<String>,
        class_label: impl Into<String>,
        confidence: f32,
        bbox: BoundingBox,
        class_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            class_label: class_label.into(),
            confidence,
            bbox,
            class_index,
        }
    }

    /// Source identifier, the decimal cell index for decoded detections.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Returns a copy with the box mapped through `transform`.
    pub fn mapped(&self, transform: &FrameTransform) -> Self {
        Self {
            bbox: transform.map_box(&self.bbox),
            ..self.clone()
        }
    }
}

/// Keeps detections with `confidence >= min_confidence`.
pub fn retain_confident(detections: Vec<Detection>, min_confidence: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= min_confidence)
        .collect()
}
