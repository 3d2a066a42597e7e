//! Raw output tensors of the detection head.
//!
//! The engine returns two dense row-major `f32` buffers per image: boxes of
//! shape `(cells, 4)` holding `(cx, cy, w, h)` and scores of shape
//! `(cells, classes)`. [`RawOutputTensors`] owns both buffers and checks their
//! lengths against an [`OutputLayout`] on construction.

use crate::util::{DetPostError, DetPostResult};

/// Number of values per box row.
pub const BOX_DIM: usize = 4;

/// Cell count of a YOLOv4 head at 416x416 input (3 scales x 3 anchors).
pub const YOLOV4_416_CELLS: usize = 10647;

/// Shape of the detection head output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    /// Number of prediction cells (N).
    pub cells: usize,
    /// Number of classes per cell (C).
    pub classes: usize,
}

impl OutputLayout {
    pub fn new(cells: usize, classes: usize) -> Self {
        Self { cells, classes }
    }

    /// Expected length of the flattened box buffer.
    pub fn box_len(&self) -> DetPostResult<usize> {
        self.cells
            .checked_mul(BOX_DIM)
            .ok_or(DetPostError::InvalidInput("box tensor size overflows"))
    }

    /// Expected length of the flattened score buffer.
    pub fn score_len(&self) -> DetPostResult<usize> {
        self.cells
            .checked_mul(self.classes)
            .ok_or(DetPostError::InvalidInput("score tensor size overflows"))
    }
}

/// Owned box and score buffers for one inference.
#[derive(Clone, Debug, PartialEq)]
pub struct RawOutputTensors {
    layout: OutputLayout,
    boxes: Vec<f32>,
    scores: Vec<f32>,
}

impl RawOutputTensors {
    /// Wraps flattened buffers, checking both lengths against `layout`.
    pub fn new(layout: OutputLayout, boxes: Vec<f32>, scores: Vec<f32>) -> DetPostResult<Self> {
        if layout.classes == 0 {
            return Err(DetPostError::InvalidInput("score tensor has no classes"));
        }
        let box_len = layout.box_len()?;
        if boxes.len() != box_len {
            return Err(DetPostError::TensorShape {
                tensor: "box",
                expected: box_len,
                got: boxes.len(),
            });
        }
        let score_len = layout.score_len()?;
        if scores.len() != score_len {
            return Err(DetPostError::TensorShape {
                tensor: "score",
                expected: score_len,
                got: scores.len(),
            });
        }
        Ok(Self {
            layout,
            boxes,
            scores,
        })
    }

    /// Builds tensors from per-cell rows, inferring the class count from the
    /// first score row.
    ///
    /// All score rows must have the same length. With no rows there is nothing
    /// to infer from; use [`RawOutputTensors::from_rows_with_classes`].
    pub fn from_rows(boxes: &[[f32; BOX_DIM]], scores: &[Vec<f32>]) -> DetPostResult<Self> {
        let classes = scores.first().map(Vec::len).ok_or(DetPostError::InvalidInput(
            "no cells to infer the class count from",
        ))?;
        Self::from_rows_with_classes(boxes, scores, classes)
    }

    /// Builds tensors from per-cell rows with a known class count.
    ///
    /// Zero rows yield an empty `(0, classes)` tensor.
    pub fn from_rows_with_classes(
        boxes: &[[f32; BOX_DIM]],
        scores: &[Vec<f32>],
        classes: usize,
    ) -> DetPostResult<Self> {
        if boxes.len() != scores.len() {
            return Err(DetPostError::TensorShape {
                tensor: "score",
                expected: boxes.len(),
                got: scores.len(),
            });
        }
        let layout = OutputLayout::new(boxes.len(), classes);
        if let Some(row) = scores.iter().find(|row| row.len() != classes) {
            return Err(DetPostError::TensorShape {
                tensor: "score row",
                expected: classes,
                got: row.len(),
            });
        }
        let flat_boxes = boxes.iter().flatten().copied().collect();
        let flat_scores = scores.iter().flatten().copied().collect();
        Self::new(layout, flat_boxes, flat_scores)
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Borrowed view over the box buffer.
    pub fn boxes(&self) -> BoxTensor<'_> {
        BoxTensor { data: &self.boxes }
    }

    /// Borrowed view over the score buffer.
    pub fn scores(&self) -> ScoreTensor<'_> {
        ScoreTensor {
            data: &self.scores,
            classes: self.layout.classes,
        }
    }
}

/// Row access into a `(cells, 4)` box buffer.
#[derive(Clone, Copy, Debug)]
pub struct BoxTensor<'a> {
    data: &'a [f32],
}

impl<'a> BoxTensor<'a> {
    /// Number of box rows.
    pub fn cells(&self) -> usize {
        self.data.len() / BOX_DIM
    }

    /// Returns `[cx, cy, w, h]` for `cell`.
    pub fn row(&self, cell: usize) -> Option<&'a [f32; BOX_DIM]> {
        let start = cell.checked_mul(BOX_DIM)?;
        let end = start.checked_add(BOX_DIM)?;
        self.data.get(start..end)?.try_into().ok()
    }
}

/// Row access into a `(cells, classes)` score buffer.
#[derive(Clone, Copy, Debug)]
pub struct ScoreTensor<'a> {
    data: &'a [f32],
    classes: usize,
}

impl<'a> ScoreTensor<'a> {
    /// Class dimension (C).
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Number of score rows.
    pub fn cells(&self) -> usize {
        self.data.len().checked_div(self.classes).unwrap_or(0)
    }

    /// Returns the class scores for `cell`.
    pub fn row(&self, cell: usize) -> Option<&'a [f32]> {
        let start = cell.checked_mul(self.classes)?;
        let end = start.checked_add(self.classes)?;
        self.data.get(start..end)
    }
}
