//! High-level detector: labels, output layout and post-processing defaults.
//!
//! A [`Detector`] is built once from a label table and a [`DetectorConfig`] and
//! is read-only afterwards, so it can be shared across threads. Inference is
//! delegated to an [`InferenceEngine`] supplied per call.

use crate::decode::{decode, DecodeParams, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::detection::Detection;
use crate::geometry::FrameTransform;
use crate::input::{InputTensor, DEFAULT_INPUT_SIZE};
use crate::labels::LabelTable;
use crate::suppress::{nms_per_class, DEFAULT_NMS_THRESHOLD};
use crate::tensor::{OutputLayout, RawOutputTensors, YOLOV4_416_CELLS};
use crate::trace::{trace_event, trace_span};
use crate::util::math::is_unit_interval;
use crate::util::{DetPostError, DetPostResult};
use std::path::Path;

/// Thresholds applied after inference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostprocessParams {
    /// Minimum class score (exclusive) for a cell to become a candidate.
    pub confidence_threshold: f32,
    /// IoU at or above which a same-class box is suppressed.
    pub nms_threshold: f32,
    /// Decode cells in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for PostprocessParams {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            parallel: false,
        }
    }
}

impl PostprocessParams {
    fn validate(&self) -> DetPostResult<()> {
        if !is_unit_interval(self.confidence_threshold) {
            return Err(DetPostError::InvalidThreshold {
                name: "confidence",
                value: self.confidence_threshold,
            });
        }
        if !is_unit_interval(self.nms_threshold) {
            return Err(DetPostError::InvalidThreshold {
                name: "nms",
                value: self.nms_threshold,
            });
        }
        Ok(())
    }
}

/// Construction-time settings for a [`Detector`].
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Square input resolution expected by the model.
    pub input_size: usize,
    /// Number of prediction cells the head emits.
    pub cells: usize,
    /// Class dimension of the score tensor; `None` uses the label count.
    pub classes: Option<usize>,
    /// Default post-processing thresholds.
    pub params: PostprocessParams,
    /// Worker threads for the engine, applied by [`Detector::prepare_engine`].
    pub num_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            cells: YOLOV4_416_CELLS,
            classes: None,
            params: PostprocessParams::default(),
            num_threads: 4,
        }
    }
}

/// Runs a detection network on one input buffer.
///
/// Implementations wrap a concrete runtime; failures should be reported as
/// [`DetPostError::Engine`].
pub trait InferenceEngine {
    /// Produces raw box and score tensors for `input`.
    fn infer(&mut self, input: &InputTensor) -> DetPostResult<RawOutputTensors>;

    /// Sizes the engine's internal thread pool. Engines without one ignore it.
    fn set_num_threads(&mut self, _num_threads: usize) -> DetPostResult<()> {
        Ok(())
    }
}

impl<F> InferenceEngine for F
where
    F: FnMut(&InputTensor) -> DetPostResult<RawOutputTensors>,
{
    fn infer(&mut self, input: &InputTensor) -> DetPostResult<RawOutputTensors> {
        self(input)
    }
}

/// Label-aware decoder and suppressor for a fixed model layout.
#[derive(Clone, Debug)]
pub struct Detector {
    labels: LabelTable,
    layout: OutputLayout,
    cfg: DetectorConfig,
}

impl Detector {
    /// Validates `cfg` against `labels` and builds a detector.
    pub fn new(labels: LabelTable, cfg: DetectorConfig) -> DetPostResult<Self> {
        if cfg.input_size == 0 {
            return Err(DetPostError::InvalidDimensions {
                width: cfg.input_size,
                height: cfg.input_size,
            });
        }
        if cfg.num_threads == 0 {
            return Err(DetPostError::InvalidInput("num_threads must be at least 1"));
        }
        cfg.params.validate()?;

        let classes = cfg.classes.unwrap_or(labels.len());
        if classes != labels.len() {
            return Err(DetPostError::ClassCountMismatch {
                expected: labels.len(),
                got: classes,
            });
        }
        let layout = OutputLayout::new(cfg.cells, classes);
        layout.score_len()?;

        Ok(Self {
            labels,
            layout,
            cfg,
        })
    }

    /// Loads the label file at `path` and builds a detector.
    pub fn from_label_file<P: AsRef<Path>>(path: P, cfg: DetectorConfig) -> DetPostResult<Self> {
        let labels = LabelTable::load(path)?;
        Self::new(labels, cfg)
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Passes the configured thread count to `engine`; call once before
    /// the first [`Detector::recognize`].
    pub fn prepare_engine<E: InferenceEngine + ?Sized>(&self, engine: &mut E) -> DetPostResult<()> {
        engine.set_num_threads(self.cfg.num_threads)
    }

    /// Decodes and suppresses `tensors` with the configured thresholds.
    ///
    /// `image_width`/`image_height` bound the clamped boxes, normally the model
    /// input resolution.
    pub fn detect(
        &self,
        tensors: &RawOutputTensors,
        image_width: usize,
        image_height: usize,
    ) -> DetPostResult<Vec<Detection>> {
        self.detect_with(tensors, image_width, image_height, &self.cfg.params)
    }

    /// Like [`Detector::detect`] with per-call thresholds.
    pub fn detect_with(
        &self,
        tensors: &RawOutputTensors,
        image_width: usize,
        image_height: usize,
        params: &PostprocessParams,
    ) -> DetPostResult<Vec<Detection>> {
        params.validate()?;
        self.check_layout(tensors.layout())?;

        let decode_params = DecodeParams {
            confidence_threshold: params.confidence_threshold,
            image_width,
            image_height,
            parallel: params.parallel,
        };
        let candidates = decode(tensors, &self.labels, &decode_params)?;
        nms_per_class(&candidates, self.labels.len(), params.nms_threshold)
    }

    /// Runs `engine` on `input` and post-processes the result in input space.
    pub fn recognize<E: InferenceEngine + ?Sized>(
        &self,
        engine: &mut E,
        input: &InputTensor,
    ) -> DetPostResult<Vec<Detection>> {
        let size = self.cfg.input_size;
        let _span = trace_span!("recognize", input_size = size).entered();

        if input.size() != size {
            return Err(DetPostError::InvalidDimensions {
                width: input.size(),
                height: input.size(),
            });
        }
        let tensors = engine.infer(input)?;
        let detections = self.detect(&tensors, size, size)?;
        trace_event!("recognized", count = detections.len());
        Ok(detections)
    }

    /// Runs [`Detector::recognize`] and maps boxes onto a
    /// `frame_width x frame_height` source frame.
    pub fn recognize_frame<E: InferenceEngine + ?Sized>(
        &self,
        engine: &mut E,
        input: &InputTensor,
        frame_width: usize,
        frame_height: usize,
    ) -> DetPostResult<Vec<Detection>> {
        let transform =
            FrameTransform::crop_to_frame(self.cfg.input_size, frame_width, frame_height)?;
        let detections = self.recognize(engine, input)?;
        Ok(detections.iter().map(|d| d.mapped(&transform)).collect())
    }

    fn check_layout(&self, got: OutputLayout) -> DetPostResult<()> {
        if got.classes != self.layout.classes {
            return Err(DetPostError::ClassCountMismatch {
                expected: self.layout.classes,
                got: got.classes,
            });
        }
        if got.cells != self.layout.cells {
            return Err(DetPostError::TensorShape {
                tensor: "box",
                expected: self.layout.box_len()?,
                got: got.box_len()?,
            });
        }
        Ok(())
    }
}
