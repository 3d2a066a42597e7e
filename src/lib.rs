//! detpost turns raw object-detection head output into labeled boxes.
//!
//! The pipeline has two stages. [`decode`] takes the per-cell box and class
//! score tensors, picks the best class per cell and keeps cells whose score
//! clears a confidence threshold. [`nms_per_class`] then runs greedy IoU-based
//! non-maximum suppression independently for every class. [`Detector`] ties
//! both stages to a [`LabelTable`] and an [`InferenceEngine`] supplied by the
//! caller. Optional features add parallel decoding (`rayon`), image loading
//! (`image-io`) and spans/events (`tracing`).

mod trace;

pub mod decode;
pub mod detection;
pub mod detector;
pub mod geometry;
pub mod input;
pub mod labels;
pub mod suppress;
pub mod tensor;
pub mod util;

pub use decode::{decode, DecodeParams, DEFAULT_CONFIDENCE_THRESHOLD};
pub use detection::{retain_confident, Detection};
pub use detector::{Detector, DetectorConfig, InferenceEngine, PostprocessParams};
pub use geometry::{box_intersection, box_iou, box_union, BoundingBox, CenterBox, FrameTransform};
#[cfg(feature = "image-io")]
pub use input::io;
pub use input::{InputTensor, DEFAULT_INPUT_SIZE};
pub use labels::LabelTable;
pub use suppress::{nms_per_class, DEFAULT_NMS_THRESHOLD};
pub use tensor::{OutputLayout, RawOutputTensors, YOLOV4_416_CELLS};
pub use util::{DetPostError, DetPostResult};
