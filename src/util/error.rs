//! Error types for detpost.

use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors that can occur while loading labels or post-processing detections.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetPostError {
    /// The input data or parameters are invalid, e.g. a row-built tensor
    /// with no cells, whose class count cannot be inferred.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image or model input dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A threshold is not a finite value in [0, 1].
    ///
    /// This includes an NMS threshold above 1, even though such a value would
    /// only disable suppression.
    #[error("invalid {name} threshold: {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
    /// The label table has no entries.
    #[error("label table is empty")]
    EmptyLabels,
    /// A label line is blank or whitespace-only (1-based `line`).
    ///
    /// A file ending in `\n\n` has a blank last line and is malformed.
    #[error("malformed label at line {line}")]
    MalformedLabel { line: usize },
    /// The label file could not be read.
    #[error("label io error: {reason}")]
    LabelIo { reason: String },
    /// The score tensor class dimension does not match the label table.
    #[error("class count mismatch: labels have {expected} classes, scores have {got}")]
    ClassCountMismatch { expected: usize, got: usize },
    /// A raw output buffer does not match its declared shape.
    #[error("{tensor} tensor has {got} values, expected {expected}")]
    TensorShape {
        tensor: &'static str,
        expected: usize,
        got: usize,
    },
    /// A detection refers to a class outside the label table.
    #[error("class index {index} out of range for {len} classes")]
    ClassIndexOutOfRange { index: usize, len: usize },
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// The inference engine reported a failure.
    #[error("inference engine error: {reason}")]
    Engine { reason: String },
}
