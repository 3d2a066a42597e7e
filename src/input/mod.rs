//! Model input buffers.
//!
//! The engine consumes a square `input_size x input_size` image as interleaved
//! RGB `f32` values in `[0, 1]`, row-major. [`InputTensor`] is that buffer.

use crate::util::{DetPostError, DetPostResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Default square input resolution.
pub const DEFAULT_INPUT_SIZE: usize = 416;

/// Channels per pixel.
pub const CHANNELS: usize = 3;

/// Interleaved normalized RGB buffer at the model's input resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    size: usize,
}

impl InputTensor {
    /// Converts packed RGB8 pixels, dividing every channel by 255.
    ///
    /// The image must already be `input_size x input_size`.
    pub fn from_rgb8(
        data: &[u8],
        width: usize,
        height: usize,
        input_size: usize,
    ) -> DetPostResult<Self> {
        if width == 0 || height == 0 || width != input_size || height != input_size {
            return Err(DetPostError::InvalidDimensions { width, height });
        }
        let needed = required_len(input_size)?;
        if data.len() != needed {
            return Err(DetPostError::TensorShape {
                tensor: "rgb input",
                expected: needed,
                got: data.len(),
            });
        }
        let data = data.iter().map(|&v| v as f32 / 255.0).collect();
        Ok(Self {
            data,
            size: input_size,
        })
    }

    /// Wraps an already normalized buffer.
    pub fn from_normalized(data: Vec<f32>, input_size: usize) -> DetPostResult<Self> {
        if input_size == 0 {
            return Err(DetPostError::InvalidDimensions {
                width: input_size,
                height: input_size,
            });
        }
        let needed = required_len(input_size)?;
        if data.len() != needed {
            return Err(DetPostError::TensorShape {
                tensor: "normalized input",
                expected: needed,
                got: data.len(),
            });
        }
        if data.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(DetPostError::InvalidInput(
                "normalized input values must lie in [0, 1]",
            ));
        }
        Ok(Self {
            data,
            size: input_size,
        })
    }

    /// Side length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Flat `size * size * 3` buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; CHANNELS]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let start = (y * self.size + x) * CHANNELS;
        let px = self.data.get(start..start + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }
}

fn required_len(input_size: usize) -> DetPostResult<usize> {
    input_size
        .checked_mul(input_size)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(DetPostError::InvalidDimensions {
            width: input_size,
            height: input_size,
        })
}
