//! Mapping boxes from model input space back to the source frame.

use crate::geometry::BoundingBox;
use crate::util::{DetPostError, DetPostResult};

/// Per-axis scale from the square model input to a camera frame.
///
/// The frame is resized to the input without preserving aspect ratio, so the
/// inverse is an independent scale on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
    scale_x: f32,
    scale_y: f32,
}

impl FrameTransform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Builds the crop-to-frame transform for a square `input_size` crop.
    pub fn crop_to_frame(
        input_size: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> DetPostResult<Self> {
        if input_size == 0 {
            return Err(DetPostError::InvalidDimensions {
                width: input_size,
                height: input_size,
            });
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(DetPostError::InvalidDimensions {
                width: frame_width,
                height: frame_height,
            });
        }
        Ok(Self {
            scale_x: frame_width as f32 / input_size as f32,
            scale_y: frame_height as f32 / input_size as f32,
        })
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    /// Maps a box from input space into frame space.
    pub fn map_box(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: b.left * self.scale_x,
            top: b.top * self.scale_y,
            right: b.right * self.scale_x,
            bottom: b.bottom * self.scale_y,
        }
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::FrameTransform;
    use crate::geometry::BoundingBox;
    use crate::util::DetPostError;

    #[test]
    fn crop_to_frame_scales_each_axis() {
        let t = FrameTransform::crop_to_frame(416, 640, 480).unwrap();
        let mapped = t.map_box(&BoundingBox::new(0.0, 0.0, 208.0, 208.0));
        assert!((mapped.right - 320.0).abs() < 1e-4);
        assert!((mapped.bottom - 240.0).abs() < 1e-4);
    }

    #[test]
    fn crop_to_frame_rejects_empty_frames() {
        let err = FrameTransform::crop_to_frame(416, 0, 480).err().unwrap();
        assert_eq!(
            err,
            DetPostError::InvalidDimensions {
                width: 0,
                height: 480,
            }
        );
    }
}
