//! Loading model input from image files via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::input::InputTensor;
use crate::util::{DetPostError, DetPostResult};
use image::imageops::FilterType;
use std::path::Path;

/// A resized model input plus the source frame size it came from.
pub struct LoadedInput {
    pub input: InputTensor,
    pub frame_width: usize,
    pub frame_height: usize,
}

/// Resizes an RGB image to `input_size x input_size` and normalizes it.
///
/// Aspect ratio is not preserved; map boxes back with
/// [`FrameTransform::crop_to_frame`](crate::geometry::FrameTransform::crop_to_frame).
pub fn input_from_rgb_image(img: &image::RgbImage, input_size: usize) -> DetPostResult<InputTensor> {
    let side = u32::try_from(input_size).map_err(|_| DetPostError::InvalidDimensions {
        width: input_size,
        height: input_size,
    })?;
    let resized = image::imageops::resize(img, side, side, FilterType::Triangle);
    InputTensor::from_rgb8(resized.as_raw(), input_size, input_size, input_size)
}

/// Opens an image from disk and prepares it as model input.
pub fn load_input<P: AsRef<Path>>(path: P, input_size: usize) -> DetPostResult<LoadedInput> {
    let img = image::open(path).map_err(|err| DetPostError::ImageIo {
        reason: err.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let frame_width = rgb.width() as usize;
    let frame_height = rgb.height() as usize;
    let input = input_from_rgb_image(&rgb, input_size)?;
    Ok(LoadedInput {
        input,
        frame_width,
        frame_height,
    })
}
