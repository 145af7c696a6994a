use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use super::error::ClassifierError;

/// Decodes an image file into an in-memory surface.
///
/// Format is inferred from the file contents; failures surface as
/// `ImageError` so the capture boundary stays distinct from model errors.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ClassifierError> {
    let path = path.as_ref();
    image::open(path)
        .map_err(|e| ClassifierError::ImageError(format!("failed to decode {:?}: {}", path, e)))
}

/// Rejects surfaces the model cannot consume.
pub(crate) fn validate_surface(image: &DynamicImage) -> Result<(), ClassifierError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ClassifierError::ValidationError(
            "image has zero width or height".into(),
        ));
    }
    Ok(())
}

/// Converts an image surface into the model's input tensor.
///
/// The surface is resized to `input_size` x `input_size` RGB and scaled from
/// [0, 255] to [-1, 1], laid out as NCHW `[1, 3, size, size]` — the
/// convention the hosted bite models are exported with.
pub(crate) fn to_model_input(
    image: &DynamicImage,
    input_size: usize,
) -> Result<Array4<f32>, ClassifierError> {
    validate_surface(image)?;
    if input_size == 0 {
        return Err(ClassifierError::ValidationError(
            "model input size must be nonzero".into(),
        ));
    }

    let side = u32::try_from(input_size)
        .map_err(|_| ClassifierError::ValidationError("model input size out of range".into()))?;
    let resized = image.resize_exact(side, side, FilterType::Triangle).to_rgb8();

    let mut input = Array4::<f32>::zeros((1, 3, input_size, input_size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, channel, y as usize, x as usize]] =
                pixel.0[channel] as f32 / 127.5 - 1.0;
        }
    }
    Ok(input)
}
