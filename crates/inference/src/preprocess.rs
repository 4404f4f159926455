//! Decode uploaded bytes and normalize them to the model's input shape.

use banamon_core::inference::{ImageTensor, MODEL_INPUT_CHANNELS};
use banamon_core::upload::ImageKind;
use image::imageops::FilterType;
use image::ImageFormat;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Unrecognized image data")]
    UnknownFormat,

    #[error("Unsupported image format {0}; only JPEG and PNG are accepted")]
    Unsupported(String),

    #[error("Invalid or corrupted image file: {0}")]
    Decode(String),

    #[error("Image has zero width or height")]
    Empty,
}

/// Decode JPEG or PNG bytes, convert to RGB, resize to `size`×`size`
/// (bilinear) and scale pixel values to `[0, 1]`.
///
/// Returns the detected format alongside the tensor so callers can store the
/// original bytes under the right extension.
pub fn decode_and_normalize(
    bytes: &[u8],
    size: u32,
) -> Result<(ImageKind, ImageTensor), PreprocessError> {
    let format = image::guess_format(bytes).map_err(|_| PreprocessError::UnknownFormat)?;
    let kind = match format {
        ImageFormat::Jpeg => ImageKind::Jpeg,
        ImageFormat::Png => ImageKind::Png,
        other => return Err(PreprocessError::Unsupported(format!("{other:?}"))),
    };

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(PreprocessError::Empty);
    }

    let rgb = decoded
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();
    let data = rgb.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();

    Ok((
        kind,
        ImageTensor {
            height: size,
            width: size,
            channels: MODEL_INPUT_CHANNELS,
            data,
        },
    ))
}
