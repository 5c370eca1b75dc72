use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader};
use tracing::debug;

use super::Grid;
use crate::error::{LegibleError, Result};

/// Decode container bytes (PNG, JPEG, WebP, ...) into an image, guessing the
/// format from content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(LegibleError::Decode("empty image payload".to_string()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LegibleError::Decode(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| LegibleError::Decode(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(LegibleError::Decode(format!(
            "Image has no pixels: {width}x{height}"
        )));
    }

    debug!(width, height, color = ?img.color(), "Decoded image");
    Ok(img)
}

/// Decode container bytes straight to a single-channel grid.
pub fn decode_grayscale(bytes: &[u8]) -> Result<Grid> {
    Ok(decode_image(bytes)?.to_luma8())
}
