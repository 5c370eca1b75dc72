use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::{debug, warn};

use crate::error::{LegibleError, Result};
use crate::imaging::decode_image;

/// JPEG qualities tried in order until the encoding fits.
pub const JPEG_QUALITIES: [u8; 4] = [85, 75, 65, 60];

/// Shrink so the longest side is at most `max_dim`, keeping the aspect ratio.
fn resize_if_needed(img: &DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img.clone();
    }

    let ratio = if width > height {
        max_dim as f32 / width as f32
    } else {
        max_dim as f32 / height as f32
    };
    let new_width = ((width as f32 * ratio).round() as u32).max(1);
    let new_height = ((height as f32 * ratio).round() as u32).max(1);

    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality)
        .encode_image(rgb)
        .map_err(|e| LegibleError::Internal(format!("Failed to encode JPEG: {e}")))?;
    Ok(output)
}

/// Produce a JPEG of `img` no larger than `max_bytes`.
///
/// The image is first downscaled to `max_dimension` and flattened to RGB,
/// then encoded at each of [`JPEG_QUALITIES`] until one fits. If none does,
/// fails with [`LegibleError::PayloadTooLarge`] carrying the smallest size
/// reached.
pub fn fit_payload(img: &DynamicImage, max_dimension: u32, max_bytes: usize) -> Result<Vec<u8>> {
    let resized = resize_if_needed(img, max_dimension);
    let rgb = resized.to_rgb8();

    let mut smallest = usize::MAX;
    for quality in JPEG_QUALITIES {
        let encoded = encode_jpeg(&rgb, quality)?;
        debug!(quality, bytes = encoded.len(), max_bytes, "Encoded cloud payload");
        if encoded.len() <= max_bytes {
            return Ok(encoded);
        }
        smallest = smallest.min(encoded.len());
    }

    warn!(
        smallest,
        max_bytes, "Image cannot be compressed under the cloud payload ceiling"
    );
    Err(LegibleError::PayloadTooLarge {
        size: smallest,
        limit: max_bytes,
    })
}

/// [`fit_payload`] for undecoded container bytes.
pub fn fit_payload_bytes(bytes: &[u8], max_dimension: u32, max_bytes: usize) -> Result<Vec<u8>> {
    let img = decode_image(bytes)?;
    fit_payload(&img, max_dimension, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    /// Deterministic per-pixel noise; the worst case for JPEG.
    fn noise(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x2545_F491;
        let img = RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            };
            Rgb([next(), next(), next()])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_large_noisy_photo_fits_or_fails_cleanly() {
        let photo = noise(1800, 1400);
        let mut original = Vec::new();
        photo
            .write_to(&mut Cursor::new(&mut original), ImageFormat::Jpeg)
            .unwrap();

        match fit_payload_bytes(&original, 1280, 1_500_000) {
            Ok(payload) => {
                assert!(payload.len() <= 1_500_000);
                let decoded = image::load_from_memory(&payload).unwrap();
                assert_eq!(decoded.width().max(decoded.height()), 1280);
            }
            Err(LegibleError::PayloadTooLarge { size, limit }) => {
                assert_eq!(limit, 1_500_000);
                assert!(size > limit);
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_impossible_ceiling_is_payload_too_large() {
        let err = fit_payload(&noise(200, 200), 1280, 500).unwrap_err();
        match err {
            LegibleError::PayloadTooLarge { size, limit } => {
                assert_eq!(limit, 500);
                assert!(size > 500);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_first_quality_is_used_when_it_fits() {
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([240, 240, 240])));
        let payload = fit_payload(&flat, 1280, 1_500_000).unwrap();
        assert_eq!(payload, encode_jpeg(&flat.to_rgb8(), 85).unwrap());
    }

    #[test]
    fn test_alpha_is_flattened_and_tall_images_shrink() {
        let tall = DynamicImage::new_rgba8(400, 2000);
        let payload = fit_payload(&tall, 1280, 1_500_000).unwrap();
        let decoded = image::load_from_memory(&payload).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 1280));
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = fit_payload_bytes(b"\x89PNG nope", 1280, 1_500_000).unwrap_err();
        assert!(matches!(err, LegibleError::Decode(_)));
    }
}
