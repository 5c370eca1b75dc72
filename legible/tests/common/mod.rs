// Common test utilities for integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Once;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Deterministic RGB noise. JPEG compresses it badly, which makes it a good
/// stand-in for a large camera photo.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
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

/// A light page with a few dark horizontal strokes standing in for text.
pub fn text_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let in_margin = x < width / 10 || x > width - width / 10;
        let row = y % 24;
        if !in_margin && (8..14).contains(&row) && (x / 9) % 5 != 4 {
            Luma([30])
        } else {
            Luma([225])
        }
    })
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format)
        .expect("encode test image");
    out
}

pub fn png_page() -> Vec<u8> {
    encode(&DynamicImage::ImageLuma8(text_page(160, 120)), ImageFormat::Png)
}

// Re-export commonly used crates for convenience
pub use serial_test::serial;
pub use tempfile;
pub use wiremock;
