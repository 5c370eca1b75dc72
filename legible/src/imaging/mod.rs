//! Image preparation for OCR.
//!
//! Every filter is a pure `&Grid -> Grid` transform over single-channel
//! 8-bit images. [`preprocess_image`] chains them in the fixed order used for
//! local recognition:
//!
//! 1. decode to grayscale
//! 2. denoise and equalize contrast (median, CLAHE, min/max stretch)
//! 3. adaptive binarization with ruled-line removal
//! 4. deskew
//! 5. sharpen
//! 6. cubic upscale
//! 7. global Otsu threshold

mod binarize;
mod contrast;
mod decode;
mod deskew;
mod pipeline;
mod sharpen;
mod threshold;

/// Single-channel intensity grid, 0 = darkest.
pub type Grid = image::GrayImage;

pub use binarize::{adaptive_threshold_inv, binarize_and_clean, remove_horizontal_lines};
pub use contrast::{clahe, denoise_and_contrast, stretch_contrast};
pub use decode::{decode_grayscale, decode_image};
pub use deskew::{deskew, estimate_skew, rotate_content};
pub use pipeline::{downscale_to_fit, preprocess_grid, preprocess_image};
pub use sharpen::sharpen;
pub use threshold::{otsu_binarize, otsu_level, upscale};
