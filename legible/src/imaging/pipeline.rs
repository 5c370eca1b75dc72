use image::imageops::{self, FilterType};
use tracing::{debug, info, instrument};

use super::{
    binarize_and_clean, decode_grayscale, denoise_and_contrast, deskew, otsu_binarize, sharpen,
    upscale, Grid,
};
use crate::config::PreprocessConfig;
use crate::error::Result;

/// Decode `bytes` and run the full preprocessing chain.
///
/// The result is a pure black-and-white page (dark ink on white paper),
/// `upscale_factor` times the size of the decoded image.
#[instrument(skip_all, fields(input_len = bytes.len()))]
pub fn preprocess_image(bytes: &[u8], config: &PreprocessConfig) -> Result<Grid> {
    let grid = decode_grayscale(bytes)?;
    info!(
        width = grid.width(),
        height = grid.height(),
        "Preprocessing image for OCR"
    );
    Ok(preprocess_grid(&grid, config))
}

/// Run the preprocessing chain on an already decoded grid.
pub fn preprocess_grid(grid: &Grid, config: &PreprocessConfig) -> Grid {
    let grid = denoise_and_contrast(grid, config.clahe_clip_limit, config.clahe_tiles);
    debug!("Denoised and equalized");

    let grid = binarize_and_clean(
        &grid,
        config.adaptive_window,
        config.adaptive_offset,
        config.line_min_length,
    );
    debug!("Binarized and removed ruled lines");

    let grid = deskew(&grid);
    let grid = sharpen(&grid);
    let grid = upscale(&grid, config.upscale_factor);

    // Binarization left ink white; flip back to dark text on paper.
    let mut page = otsu_binarize(&grid);
    imageops::invert(&mut page);

    debug!(
        width = page.width(),
        height = page.height(),
        "Preprocessing complete"
    );
    page
}

/// Shrink so the longest side is at most `max_dimension`, keeping the aspect
/// ratio. Smaller grids are returned as is.
pub fn downscale_to_fit(grid: &Grid, max_dimension: u32) -> Grid {
    let (width, height) = grid.dimensions();
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return grid.clone();
    }

    let ratio = max_dimension as f64 / longest as f64;
    let new_width = ((width as f64 * ratio).round() as u32).max(1);
    let new_height = ((height as f64 * ratio).round() as u32).max(1);
    imageops::resize(grid, new_width, new_height, FilterType::Triangle)
}
