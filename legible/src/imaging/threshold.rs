use image::imageops::{self, FilterType};
use image::Luma;
use tracing::debug;

use super::Grid;

/// Uniform upscale with cubic (Catmull-Rom) interpolation.
pub fn upscale(grid: &Grid, factor: u32) -> Grid {
    if factor <= 1 {
        return grid.clone();
    }
    let (width, height) = grid.dimensions();
    imageops::resize(grid, width * factor, height * factor, FilterType::CatmullRom)
}

/// Global threshold maximizing between-class variance (Otsu).
pub fn otsu_level(grid: &Grid) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in grid.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total_pixels = grid.width() as u64 * grid.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Pixels above the Otsu level become 255, the rest 0.
pub fn otsu_binarize(grid: &Grid) -> Grid {
    let level = otsu_level(grid);
    debug!(level, "Otsu threshold computed");

    let mut output = grid.clone();
    for pixel in output.pixels_mut() {
        *pixel = Luma([if pixel[0] > level { 255 } else { 0 }]);
    }
    output
}
