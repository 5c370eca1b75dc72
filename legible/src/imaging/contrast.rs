use image::Luma;
use imageproc::filter::median_filter;
use tracing::debug;

use super::Grid;

/// Edge-preserving denoise followed by local and global contrast equalization.
pub fn denoise_and_contrast(grid: &Grid, clip_limit: f32, tiles: u32) -> Grid {
    let denoised = median_filter(grid, 1, 1);
    let equalized = clahe(&denoised, clip_limit, tiles);
    stretch_contrast(&equalized)
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into at most `tiles x tiles` regions. Each region gets
/// its own equalization curve with histogram bins clipped at
/// `clip_limit * area / 256` (the excess spread evenly over all bins).
/// Pixels are mapped by bilinear interpolation between the curves of the
/// four nearest tile centres, so tile borders do not show.
pub fn clahe(grid: &Grid, clip_limit: f32, tiles: u32) -> Grid {
    let (width, height) = grid.dimensions();
    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(grid, (x0, y0, x1, y1), clip_limit));
        }
    }

    debug!(tiles_x, tiles_y, clip_limit, "CLAHE curves computed");

    let lookup = |tx: u32, ty: u32, value: u8| luts[(ty * tiles_x + tx) as usize][value as usize] as f32;

    Grid::from_fn(width, height, |x, y| {
        let (tx0, tx1, ax) = tile_neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, ay) = tile_neighbours(y, tile_h, tiles_y);
        let value = grid.get_pixel(x, y)[0];

        let top = lookup(tx0, ty0, value) * (1.0 - ax) + lookup(tx1, ty0, value) * ax;
        let bottom = lookup(tx0, ty1, value) * (1.0 - ax) + lookup(tx1, ty1, value) * ax;
        let mapped = top * (1.0 - ay) + bottom * ay;

        Luma([mapped.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clipped-histogram equalization curve for one tile.
fn tile_lut(grid: &Grid, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[grid.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    let mut lut = [0u8; 256];
    if area == 0 {
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = i as u8;
        }
        return lut;
    }

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in histogram.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut cdf = 0u32;
    for (bin, slot) in histogram.iter().zip(lut.iter_mut()) {
        cdf += bin;
        *slot = ((cdf as f32 * 255.0) / area as f32).round().min(255.0) as u8;
    }
    lut
}

/// Indices of the two tiles whose centres straddle `pos`, plus the weight of
/// the second one.
fn tile_neighbours(pos: u32, tile_size: u32, tile_count: u32) -> (u32, u32, f32) {
    let f = ((pos as f32 + 0.5) / tile_size as f32 - 0.5).max(0.0);
    let first = (f.floor() as u32).min(tile_count - 1);
    let second = (first + 1).min(tile_count - 1);
    let weight = if second == first { 0.0 } else { f - first as f32 };
    (first, second, weight)
}

/// Linear min/max stretch to the full 0..=255 range.
///
/// Flat images are returned unchanged.
pub fn stretch_contrast(grid: &Grid) -> Grid {
    let mut min_val = 255u8;
    let mut max_val = 0u8;
    for pixel in grid.pixels() {
        min_val = min_val.min(pixel[0]);
        max_val = max_val.max(pixel[0]);
    }

    if max_val <= min_val {
        return grid.clone();
    }

    let range = (max_val - min_val) as f32;
    Grid::from_fn(grid.width(), grid.height(), |x, y| {
        let normalized = (grid.get_pixel(x, y)[0] - min_val) as f32 / range;
        Luma([(normalized * 255.0).round() as u8])
    })
}
