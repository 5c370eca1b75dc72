use image::Luma;
use imageproc::filter::median_filter;
use tracing::debug;

use super::Grid;

/// Adaptive threshold, ruled-line removal and speckle cleanup.
///
/// Output is inverted: ink is 255, paper is 0.
pub fn binarize_and_clean(grid: &Grid, window: u32, offset: i32, line_min_length: u32) -> Grid {
    let binary = adaptive_threshold_inv(grid, window, offset);
    let cleaned = remove_horizontal_lines(&binary, line_min_length);
    median_filter(&cleaned, 1, 1)
}

/// Local-mean threshold over a `window x window` neighbourhood.
///
/// A pixel is ink (255) when it is at most `local_mean - offset`, paper (0)
/// otherwise. Neighbourhoods are clipped at the image border.
pub fn adaptive_threshold_inv(grid: &Grid, window: u32, offset: i32) -> Grid {
    let (width, height) = grid.dimensions();
    let radius = window / 2;
    let integral = compute_integral_image(grid);

    let mut output = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let threshold = region_mean(&integral, width, height, x, y, radius) - offset as f64;
            let value = grid.get_pixel(x, y)[0] as f64;
            let ink = if value <= threshold { 255u8 } else { 0u8 };
            output.put_pixel(x, y, Luma([ink]));
        }
    }
    output
}

/// Morphological opening of the foreground with a `1 x min_length`
/// horizontal segment, subtracted from the input.
///
/// For a binary image the opening keeps exactly the horizontal foreground
/// runs that are at least `min_length` long, so those runs are cleared and
/// everything else is left as is.
pub fn remove_horizontal_lines(binary: &Grid, min_length: u32) -> Grid {
    let (width, height) = binary.dimensions();
    let mut output = binary.clone();
    let mut removed = 0u64;

    for y in 0..height {
        let mut x = 0;
        while x < width {
            if binary.get_pixel(x, y)[0] == 0 {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && binary.get_pixel(x, y)[0] > 0 {
                x += 1;
            }
            if x - start >= min_length {
                for run_x in start..x {
                    output.put_pixel(run_x, y, Luma([0]));
                }
                removed += u64::from(x - start);
            }
        }
    }

    if removed > 0 {
        debug!(removed, min_length, "Removed ruled-line pixels");
    }
    output
}

/// `integral[y * (width+1) + x]` holds the sum of all pixels in the rectangle
/// `[0, x) x [0, y)`. The table is `(width+1) x (height+1)` with a zero border.
fn compute_integral_image(grid: &Grid) -> Vec<u64> {
    let (w, h) = grid.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += grid.get_pixel(x, y)[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean of the square of side `2 * radius + 1` centred on `(cx, cy)`,
/// clipped to the image.
fn region_mean(integral: &[u64], width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = (width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(width as usize);
    let y2 = ((cy + radius + 1) as usize).min(height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
