use image::Luma;
use imageproc::filter::gaussian_blur_f32;

use super::Grid;

/// Sigma of the blur that follows the sharpening kernel.
const RINGING_BLUR_SIGMA: f32 = 0.5;

/// Stroke sharpening: 3x3 kernel (centre 9, ring -1) followed by a light
/// Gaussian blur to tame ringing.
pub fn sharpen(grid: &Grid) -> Grid {
    let sharpened = apply_sharpen_kernel(grid);
    gaussian_blur_f32(&sharpened, RINGING_BLUR_SIGMA)
}

/// Border pixels reuse the nearest in-bounds neighbour.
fn apply_sharpen_kernel(grid: &Grid) -> Grid {
    let (width, height) = grid.dimensions();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    Grid::from_fn(width, height, |x, y| {
        let mut ring = 0i32;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x as i64 + dx).clamp(0, max_x) as u32;
                let ny = (y as i64 + dy).clamp(0, max_y) as u32;
                ring += grid.get_pixel(nx, ny)[0] as i32;
            }
        }
        let centre = grid.get_pixel(x, y)[0] as i32;
        Luma([(9 * centre - ring).clamp(0, 255) as u8])
    })
}
