use image::Luma;
use tracing::debug;

use super::Grid;

/// Rotations smaller than this are not worth resampling for.
const MIN_CORRECTION_DEGREES: f32 = 0.05;

/// Straighten the foreground (non-zero pixels) of a binarized grid.
///
/// The skew is the tilt of the minimum-area rectangle around all foreground
/// pixels. A grid without foreground is returned unchanged.
pub fn deskew(grid: &Grid) -> Grid {
    let angle = estimate_skew(grid);
    if angle.abs() < MIN_CORRECTION_DEGREES {
        return grid.clone();
    }

    debug!(angle, "Correcting skew");
    rotate_content(grid, -angle)
}

/// Tilt of the foreground in degrees, normalized into `(-45, 45]`.
///
/// Positive means the content runs downhill to the right (image coordinates,
/// y pointing down). Returns 0 when there is no foreground.
pub fn estimate_skew(grid: &Grid) -> f32 {
    let points = foreground_outline(grid);
    let hull = convex_hull(points);
    normalize_angle(min_area_rect_angle(&hull))
}

/// Rotate the content by `degrees` about the grid centre (clockwise on
/// screen for positive values), keeping the dimensions.
///
/// Bilinear sampling; samples outside the grid take the nearest edge value.
pub fn rotate_content(grid: &Grid, degrees: f32) -> Grid {
    let (width, height) = grid.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let (sin, cos) = degrees.to_radians().sin_cos();

    Grid::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        Luma([sample_bilinear(grid, sx, sy)])
    })
}

fn sample_bilinear(grid: &Grid, x: f32, y: f32) -> u8 {
    let (width, height) = grid.dimensions();
    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p = |px: u32, py: u32| grid.get_pixel(px, py)[0] as f32;
    let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
    let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;

    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

/// Leftmost and rightmost foreground pixel of every row. The convex hull of
/// these equals the hull of the whole foreground.
fn foreground_outline(grid: &Grid) -> Vec<(i64, i64)> {
    let (width, height) = grid.dimensions();
    let mut points = Vec::new();

    for y in 0..height {
        let row = (0..width).filter(|&x| grid.get_pixel(x, y)[0] > 0);
        let mut first = None;
        let mut last = None;
        for x in row {
            if first.is_none() {
                first = Some(x);
            }
            last = Some(x);
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push((first as i64, y as i64));
            if last != first {
                points.push((last as i64, y as i64));
            }
        }
    }
    points
}

fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Andrew's monotone chain. Returns the hull counter-clockwise without
/// repeating the first point; collinear points are dropped.
fn convex_hull(mut points: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    points.sort_unstable();
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<(i64, i64)> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(i64, i64)> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Orientation in degrees of the minimum-area rectangle enclosing `hull`.
///
/// One side of the optimal rectangle is collinear with a hull edge, so every
/// edge direction is tried.
fn min_area_rect_angle(hull: &[(i64, i64)]) -> f32 {
    if hull.len() < 2 {
        return 0.0;
    }

    let mut best_area = f64::INFINITY;
    let mut best_angle = 0.0f64;

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (dx, dy) = ((b.0 - a.0) as f64, (b.1 - a.1) as f64);
        let length = dx.hypot(dy);
        if length == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / length, dy / length);

        let mut min_u = f64::INFINITY;
        let mut max_u = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        for &(px, py) in hull {
            let (px, py) = (px as f64, py as f64);
            let u = px * ux + py * uy;
            let v = -px * uy + py * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area - 1e-9 {
            best_area = area;
            best_angle = dy.atan2(dx).to_degrees();
        }
    }

    best_angle as f32
}

/// Fold a rectangle orientation into `(-45, 45]`.
fn normalize_angle(degrees: f32) -> f32 {
    let folded = degrees % 90.0;
    if folded > 45.0 {
        folded - 90.0
    } else if folded <= -45.0 {
        folded + 90.0
    } else {
        folded
    }
}
