//! Deterministic foreground pixel sampling.
//!
//! The P10 contrast tail downstream is computed over at most `max_samples`
//! Lab pixels. Small foregrounds are taken whole; large ones are sampled with
//! an edge bias: the perceptually critical high-gradient pixels are always
//! included, and the remainder is spread over the image with stratified grid
//! round-robin so the sample still covers the design spatially.

use ndarray::Array2;

const GRID_ROWS: usize = 10;
const GRID_COLS: usize = 10;

/// Share of the foreground taken as top-gradient pixels, before clamping.
const EDGE_SHARE: f64 = 0.02;
const EDGE_PICK_MIN: usize = 100;
const EDGE_PICK_MAX: usize = 500;

/// 3×3 Sobel magnitude at an interior cell of `grid`.
#[inline]
pub(crate) fn sobel_magnitude(grid: &Array2<f32>, x: usize, y: usize) -> f32 {
    let gx = grid[(y - 1, x + 1)] + 2.0 * grid[(y, x + 1)] + grid[(y + 1, x + 1)]
        - grid[(y - 1, x - 1)]
        - 2.0 * grid[(y, x - 1)]
        - grid[(y + 1, x - 1)];
    let gy = grid[(y + 1, x - 1)] + 2.0 * grid[(y + 1, x)] + grid[(y + 1, x + 1)]
        - grid[(y - 1, x - 1)]
        - 2.0 * grid[(y - 1, x)]
        - grid[(y - 1, x + 1)];
    (gx * gx + gy * gy).sqrt()
}

/// Separable 5×5 Gaussian low-pass (1,4,6,4,1 outer product, sum 256).
///
/// The 2-pixel border is left at zero.
pub(crate) fn gaussian_blur_5x5(input: &Array2<f32>) -> Array2<f32> {
    const KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
    let (h, w) = input.dim();
    let mut output = Array2::zeros((h, w));
    if h < 5 || w < 5 {
        return output;
    }
    for y in 2..h - 2 {
        for x in 2..w - 2 {
            let mut sum = 0.0f32;
            for (ky, wy) in KERNEL.iter().enumerate() {
                for (kx, wx) in KERNEL.iter().enumerate() {
                    sum += input[(y + ky - 2, x + kx - 2)] * wy * wx;
                }
            }
            output[(y, x)] = sum / 256.0;
        }
    }
    output
}

/// Pick at most `max_samples` foreground Lab pixels, deterministically.
///
/// `fg_lab` holds the Lab triple of every foreground pixel in row-major
/// order; `foreground` marks which grid cells are foreground. When the
/// foreground fits the budget it is returned whole. Otherwise:
///
/// 1. smooth the raw luminance field with the 5×5 Gaussian,
/// 2. rank foreground pixels by Sobel magnitude on the smoothed field
///    (2-pixel border excluded, ties broken by pixel index),
/// 3. keep the top clamp(2% of N, 100, 500) edge pixels,
/// 4. fill the rest by round-robin over a 10×10 grid of cells, each cell
///    yielding its unpicked foreground pixels in index order.
pub(crate) fn sample_foreground(
    luminance: &Array2<f32>,
    foreground: &Array2<bool>,
    fg_lab: &[[f32; 3]],
    max_samples: usize,
) -> Vec<[f32; 3]> {
    let count = fg_lab.len();
    if count <= max_samples {
        return fg_lab.to_vec();
    }

    let (h, w) = luminance.dim();
    let blurred = gaussian_blur_5x5(luminance);

    // Linear index of each foreground pixel, plus its position in fg_lab
    let mut valid: Vec<usize> = Vec::with_capacity(count);
    let mut lab_index: Vec<usize> = vec![usize::MAX; w * h];
    let mut next_lab = 0usize;
    for y in 0..h {
        for x in 0..w {
            if foreground[(y, x)] {
                let i = y * w + x;
                lab_index[i] = next_lab;
                next_lab += 1;
                valid.push(i);
            }
        }
    }

    let mut sobel: Vec<f32> = vec![0.0; w * h];
    for &i in &valid {
        let x = i % w;
        let y = i / w;
        if x < 2 || x + 2 >= w || y < 2 || y + 2 >= h {
            continue;
        }
        sobel[i] = sobel_magnitude(&blurred, x, y);
    }

    let edge_budget = ((count as f64 * EDGE_SHARE) as usize).clamp(EDGE_PICK_MIN, EDGE_PICK_MAX);

    // Descending magnitude, stable tie-break by pixel index
    let mut ranked = valid.clone();
    ranked.sort_by(|&a, &b| {
        sobel[b]
            .partial_cmp(&sobel[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut selected = vec![false; w * h];
    let mut samples: Vec<[f32; 3]> = Vec::with_capacity(max_samples);
    for &i in ranked.iter().take(edge_budget) {
        selected[i] = true;
        samples.push(fg_lab[lab_index[i]]);
    }

    if samples.len() < max_samples {
        let cell_w = (w / GRID_COLS).max(1);
        let cell_h = (h / GRID_ROWS).max(1);
        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); GRID_ROWS * GRID_COLS];
        for &i in &valid {
            if selected[i] {
                continue;
            }
            let x = i % w;
            let y = i / w;
            let cx = (x / cell_w).min(GRID_COLS - 1);
            let cy = (y / cell_h).min(GRID_ROWS - 1);
            cells[cy * GRID_COLS + cx].push(i);
        }

        let mut remaining: usize = cells.iter().map(Vec::len).sum();
        let mut cursors = vec![0usize; cells.len()];
        let mut cell = 0usize;
        while samples.len() < max_samples && remaining > 0 {
            let cursor = cursors[cell];
            if cursor < cells[cell].len() {
                let i = cells[cell][cursor];
                cursors[cell] += 1;
                samples.push(fg_lab[lab_index[i]]);
                remaining -= 1;
            }
            cell = (cell + 1) % cells.len();
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_grid(h: usize, w: usize, v: f32) -> Array2<f32> {
        Array2::from_elem((h, w), v)
    }

    #[test]
    fn blur_preserves_constant_interior() {
        let blurred = gaussian_blur_5x5(&constant_grid(20, 20, 0.5));
        assert!((blurred[(10, 10)] - 0.5).abs() < 1e-6);
        // Border stays zero by construction
        assert_eq!(blurred[(0, 0)], 0.0);
        assert_eq!(blurred[(1, 10)], 0.0);
    }

    #[test]
    fn sobel_zero_on_flat_field() {
        let grid = constant_grid(10, 10, 0.8);
        assert_eq!(sobel_magnitude(&grid, 5, 5), 0.0);
    }

    #[test]
    fn sobel_detects_vertical_step() {
        let mut grid = constant_grid(10, 10, 0.0);
        for y in 0..10 {
            for x in 5..10 {
                grid[(y, x)] = 1.0;
            }
        }
        assert!(sobel_magnitude(&grid, 5, 5) > 1.0);
        assert_eq!(sobel_magnitude(&grid, 2, 5), 0.0);
    }

    #[test]
    fn small_foreground_is_returned_whole() {
        let lum = constant_grid(50, 50, 1.0);
        let fg = Array2::from_elem((50, 50), true);
        let labs: Vec<[f32; 3]> = (0..2500).map(|i| [i as f32, 0.0, 0.0]).collect();
        let samples = sample_foreground(&lum, &fg, &labs, 10_000);
        assert_eq!(samples.len(), 2500);
        assert_eq!(samples[0][0], 0.0);
        assert_eq!(samples[2499][0], 2499.0);
    }

    #[test]
    fn oversized_foreground_is_capped_and_deterministic() {
        let (h, w) = (150, 150);
        let mut lum = Array2::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                lum[(y, x)] = if x >= w / 2 { 1.0 } else { 0.0 };
            }
        }
        let fg = Array2::from_elem((h, w), true);
        let labs: Vec<[f32; 3]> = (0..h * w).map(|i| [i as f32, 0.0, 0.0]).collect();

        let a = sample_foreground(&lum, &fg, &labs, 10_000);
        let b = sample_foreground(&lum, &fg, &labs, 10_000);
        assert_eq!(a.len(), 10_000);
        assert_eq!(a, b);

        // The contrast boundary column must be overrepresented in the head
        // of the sample: the first picks are the highest-gradient pixels.
        let boundary: Vec<f32> = (0..h)
            .map(|y| (y * w + w / 2) as f32)
            .collect();
        let head: Vec<f32> = a.iter().take(150).map(|lab| lab[0]).collect();
        let hits = head.iter().filter(|v| boundary.contains(v)).count();
        assert!(hits > 0, "no boundary pixels among the edge picks");
    }

    #[test]
    fn stratified_fill_covers_distant_cells() {
        // Flat field: every sobel is zero, so sampling is pure round-robin
        let (h, w) = (200, 200);
        let lum = constant_grid(h, w, 0.5);
        let fg = Array2::from_elem((h, w), true);
        let labs: Vec<[f32; 3]> = (0..h * w).map(|i| [i as f32, 0.0, 0.0]).collect();
        let samples = sample_foreground(&lum, &fg, &labs, 10_000);
        assert_eq!(samples.len(), 10_000);

        // Both the first and the last grid cell contribute pixels
        let has_top_left = samples.iter().any(|lab| lab[0] < (20 * w) as f32);
        let has_bottom_right = samples.iter().any(|lab| lab[0] >= ((h - 20) * w) as f32);
        assert!(has_top_left);
        assert!(has_bottom_right);
    }
}
