//! High-frequency (probable-text) luminance analysis.
//!
//! Runs on its own resized copy of the image, bounded to 1024px on the long
//! side, so thin strokes that the 256px analysis grid would erase stay
//! visible. The scoring path does not consume these percentiles; they are
//! produced for display and driver-side reporting.

use ndarray::Array2;

use crate::features::LEGIBILITY_SENTINEL;

use super::raster::RasterImage;
use super::sampling::sobel_magnitude;

const LEGIBILITY_TARGET: usize = 1024;
const MIN_GRADIENT_FLOOR: f32 = 0.08;
const MIN_SAMPLE_COUNT: usize = 100;
const MIN_SAMPLE_AREA_RATIO: f64 = 0.0001;

pub(crate) struct LegibilityStats {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub area_ratio: f64,
}

impl LegibilityStats {
    fn declined() -> Self {
        Self {
            p25: LEGIBILITY_SENTINEL,
            p50: LEGIBILITY_SENTINEL,
            p75: LEGIBILITY_SENTINEL,
            area_ratio: 0.0,
        }
    }
}

/// Luminance percentiles of pixels whose gradient magnitude stands out from
/// the image's own gradient distribution (mean + 2σ, floored at 0.08).
///
/// Declines with sentinels when fewer than max(100, 0.01% of the grid)
/// opaque pixels qualify.
pub(crate) fn legibility_metrics(original: &RasterImage) -> LegibilityStats {
    let img = original.downsample_to_fit(LEGIBILITY_TARGET);
    let (w, h) = (img.width(), img.height());
    if w < 3 || h < 3 {
        return LegibilityStats::declined();
    }

    let mut luminance = Array2::<f32>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, _] = img.pixel(x, y);
            luminance[(y, x)] = (0.2126 * r as f64 / 255.0
                + 0.7152 * g as f64 / 255.0
                + 0.0722 * b as f64 / 255.0) as f32;
        }
    }

    let mut gradients = Array2::<f32>::zeros((h, w));
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let g = sobel_magnitude(&luminance, x, y) as f64;
            gradients[(y, x)] = g as f32;
            sum += g;
            sum_sq += g * g;
            count += 1;
        }
    }
    if count == 0 {
        return LegibilityStats::declined();
    }

    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    let threshold = (mean + 2.0 * variance.sqrt()).max(MIN_GRADIENT_FLOOR as f64) as f32;

    let mut high_freq: Vec<f32> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if gradients[(y, x)] > threshold && img.pixel(x, y)[3] > 128 {
                high_freq.push(luminance[(y, x)]);
            }
        }
    }

    let total = w * h;
    let floor = MIN_SAMPLE_COUNT.max((total as f64 * MIN_SAMPLE_AREA_RATIO) as usize);
    if high_freq.len() < floor {
        return LegibilityStats::declined();
    }

    high_freq.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = high_freq.len();
    let pick = |q: f64| high_freq[((n as f64 * q) as usize).min(n - 1)] as f64;

    LegibilityStats {
        p25: pick(0.25),
        p50: pick(0.50),
        p75: pick(0.75),
        area_ratio: n as f64 / total as f64,
    }
}
