//! One-shot per-design image analysis.
//!
//! Downsamples the design to the 256px analysis grid, segments foreground by
//! alpha, and extracts every feature the per-background evaluation needs:
//! dominant colors, luminance statistics, edge metrics, legibility
//! percentiles, and the deterministic Lab pixel sample.

mod legibility;
mod raster;
pub(crate) mod sampling;

pub use raster::RasterImage;

use ndarray::Array2;

use crate::color::srgb_to_lab;
use crate::config::ScoringConfig;
use crate::features::{DesignFeatures, LUMINANCE_BINS};
use crate::quantize::quantize;

const TARGET_SIZE: usize = 256;
const ALPHA_THRESHOLD: u8 = 128;

const NEAR_WHITE_L: f64 = 70.0;
const NEAR_BLACK_L: f64 = 15.0;
const NEAR_NEUTRAL_CHROMA: f64 = 30.0;

/// Sobel magnitude above which an interior pixel counts as an edge.
const EDGE_MAGNITUDE_FLOOR: f32 = 0.1;

/// Extracts a [`DesignFeatures`] record from a design raster.
#[derive(Debug, Clone, Default)]
pub struct DesignAnalyzer {
    config: ScoringConfig,
}

impl DesignAnalyzer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Analyze a design image and extract all scoring features.
    ///
    /// Fully transparent inputs produce a well-formed degenerate record; the
    /// engine later rejects every candidate for such designs.
    pub fn analyze(&self, original: &RasterImage) -> DesignFeatures {
        let img = original.downsample_to_fit(TARGET_SIZE);
        let (w, h) = (img.width(), img.height());
        let total = w * h;
        if total == 0 {
            return DesignFeatures::degenerate(0, 0.0);
        }

        let mut foreground = Array2::<bool>::from_elem((h, w), false);
        let mut luminance = Array2::<f32>::zeros((h, w));
        let mut near_white = Array2::<bool>::from_elem((h, w), false);
        let mut near_black = Array2::<bool>::from_elem((h, w), false);

        let mut fg_rgb: Vec<[u8; 3]> = Vec::new();
        let mut fg_lab: Vec<[f32; 3]> = Vec::new();
        let mut chromas: Vec<f64> = Vec::new();

        let mut fg_count = 0usize;
        let mut transparent_count = 0usize;
        let mut near_white_count = 0usize;
        let mut near_black_count = 0usize;
        let mut sum_l = 0.0f64;

        for y in 0..h {
            for x in 0..w {
                let [r, g, b, a] = img.pixel(x, y);
                if a < ALPHA_THRESHOLD {
                    transparent_count += 1;
                    continue;
                }
                foreground[(y, x)] = true;
                fg_count += 1;
                fg_rgb.push([r, g, b]);

                luminance[(y, x)] = (0.2126 * r as f64 / 255.0
                    + 0.7152 * g as f64 / 255.0
                    + 0.0722 * b as f64 / 255.0) as f32;

                let lab = srgb_to_lab(r, g, b);
                fg_lab.push([lab.l as f32, lab.a as f32, lab.b as f32]);
                sum_l += lab.l;

                let chroma = lab.chroma();
                chromas.push(chroma);
                if lab.l > NEAR_WHITE_L && chroma < NEAR_NEUTRAL_CHROMA {
                    near_white_count += 1;
                    near_white[(y, x)] = true;
                }
                if lab.l < NEAR_BLACK_L && chroma < NEAR_NEUTRAL_CHROMA {
                    near_black_count += 1;
                    near_black[(y, x)] = true;
                }
            }
        }

        if fg_count == 0 {
            return DesignFeatures::degenerate(total, transparent_count as f64 / total as f64);
        }

        let foreground_mean_l = sum_l / fg_count as f64;
        let foreground_p75_chroma = percentile_75(&mut chromas);

        let dominant_colors = quantize(&fg_rgb, self.config.dominant_color_count, fg_count);

        // Histogram and spread over the relative luminance of the foreground
        let mut histogram = [0.0f64; LUMINANCE_BINS];
        let mut lum_sum = 0.0f64;
        let mut lum_sq_sum = 0.0f64;
        for y in 0..h {
            for x in 0..w {
                if !foreground[(y, x)] {
                    continue;
                }
                let lum = luminance[(y, x)] as f64;
                let bin = ((lum * LUMINANCE_BINS as f64) as usize).min(LUMINANCE_BINS - 1);
                histogram[bin] += 1.0;
                lum_sum += lum;
                lum_sq_sum += lum * lum;
            }
        }
        for bin in histogram.iter_mut() {
            *bin /= fg_count as f64;
        }
        let mean_luminance = lum_sum / fg_count as f64;
        let variance = lum_sq_sum / fg_count as f64 - mean_luminance * mean_luminance;
        let luminance_spread = if variance > 0.0 { variance.sqrt() } else { 0.0 };

        let (edge_density, white_black_edge_ratio) =
            edge_metrics(&luminance, &foreground, &near_white, &near_black);

        let leg = legibility::legibility_metrics(original);

        let foreground_pixels_lab =
            sampling::sample_foreground(&luminance, &foreground, &fg_lab, self.config.max_samples);

        DesignFeatures {
            dominant_colors,
            luminance_histogram: histogram,
            mean_luminance,
            luminance_spread,
            edge_density,
            transparency_ratio: transparent_count as f64 / total as f64,
            foreground_pixels_lab,
            foreground_mean_l,
            foreground_p75_chroma,
            near_white_ratio: near_white_count as f64 / fg_count as f64,
            near_black_ratio: near_black_count as f64 / fg_count as f64,
            foreground_pixel_count: fg_count,
            total_pixel_count: total,
            legibility_p25: leg.p25,
            legibility_p50: leg.p50,
            legibility_p75: leg.p75,
            legibility_area_ratio: leg.area_ratio,
            white_black_edge_ratio,
        }
    }
}

fn percentile_75(chromas: &mut [f64]) -> f64 {
    if chromas.is_empty() {
        return 0.0;
    }
    chromas.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = chromas.len();
    let k = ((n as f64 * 0.75) as usize).min(n - 1);
    chromas[k]
}

/// Edge density over interior foreground pixels, plus the fraction of edge
/// pixels whose 3×3 neighborhood touches both near-white and near-black.
fn edge_metrics(
    luminance: &Array2<f32>,
    foreground: &Array2<bool>,
    near_white: &Array2<bool>,
    near_black: &Array2<bool>,
) -> (f64, f64) {
    let (h, w) = luminance.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let mut interior = 0usize;
    let mut edges = 0usize;
    let mut white_black_edges = 0usize;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if !foreground[(y, x)] {
                continue;
            }
            // Only pixels fully surrounded by foreground count as interior;
            // anything else would see the silhouette, not the artwork.
            let mut all_fg = true;
            'scan: for dy in 0..3 {
                for dx in 0..3 {
                    if !foreground[(y + dy - 1, x + dx - 1)] {
                        all_fg = false;
                        break 'scan;
                    }
                }
            }
            if !all_fg {
                continue;
            }
            interior += 1;

            if sampling::sobel_magnitude(luminance, x, y) > EDGE_MAGNITUDE_FLOOR {
                edges += 1;
                let mut has_white = false;
                let mut has_black = false;
                for dy in 0..3 {
                    for dx in 0..3 {
                        let pos = (y + dy - 1, x + dx - 1);
                        has_white |= near_white[pos];
                        has_black |= near_black[pos];
                    }
                }
                if has_white && has_black {
                    white_black_edges += 1;
                }
            }
        }
    }

    let density = if interior > 0 {
        edges as f64 / interior as f64
    } else {
        0.0
    };
    let wb_ratio = if edges > 0 {
        white_black_edges as f64 / edges as f64
    } else {
        0.0
    };
    (density, wb_ratio)
}
