//! Per-background raw physics evaluation.
//!
//! Produces a [`RawScore`] for one candidate background against a
//! [`DesignFeatures`] record: CIEDE2000 cluster statistics, the P10 pixel
//! tail, the fragility-adjusted composite contrast, and the tonal and
//! vibration penalties. No aesthetics here; that layer is applied by the
//! engine once the whole slate's distribution is known.

use serde::Serialize;

use crate::color::{ciede2000, hue_distance, srgb_to_lab, Lab};
use crate::config::ScoringConfig;
use crate::features::DesignFeatures;

/// Resistance weights: darkness, structure, solidity.
const RESISTANCE_DARKNESS_WEIGHT: f64 = 0.55;
const RESISTANCE_STRUCTURE_WEIGHT: f64 = 0.15;
const RESISTANCE_SOLIDITY_WEIGHT: f64 = 0.30;

const FRAGILITY_EXPONENT: f64 = 2.2;
const FRAGILITY_BOOST_GAIN: f64 = 0.6;
const FRAGILITY_BOOST_CAP: f64 = 1.6;

const CONTRAST_WEIGHTED_MEAN_WEIGHT: f64 = 0.45;
const CONTRAST_TAIL_WEIGHT: f64 = 0.30;
const CONTRAST_MIN_CLUSTER_WEIGHT: f64 = 0.20;

/// Coverage below which the design barely occupies the canvas.
const LOW_COVERAGE_FLOOR: f64 = 0.15;
const LOW_COVERAGE_DAMPENER: f64 = 0.85;

/// Sample count below which the P10 tail blends toward the cluster minimum.
const SMALL_SAMPLE_FLOOR: usize = 200;

const TONAL_HUE_WINDOW: f64 = 15.0;
const TONAL_MIN_CLUSTER_CEILING: f64 = 25.0;
const TONAL_PENALTY: f64 = -8.0;

const VIBRATION_HUE_LOW: f64 = 160.0;
const VIBRATION_HUE_HIGH: f64 = 200.0;
const VIBRATION_LIGHTNESS_WINDOW: f64 = 30.0;
const VIBRATION_MIN_CHROMA: f64 = 15.0;
const VIBRATION_PENALTY: f64 = -5.0;

/// Failed to parse a background hex color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    /// The string is not 6 hex digits (after the optional leading `#`).
    InvalidLength(usize),
    /// A character outside `[0-9a-fA-F]` appeared.
    InvalidDigit,
}

impl std::fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseColorError::InvalidLength(len) => {
                write!(f, "hex color must have 6 digits, got {}", len)
            }
            ParseColorError::InvalidDigit => write!(f, "hex color contains a non-hex digit"),
        }
    }
}

impl std::error::Error for ParseColorError {}

/// Parse `#RRGGBB` (case-insensitive, `#` optional) into an RGB triple.
pub fn parse_hex(hex: &str) -> Result<(u8, u8, u8), ParseColorError> {
    let s = hex.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 {
        return Err(ParseColorError::InvalidLength(s.len()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| ParseColorError::InvalidDigit)
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Physics-only score for one background candidate.
#[derive(Debug, Clone, Serialize)]
pub struct RawScore {
    /// Composite contrast energy before penalties.
    pub raw_contrast: f64,
    /// 10th-percentile pixel ΔE₀₀ against the background.
    pub p10_delta_e: f64,
    /// Smallest cluster ΔE₀₀.
    pub min_cluster_delta_e: f64,
    /// Coverage-weighted mean cluster ΔE₀₀.
    pub weighted_mean_delta_e: f64,
    /// (1 − design resistance)^2.2, in [0, 1].
    pub fragility: f64,
    /// −8 when the background sits tonally inside the design, else 0.
    pub tonal_penalty: f64,
    /// −5 for vibrating complementary pairings, else 0.
    pub vibration_penalty: f64,
    /// Cached background CIELAB.
    pub bg_lab: Lab,
    pub bg_chroma: f64,
    /// Background hue in degrees, [0, 360).
    pub bg_hue: f64,
    /// Smallest circular distance from the background hue to any dominant.
    pub min_hue_distance: f64,
}

impl RawScore {
    /// Contrast energy net of penalties; the engine's physics baseline.
    pub fn net_raw(&self) -> f64 {
        self.raw_contrast + self.tonal_penalty + self.vibration_penalty
    }
}

/// Computes [`RawScore`]s. Pure; holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct RawEvaluator {
    config: ScoringConfig,
}

impl RawEvaluator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Evaluate one background hex against analyzed design features.
    pub fn evaluate_raw(
        &self,
        design: &DesignFeatures,
        hex: &str,
    ) -> Result<RawScore, ParseColorError> {
        let (r, g, b) = parse_hex(hex)?;
        let bg_lab = srgb_to_lab(r, g, b);
        let bg_chroma = bg_lab.chroma();
        let bg_hue = bg_lab.hue_degrees();

        // Cluster deltas
        let mut min_cluster = f64::MAX;
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut min_hue_distance = f64::MAX;
        for dc in &design.dominant_colors {
            let delta = ciede2000(dc.lab, bg_lab);
            min_cluster = min_cluster.min(delta);
            weighted_sum += dc.weight * delta;
            weight_total += dc.weight;
            min_hue_distance = min_hue_distance.min(hue_distance(bg_hue, dc.lab.hue_degrees()));
        }
        let (min_cluster, weighted_mean, min_hue_distance) = if design.dominant_colors.is_empty() {
            (0.0, 0.0, 360.0)
        } else {
            (min_cluster, weighted_sum / weight_total, min_hue_distance)
        };

        let p10 = self.p10_delta_e(design, bg_lab, min_cluster);

        // Design resistance and the fragility curve
        let r_darkness = 1.0 - design.near_white_ratio;
        let r_structure = design.edge_density;
        let r_solidity = 1.0 - design.transparency_ratio;
        let resistance = (RESISTANCE_DARKNESS_WEIGHT * r_darkness
            + RESISTANCE_STRUCTURE_WEIGHT * r_structure
            + RESISTANCE_SOLIDITY_WEIGHT * r_solidity)
            .clamp(0.0, 1.0);
        let fragility = (1.0 - resistance).powf(FRAGILITY_EXPONENT);
        let fragility_boost = (1.0 + FRAGILITY_BOOST_GAIN * fragility).min(FRAGILITY_BOOST_CAP);

        let mut raw_contrast = CONTRAST_WEIGHTED_MEAN_WEIGHT * weighted_mean
            + CONTRAST_TAIL_WEIGHT * p10 * fragility_boost
            + CONTRAST_MIN_CLUSTER_WEIGHT * min_cluster;

        let coverage = if design.total_pixel_count > 0 {
            design.foreground_pixel_count as f64 / design.total_pixel_count as f64
        } else {
            0.0
        };
        if coverage < LOW_COVERAGE_FLOOR {
            raw_contrast *= LOW_COVERAGE_DAMPENER;
        }

        let tonal_trigger =
            self.config.tail_veto_floor * self.config.tonal_trigger_ratio;
        let tonal_penalty = if min_hue_distance < TONAL_HUE_WINDOW
            && min_cluster < TONAL_MIN_CLUSTER_CEILING
            && p10 < tonal_trigger
        {
            TONAL_PENALTY
        } else {
            0.0
        };

        let vibration_penalty = if (VIBRATION_HUE_LOW..=VIBRATION_HUE_HIGH)
            .contains(&min_hue_distance)
            && (bg_lab.l - design.foreground_mean_l).abs() < VIBRATION_LIGHTNESS_WINDOW
            && bg_chroma > self.config.vibration_chroma_ratio * design.foreground_p75_chroma
            && design.foreground_p75_chroma > VIBRATION_MIN_CHROMA
        {
            VIBRATION_PENALTY
        } else {
            0.0
        };

        Ok(RawScore {
            raw_contrast,
            p10_delta_e: p10,
            min_cluster_delta_e: min_cluster,
            weighted_mean_delta_e: weighted_mean,
            fragility,
            tonal_penalty,
            vibration_penalty,
            bg_lab,
            bg_chroma,
            bg_hue,
            min_hue_distance,
        })
    }

    /// 10th-percentile pixel delta, blended toward the cluster minimum when
    /// the sample is too small for a stable tail.
    fn p10_delta_e(&self, design: &DesignFeatures, bg_lab: Lab, min_cluster: f64) -> f64 {
        let samples = &design.foreground_pixels_lab;
        let m = samples.len();
        if m == 0 {
            return 0.0;
        }
        let mut deltas: Vec<f64> = samples
            .iter()
            .map(|lab| {
                ciede2000(
                    Lab::new(lab[0] as f64, lab[1] as f64, lab[2] as f64),
                    bg_lab,
                )
            })
            .collect();
        let k = (0.10 * m as f64) as usize;
        let p10 = select_kth(&mut deltas, k);
        if m < SMALL_SAMPLE_FLOOR {
            let blend = m as f64 / SMALL_SAMPLE_FLOOR as f64;
            blend * p10 + (1.0 - blend) * min_cluster
        } else {
            p10
        }
    }
}

/// Iterative quickselect for the k-th smallest value (0-indexed).
///
/// Median-of-three pivots keep the partition depth bounded on sorted and
/// adversarial inputs, and the scan order is fixed, so selection is
/// deterministic for a given input sequence.
fn select_kth(values: &mut [f64], k: usize) -> f64 {
    debug_assert!(k < values.len());
    let mut lo = 0usize;
    let mut hi = values.len() - 1;
    loop {
        if lo == hi {
            return values[lo];
        }
        let pivot = median_of_three(values, lo, hi);
        // Hoare partition around the pivot value
        let mut i = lo;
        let mut j = hi;
        loop {
            while values[i] < pivot {
                i += 1;
            }
            while values[j] > pivot {
                j -= 1;
            }
            if i >= j {
                break;
            }
            values.swap(i, j);
            i += 1;
            j -= 1;
        }
        if k <= j {
            hi = j;
        } else {
            lo = j + 1;
        }
    }
}

fn median_of_three(values: &[f64], lo: usize, hi: usize) -> f64 {
    let mid = lo + (hi - lo) / 2;
    let (a, b, c) = (values[lo], values[mid], values[hi]);
    if (a <= b && b <= c) || (c <= b && b <= a) {
        b
    } else if (b <= a && a <= c) || (c <= a && a <= b) {
        a
    } else {
        c
    }
}
