//! Scoring configuration via TOML files.
//!
//! Every threshold of the scoring model lives in [`ScoringConfig`]. Missing
//! keys fall back to the calibrated defaults, so a partial `[scoring]` table
//! is enough to tweak a single gate.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use toml::Value;

/// Opaque model version tag surfaced in reports.
pub const SCORING_MODEL_VERSION: &str = "3.0";

/// Thresholds and budget parameters for the two-pass scoring engine.
///
/// # Examples
///
/// ```
/// use backdrop_core::ScoringConfig;
///
/// let config = ScoringConfig::from_toml_str("[scoring]\ngood_floor = 40.0").unwrap();
/// assert_eq!(config.good_floor, 40.0);
/// assert_eq!(config.borderline_floor, 26.0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ScoringConfig {
    /// Final score gate for PROMOTED.
    pub good_floor: f64,
    /// Final score gate for PASSED.
    pub borderline_floor: f64,
    /// Minimum P10 ΔE for a candidate to count as tail-strong.
    pub tail_veto_floor: f64,
    /// Multiplier on the tail floor that arms the tonal penalty.
    pub tonal_trigger_ratio: f64,
    /// Background chroma threshold, as a multiple of the foreground P75 chroma.
    pub vibration_chroma_ratio: f64,
    /// Magnitude of the flatness dampener.
    pub flatness_penalty_scale: f64,
    /// Width in degrees of the hue-harmony gaussian.
    pub harmony_sigma: f64,
    /// Reference raw-score standard deviation for budget derivation.
    pub raw_baseline_std: f64,
    /// Lower clamp on the aesthetic influence ratio.
    pub aesthetic_influence_min: f64,
    /// Upper clamp on the aesthetic influence ratio.
    pub aesthetic_influence_max: f64,
    /// Final stddev must stay within raw stddev times this factor.
    pub per_design_variance_guard: f64,
    /// Maximum absolute drift of the promotion rate across passes.
    pub promotion_drift_guard: f64,
    /// Cap on the foreground Lab sample size.
    pub max_samples: usize,
    /// Median-cut bucket count (power of two).
    pub dominant_color_count: usize,
    /// Optional per-hex market bias overrides, supplied by the catalog owner.
    pub market_overrides: HashMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            good_floor: 34.0,
            borderline_floor: 26.0,
            tail_veto_floor: 8.0,
            tonal_trigger_ratio: 1.8,
            vibration_chroma_ratio: 1.2,
            flatness_penalty_scale: 1.5,
            harmony_sigma: 25.0,
            raw_baseline_std: 7.42,
            aesthetic_influence_min: 1.15,
            aesthetic_influence_max: 1.30,
            per_design_variance_guard: 1.4,
            promotion_drift_guard: 0.05,
            max_samples: 10_000,
            dominant_color_count: 8,
            market_overrides: HashMap::new(),
        }
    }
}

impl ScoringConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a `[scoring]` table, falling back to defaults for missing keys.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let value: Value =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let table = value
            .get("scoring")
            .and_then(|v| v.as_table())
            .cloned()
            .unwrap_or_default();

        let defaults = Self::default();

        let float = |key: &str, fallback: f64| -> f64 {
            table
                .get(key)
                .and_then(|v| {
                    v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
                })
                .unwrap_or(fallback)
        };

        let good_floor = float("good_floor", defaults.good_floor);
        let borderline_floor = float("borderline_floor", defaults.borderline_floor);
        if borderline_floor > good_floor {
            return Err(ConfigError::Parse(
                "scoring.borderline_floor must not exceed scoring.good_floor".into(),
            ));
        }

        let aesthetic_influence_min =
            float("aesthetic_influence_min", defaults.aesthetic_influence_min);
        let aesthetic_influence_max =
            float("aesthetic_influence_max", defaults.aesthetic_influence_max);
        if aesthetic_influence_min > aesthetic_influence_max {
            return Err(ConfigError::Parse(
                "scoring.aesthetic_influence_min must not exceed aesthetic_influence_max".into(),
            ));
        }

        let raw_baseline_std = float("raw_baseline_std", defaults.raw_baseline_std);
        if !raw_baseline_std.is_finite() || raw_baseline_std <= 0.0 {
            return Err(ConfigError::Parse(
                "scoring.raw_baseline_std must be positive".into(),
            ));
        }

        let max_samples = table
            .get("max_samples")
            .and_then(|v| v.as_integer())
            .map(|v| v.max(1) as usize)
            .unwrap_or(defaults.max_samples);

        let dominant_color_count = table
            .get("dominant_color_count")
            .and_then(|v| v.as_integer())
            .map(|v| v.clamp(1, 64) as usize)
            .unwrap_or(defaults.dominant_color_count);

        let market_overrides = table
            .get("market_overrides")
            .and_then(|v| v.as_table())
            .map(|overrides| {
                overrides
                    .iter()
                    .filter_map(|(hex, v)| {
                        v.as_float()
                            .or_else(|| v.as_integer().map(|i| i as f64))
                            .map(|bias| (hex.clone(), bias))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            good_floor,
            borderline_floor,
            tail_veto_floor: float("tail_veto_floor", defaults.tail_veto_floor),
            tonal_trigger_ratio: float("tonal_trigger_ratio", defaults.tonal_trigger_ratio),
            vibration_chroma_ratio: float(
                "vibration_chroma_ratio",
                defaults.vibration_chroma_ratio,
            ),
            flatness_penalty_scale: float(
                "flatness_penalty_scale",
                defaults.flatness_penalty_scale,
            ),
            harmony_sigma: float("harmony_sigma", defaults.harmony_sigma),
            raw_baseline_std,
            aesthetic_influence_min,
            aesthetic_influence_max,
            per_design_variance_guard: float(
                "per_design_variance_guard",
                defaults.per_design_variance_guard,
            ),
            promotion_drift_guard: float("promotion_drift_guard", defaults.promotion_drift_guard),
            max_samples,
            dominant_color_count,
            market_overrides,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
