//! Two-pass scoring with distribution-aware aesthetic budgeting.
//!
//! Pass 1 computes the raw physics score for every candidate and measures the
//! slate's variance and promotion rate. From those the engine derives a
//! reward budget: the ceiling on positive aesthetic energy any single
//! candidate may receive. Pass 2 applies the aesthetic layers (harmony,
//! outline, flatness) and the commercial market bias, then re-checks the
//! distribution; if the final scores spread too far beyond the raw variance
//! or the promotion rate drifts, the aesthetic scale is decayed and the pass
//! retried, at most three times.
//!
//! The engine is pure and deterministic: fixed reduction order, no clocks,
//! no randomness. Candidates are evaluated independently (in parallel) and
//! reassembled in input order.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::analyzer::{DesignAnalyzer, RasterImage};
use crate::config::ScoringConfig;
use crate::evaluate::{ParseColorError, RawEvaluator, RawScore};
use crate::features::DesignFeatures;
use crate::market::market_bias;

const MAX_RETRIES: usize = 3;
const RETRY_SCALE_DECAY: f64 = 0.9;

/// Reward budget used by [`ScoringEngine::evaluate_one`], where no
/// distribution exists to derive one from.
const DEFAULT_SINGLE_BUDGET: f64 = 6.0;

const HARMONY_GAIN: f64 = 4.0;
const HARMONY_CONTRAST_NORM: f64 = 60.0;
/// Harmony beyond this is considered to already pay for the pairing, so the
/// market bias is halved to avoid double counting.
const HARMONY_DOUBLE_COUNT_CEILING: f64 = 2.0;

const OUTLINE_BG_L_CEILING: f64 = 15.0;
const OUTLINE_GAIN: f64 = 10.0;
const OUTLINE_CAP: f64 = 3.5;

const FLATNESS_CHROMA_SIGMA: f64 = 12.0;
const FLATNESS_L_CENTER: f64 = 60.0;
const FLATNESS_L_SIGMA: f64 = 30.0;
const FLATNESS_P10_NORM: f64 = 50.0;

const MARKET_SCALE: f64 = 2.0;

/// Three-tier suitability of a background for a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Suitability {
    /// Unsafe pairing; exclude or require an explicit override.
    Rejected,
    /// Acceptable with a warning.
    Passed,
    /// Safe to auto-include.
    Promoted,
}

impl std::fmt::Display for Suitability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suitability::Promoted => write!(f, "PROMOTED"),
            Suitability::Passed => write!(f, "PASSED"),
            Suitability::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Final per-background verdict.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// The evaluated background, as passed in.
    pub hex: String,
    pub p10_delta_e: f64,
    pub min_cluster_delta_e: f64,
    /// Physics score net of penalties (before aesthetics).
    pub raw_score: f64,
    /// Harmony + outline + flatness, after budget capping and scaling.
    pub aesthetic_total: f64,
    /// Commercial bias, after any double-count halving and budget capping.
    pub market_bonus: f64,
    /// Clamped composite in [0, 100].
    pub final_score: f64,
    pub suitability: Suitability,
    /// Set iff a safety override fired; surfaced verbatim to drivers.
    pub override_reason: Option<String>,
}

/// Orchestrates analysis, the raw pass, budgeting, and the final pass.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
    analyzer: DesignAnalyzer,
    evaluator: RawEvaluator,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            analyzer: DesignAnalyzer::new(config.clone()),
            evaluator: RawEvaluator::new(config.clone()),
            config,
        }
    }

    /// Run design analysis only, for callers that cache features per design.
    pub fn analyze_design(&self, image: &RasterImage) -> DesignFeatures {
        self.analyzer.analyze(image)
    }

    /// Analyze `image` and score every candidate background.
    pub fn score_image(
        &self,
        image: &RasterImage,
        candidate_hexes: &[String],
    ) -> Result<Vec<EvaluationResult>, ParseColorError> {
        let features = self.analyzer.analyze(image);
        self.score(&features, candidate_hexes)
    }

    /// Score every candidate background against analyzed features.
    ///
    /// The result vector is ordered like `candidate_hexes`. An unparseable
    /// hex fails the whole call; no partial slate is returned. An empty
    /// candidate list yields an empty vector.
    pub fn score(
        &self,
        features: &DesignFeatures,
        candidate_hexes: &[String],
    ) -> Result<Vec<EvaluationResult>, ParseColorError> {
        let n = candidate_hexes.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        // Pass 1: raw physics, fanned out per candidate. The collect keeps
        // input order, so the serial reductions below are reproducible.
        let raw_scores: Vec<RawScore> = candidate_hexes
            .par_iter()
            .map(|hex| self.evaluator.evaluate_raw(features, hex))
            .collect::<Result<_, _>>()?;

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut raw_promoted = 0usize;
        for raw in &raw_scores {
            let s = raw.net_raw();
            sum += s;
            sum_sq += s * s;
            if s >= self.config.good_floor {
                raw_promoted += 1;
            }
        }
        let mean_raw = sum / n as f64;
        let var_raw = sum_sq / n as f64 - mean_raw * mean_raw;
        let std_raw = if var_raw > 0.0 { var_raw.sqrt() } else { 0.0 };
        let raw_promotion_rate = raw_promoted as f64 / n as f64;

        // Budget: how much positive aesthetic energy the slate can absorb
        // without the aesthetics outvoting the physics.
        let effective_std = std_raw.max(self.config.raw_baseline_std * 0.7);
        let target_std = self.config.raw_baseline_std * 1.20;
        let influence_ratio = (target_std / effective_std).clamp(
            self.config.aesthetic_influence_min,
            self.config.aesthetic_influence_max,
        );
        let reward_budget = std_raw * influence_ratio;

        debug!(
            std_raw,
            raw_promotion_rate, reward_budget, "raw pass complete"
        );

        // Pass 2 with the stability loop.
        let mut aesthetic_scale = 1.0;
        let mut results: Vec<EvaluationResult> = Vec::new();
        for attempt in 0..=MAX_RETRIES {
            results = candidate_hexes
                .iter()
                .zip(raw_scores.iter())
                .map(|(hex, raw)| {
                    self.finalize(features, hex, raw, reward_budget, aesthetic_scale)
                })
                .collect();

            let mut sum_final = 0.0;
            let mut sum_sq_final = 0.0;
            let mut promoted = 0usize;
            for res in &results {
                sum_final += res.final_score;
                sum_sq_final += res.final_score * res.final_score;
                if res.suitability == Suitability::Promoted {
                    promoted += 1;
                }
            }
            let mean_final = sum_final / n as f64;
            let var_final = sum_sq_final / n as f64 - mean_final * mean_final;
            let std_final = if var_final > 0.0 { var_final.sqrt() } else { 0.0 };
            let promotion_rate = promoted as f64 / n as f64;

            let variance_violation = std_final > std_raw * self.config.per_design_variance_guard;
            let drift_violation = (promotion_rate - raw_promotion_rate).abs()
                > self.config.promotion_drift_guard;

            if (variance_violation || drift_violation) && attempt < MAX_RETRIES {
                if variance_violation {
                    let correction =
                        (std_raw * self.config.per_design_variance_guard) / std_final;
                    aesthetic_scale *= RETRY_SCALE_DECAY.min(correction);
                    debug!(attempt, std_final, aesthetic_scale, "variance guard tripped");
                } else {
                    aesthetic_scale *= RETRY_SCALE_DECAY;
                    debug!(attempt, promotion_rate, aesthetic_scale, "promotion drift tripped");
                }
                continue;
            }
            break;
        }

        Ok(results)
    }

    /// Score a single background without distribution context.
    ///
    /// Uses `aesthetic_scale = 1.0` and a fixed reward budget of 6.0; meant
    /// for tests and spot checks, not production ranking.
    pub fn evaluate_one(
        &self,
        features: &DesignFeatures,
        hex: &str,
    ) -> Result<EvaluationResult, ParseColorError> {
        let raw = self.evaluator.evaluate_raw(features, hex)?;
        Ok(self.finalize(features, hex, &raw, DEFAULT_SINGLE_BUDGET, 1.0))
    }

    fn finalize(
        &self,
        features: &DesignFeatures,
        hex: &str,
        raw: &RawScore,
        reward_budget: f64,
        aesthetic_scale: f64,
    ) -> EvaluationResult {
        if features.is_degenerate() {
            return EvaluationResult {
                hex: hex.to_string(),
                p10_delta_e: 0.0,
                min_cluster_delta_e: 0.0,
                raw_score: 0.0,
                aesthetic_total: 0.0,
                market_bonus: 0.0,
                final_score: 0.0,
                suitability: Suitability::Rejected,
                override_reason: Some("DEGENERATE".to_string()),
            };
        }

        let net_raw = raw.net_raw();

        // Harmony only rewards pairings the penalties did not flag.
        let mut harmony = 0.0;
        if raw.tonal_penalty == 0.0 && raw.vibration_penalty == 0.0 {
            let t = raw.min_hue_distance / self.config.harmony_sigma;
            let hue_factor = (-(t * t)).exp();
            let contrast_confidence = (raw.raw_contrast / HARMONY_CONTRAST_NORM).min(1.0);
            harmony = HARMONY_GAIN * hue_factor * contrast_confidence;
        }

        // Near-black garments make outlined artwork pop.
        let mut outline = 0.0;
        if raw.bg_lab.l < OUTLINE_BG_L_CEILING {
            outline = (OUTLINE_GAIN * features.white_black_edge_ratio).min(OUTLINE_CAP);
        }

        // Flat mid-gray backgrounds with a weak contrast tail read lifeless.
        let chroma_t = raw.bg_chroma / FLATNESS_CHROMA_SIGMA;
        let chroma_risk = (-(chroma_t * chroma_t)).exp();
        let l_t = (raw.bg_lab.l - FLATNESS_L_CENTER) / FLATNESS_L_SIGMA;
        let l_risk = (-(l_t * l_t)).exp();
        let norm_p10 = (raw.p10_delta_e / FLATNESS_P10_NORM).min(1.0);
        let flatness =
            -self.config.flatness_penalty_scale * chroma_risk * l_risk * (1.0 - norm_p10);

        let mut market = match self.config.market_overrides.get(hex) {
            Some(&bias) => MARKET_SCALE * bias,
            None => MARKET_SCALE * market_bias(raw.bg_lab),
        };
        if harmony > HARMONY_DOUBLE_COUNT_CEILING {
            market *= 0.5;
        }

        // Positive energy cannot exceed the slate's reward budget. The
        // dampener and a negative market bias are exempt: safety pressure is
        // never scaled down.
        let positives = harmony + outline + market.max(0.0);
        if positives > reward_budget {
            let factor = if positives > 0.0 {
                (reward_budget / positives).max(0.0)
            } else {
                0.0
            };
            harmony *= factor;
            outline *= factor;
            if market > 0.0 {
                market *= factor;
            }
        }

        let aesthetic_total = (harmony + outline + flatness) * aesthetic_scale;
        let final_score = (net_raw + aesthetic_total + market).clamp(0.0, 100.0);

        let tail_strong = raw.p10_delta_e >= self.config.tail_veto_floor;
        let suitability = if final_score >= self.config.good_floor {
            if tail_strong {
                Suitability::Promoted
            } else {
                Suitability::Passed
            }
        } else if final_score >= self.config.borderline_floor {
            if tail_strong {
                Suitability::Passed
            } else {
                Suitability::Rejected
            }
        } else {
            Suitability::Rejected
        };

        EvaluationResult {
            hex: hex.to_string(),
            p10_delta_e: raw.p10_delta_e,
            min_cluster_delta_e: raw.min_cluster_delta_e,
            raw_score: net_raw,
            aesthetic_total,
            market_bonus: market,
            final_score,
            suitability,
            override_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgb: [u8; 3]) -> DesignFeatures {
        let img = RasterImage::filled(64, 64, [rgb[0], rgb[1], rgb[2], 255]);
        ScoringEngine::default().analyze_design(&img)
    }

    #[test]
    fn empty_candidate_list_yields_empty_results() {
        let engine = ScoringEngine::default();
        let features = solid([255, 255, 255]);
        assert!(engine.score(&features, &[]).unwrap().is_empty());
    }

    #[test]
    fn results_follow_input_order() {
        let engine = ScoringEngine::default();
        let features = solid([255, 255, 255]);
        let hexes: Vec<String> = ["#000000", "#FFFFFF", "#7A7F79"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = engine.score(&features, &hexes).unwrap();
        let out: Vec<&str> = results.iter().map(|r| r.hex.as_str()).collect();
        assert_eq!(out, vec!["#000000", "#FFFFFF", "#7A7F79"]);
    }

    #[test]
    fn invalid_hex_fails_the_whole_call() {
        let engine = ScoringEngine::default();
        let features = solid([255, 255, 255]);
        let hexes: Vec<String> = ["#000000", "oops"].iter().map(|s| s.to_string()).collect();
        assert!(engine.score(&features, &hexes).is_err());
    }

    #[test]
    fn scores_stay_in_range_and_deterministic() {
        let engine = ScoringEngine::default();
        let features = solid([200, 30, 90]);
        let hexes: Vec<String> = [
            "#000000", "#FFFFFF", "#A80D27", "#263040", "#7A7F79", "#f57caf", "#03b2d3",
            "#846b5b",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let first = engine.score(&features, &hexes).unwrap();
        let second = engine.score(&features, &hexes).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(a.final_score >= 0.0 && a.final_score <= 100.0);
            assert_eq!(a.final_score.to_bits(), b.final_score.to_bits());
            assert_eq!(a.suitability, b.suitability);
        }
    }

    #[test]
    fn single_candidate_slate_has_zero_budget() {
        // With N = 1 the raw stddev is zero, so the budget collapses and no
        // positive aesthetic energy survives.
        let engine = ScoringEngine::default();
        let features = solid([255, 255, 255]);
        let results = engine
            .score(&features, &["#000000".to_string()])
            .unwrap();
        let res = &results[0];
        assert_eq!(res.aesthetic_total, 0.0);
        assert_eq!(res.market_bonus, 0.0);
        // Physics alone still saturates the scale here
        assert_eq!(res.final_score, 100.0);
        assert_eq!(res.suitability, Suitability::Promoted);
    }

    #[test]
    fn evaluate_one_uses_default_budget() {
        let engine = ScoringEngine::default();
        let features = solid([0, 0, 0]);
        let res = engine.evaluate_one(&features, "#FFFFFF").unwrap();
        // Black on white: huge physics, small positive market bias allowed
        assert!(res.final_score >= 90.0, "final {}", res.final_score);
        assert_eq!(res.suitability, Suitability::Promoted);
        assert!(res.market_bonus > 0.0);
    }

    #[test]
    fn degenerate_design_rejects_every_candidate() {
        let engine = ScoringEngine::default();
        let features = DesignFeatures::degenerate(4096, 1.0);
        let hexes: Vec<String> = ["#000000", "#FFFFFF"].iter().map(|s| s.to_string()).collect();
        for res in engine.score(&features, &hexes).unwrap() {
            assert_eq!(res.final_score, 0.0);
            assert_eq!(res.suitability, Suitability::Rejected);
            assert_eq!(res.override_reason.as_deref(), Some("DEGENERATE"));
        }
    }

    #[test]
    fn classification_respects_tail_strength() {
        let engine = ScoringEngine::default();
        let features = solid([255, 255, 255]);
        let results = engine
            .score(
                &features,
                &["#000000".to_string(), "#FFFFFF".to_string()],
            )
            .unwrap();
        // Black: strong tail, high score
        assert_eq!(results[0].suitability, Suitability::Promoted);
        assert!(results[0].p10_delta_e >= 8.0);
        // White on white: no tail, no score
        assert_eq!(results[1].suitability, Suitability::Rejected);
        assert!(results[1].p10_delta_e < 8.0);
    }

    #[test]
    fn market_override_supersedes_formula() {
        let mut config = ScoringConfig::default();
        config
            .market_overrides
            .insert("#000000".to_string(), -2.0);
        let engine = ScoringEngine::new(config);
        let features = solid([255, 255, 255]);
        let res = engine.evaluate_one(&features, "#000000").unwrap();
        // Override is scaled like the formula output and never budget-capped
        // when negative
        assert_eq!(res.market_bonus, -4.0);

        let baseline = ScoringEngine::default()
            .evaluate_one(&features, "#000000")
            .unwrap();
        assert!(res.final_score <= baseline.final_score);
    }

    #[test]
    fn positive_cap_scales_all_positive_terms() {
        // Outlined white-on-black art: harmony 0, outline 3.5, market > 0.
        // With the tiny evaluate_one budget all positives shrink together.
        let img = RasterImage::from_fn(200, 200, |x, y| {
            let m = x % 10;
            if (2..=7).contains(&m) && (20..180).contains(&y) {
                if m == 2 || m == 7 || y == 20 || y == 179 {
                    [0, 0, 0, 255]
                } else {
                    [255, 255, 255, 255]
                }
            } else {
                [0, 0, 0, 0]
            }
        });
        let engine = ScoringEngine::default();
        let features = engine.analyze_design(&img);
        let res = engine.evaluate_one(&features, "#1a1a2e").unwrap();
        // Outline boost plus market bias stay under the 6.0 budget
        assert!(res.aesthetic_total > 0.0);
        assert!(res.aesthetic_total + res.market_bonus.max(0.0) <= 6.0 + 1e-9);
    }

    #[test]
    fn suitability_ordering_supports_override_monotonicity() {
        assert!(Suitability::Rejected < Suitability::Passed);
        assert!(Suitability::Passed < Suitability::Promoted);
    }
}
