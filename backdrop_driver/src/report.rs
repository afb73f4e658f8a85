//! Human-readable recommendation report.

use backdrop_core::{EvaluationResult, ScoringConfig, Suitability};

use crate::catalog;

/// Per-design report: tiered listing plus the rank-stability summary.
pub fn print_design_report(design_name: &str, results: &[EvaluationResult]) -> f64 {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Design: {}", design_name);

    let mut ranked: Vec<&EvaluationResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());

    for (tier, title) in [
        (Suitability::Promoted, "BEST (Promoted)"),
        (Suitability::Passed, "ACCEPTABLE (Passed)"),
        (Suitability::Rejected, "AVOID (Rejected)"),
    ] {
        println!("\n{}:", title);
        let mut any = false;
        for res in ranked.iter().filter(|r| r.suitability == tier) {
            any = true;
            let name = catalog::name_of(&res.hex).unwrap_or("?");
            println!(
                "  - {:<12} (Final: {:5.1} | P10: {:5.1} | Raw: {:6.1} | Aesthetic: {:+5.2} | Market: {:+5.2}){}",
                name,
                res.final_score,
                res.p10_delta_e,
                res.raw_score,
                res.aesthetic_total,
                res.market_bonus,
                res.override_reason
                    .as_deref()
                    .map(|r| format!(" [{}]", r))
                    .unwrap_or_default()
            );
        }
        if !any {
            println!("  (None)");
        }
    }

    let promoted = count_tier(results, Suitability::Promoted);
    let passed = count_tier(results, Suitability::Passed);
    let rejected = count_tier(results, Suitability::Rejected);
    println!("\nDistribution: {} promoted, {} passed, {} rejected", promoted, passed, rejected);

    let rho = spearman_rank_correlation(results);
    println!("[Stability] Spearman rho (final vs raw): {:.3}", rho);
    rho
}

/// Distribution of the market bias over the distinct catalog hexes.
///
/// The bias is background-intrinsic, so each hex contributes one value no
/// matter how many designs were scored. A healthy catalog sits with its mean
/// near zero and no runaway tails.
pub fn print_market_distribution(all_results: &[EvaluationResult]) {
    let stats = match market_bias_stats(all_results) {
        Some(stats) => stats,
        None => return,
    };
    println!("═══════════════════════════════════════════════════════");
    println!("  MARKET BIAS DISTRIBUTION (unique hexes = {})", stats.count);
    println!(
        "  Min: {:+5.2} | Max: {:+5.2} | Mean: {:+5.2} | StdDev: {:.3}",
        stats.min, stats.max, stats.mean, stats.std_dev
    );
    println!("═══════════════════════════════════════════════════════");
}

pub struct MarketBiasStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Market-bias statistics over distinct hexes, or `None` for empty input.
fn market_bias_stats(all_results: &[EvaluationResult]) -> Option<MarketBiasStats> {
    let mut seen: Vec<&str> = Vec::new();
    let mut biases: Vec<f64> = Vec::new();
    for res in all_results {
        if seen.iter().any(|hex| hex.eq_ignore_ascii_case(&res.hex)) {
            continue;
        }
        seen.push(&res.hex);
        biases.push(res.market_bonus);
    }
    if biases.is_empty() {
        return None;
    }

    let n = biases.len() as f64;
    let mean = biases.iter().sum::<f64>() / n;
    let var = biases.iter().map(|b| (b - mean) * (b - mean)).sum::<f64>() / n;
    Some(MarketBiasStats {
        count: biases.len(),
        min: biases.iter().cloned().fold(f64::INFINITY, f64::min),
        max: biases.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        mean,
        std_dev: var.sqrt(),
    })
}

/// Aggregate across every scored design.
pub fn print_global_summary(
    all_results: &[EvaluationResult],
    spearman_values: &[f64],
    config: &ScoringConfig,
) {
    if all_results.is_empty() {
        return;
    }
    let n = all_results.len() as f64;
    let mean = all_results.iter().map(|r| r.final_score).sum::<f64>() / n;
    let var = all_results
        .iter()
        .map(|r| (r.final_score - mean) * (r.final_score - mean))
        .sum::<f64>()
        / n;
    let std_dev = var.sqrt();

    let promoted = count_tier(all_results, Suitability::Promoted);
    let passed = count_tier(all_results, Suitability::Passed);
    let rejected = count_tier(all_results, Suitability::Rejected);

    let raw_promoted = all_results
        .iter()
        .filter(|r| r.raw_score >= config.good_floor)
        .count();
    let drift = (promoted as f64 - raw_promoted as f64) / n * 100.0;

    let avg_rho = if spearman_values.is_empty() {
        1.0
    } else {
        spearman_values.iter().sum::<f64>() / spearman_values.len() as f64
    };

    println!("═══════════════════════════════════════════════════════");
    println!("  GLOBAL AGGREGATE (N = {})", all_results.len());
    println!("═══════════════════════════════════════════════════════");
    println!("  Final score mean  : {:.2}", mean);
    println!(
        "  Final score stddev: {:.2} (raw baseline: {:.2})",
        std_dev, config.raw_baseline_std
    );
    println!(
        "  Promoted {} ({:.1}%) [drift {:+.1}%] | Passed {} | Rejected {}",
        promoted,
        promoted as f64 / n * 100.0,
        drift,
        passed,
        rejected
    );
    println!("  Rank stability (rho): {:.3} (target > 0.85)", avg_rho);
}

fn count_tier(results: &[EvaluationResult], tier: Suitability) -> usize {
    results.iter().filter(|r| r.suitability == tier).count()
}

/// Spearman rank correlation between the raw and final orderings.
pub fn spearman_rank_correlation(results: &[EvaluationResult]) -> f64 {
    let n = results.len();
    if n <= 1 {
        return 1.0;
    }
    let ranks = |key: fn(&EvaluationResult) -> f64| -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| key(&results[b]).partial_cmp(&key(&results[a])).unwrap());
        let mut out = vec![0usize; n];
        for (rank, &idx) in order.iter().enumerate() {
            out[idx] = rank + 1;
        }
        out
    };
    let raw = ranks(|r| r.raw_score);
    let fin = ranks(|r| r.final_score);
    let d_sq: f64 = raw
        .iter()
        .zip(fin.iter())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();
    1.0 - (6.0 * d_sq) / (n as f64 * (n as f64 * n as f64 - 1.0))
}
