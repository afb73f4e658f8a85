//! CLI driver for the background scoring engine.
//!
//! Scores every design image found on the command line (or under `designs/`)
//! against the full garment catalog and prints a ranked recommendation
//! report, a determinism audit, and a global stability summary.

mod audit;
mod catalog;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use backdrop_core::{
    EvaluationResult, RasterImage, ScoringConfig, ScoringEngine, Suitability,
    SCORING_MODEL_VERSION,
};
use tracing::{info, warn};

const DESIGNS_DIR: &str = "designs";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    let engine = ScoringEngine::new(config.clone());
    let hexes = catalog::catalog_hexes();

    let design_files = find_design_files()?;
    if design_files.is_empty() {
        bail!("no designs found; pass image paths or place files under {}/", DESIGNS_DIR);
    }

    println!("═══════════════════════════════════════════════════════");
    println!("  BACKGROUND RECOMMENDER — model {}", SCORING_MODEL_VERSION);
    println!("═══════════════════════════════════════════════════════");
    println!("Promoted >= {} | Passed >= {}", config.good_floor, config.borderline_floor);

    audit_determinism(&engine, &design_files[0], &hexes)?;

    let mut all_results: Vec<EvaluationResult> = Vec::new();
    let mut spearman_values: Vec<f64> = Vec::new();

    for path in &design_files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let image = match load_image(path) {
            Ok(img) => img,
            Err(err) => {
                warn!("skipping {}: {:#}", name, err);
                continue;
            }
        };

        let results = engine
            .score_image(&image, &hexes)
            .with_context(|| format!("scoring {}", name))?;

        let rho = report::print_design_report(&name, &results);
        let promoted = results
            .iter()
            .filter(|r| r.suitability == Suitability::Promoted)
            .count();
        if let Err(err) = audit::log_design_run(&name, &results, promoted, rho) {
            warn!("audit log write failed: {}", err);
        }

        spearman_values.push(rho);
        all_results.extend(results);
    }

    report::print_market_distribution(&all_results);
    report::print_global_summary(&all_results, &spearman_values, &config);
    Ok(())
}

fn load_config() -> ScoringConfig {
    match ScoringConfig::load_from_file("config/scoring.toml") {
        Ok(config) => {
            info!("loaded config/scoring.toml");
            config
        }
        Err(err) => {
            info!("using default scoring config ({})", err);
            ScoringConfig::default()
        }
    }
}

/// Decode any supported image format into the engine's RGBA raster.
fn load_image(path: &Path) -> Result<RasterImage> {
    let decoded = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<[u8; 4]> = rgba.pixels().map(|p| p.0).collect();
    Ok(RasterImage::new(width as usize, height as usize, pixels))
}

fn find_design_files() -> Result<Vec<PathBuf>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args
            .into_iter()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .collect());
    }

    let dir = Path::new(DESIGNS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Score the first design twice and require bit-identical output.
fn audit_determinism(engine: &ScoringEngine, path: &Path, hexes: &[String]) -> Result<()> {
    println!("\n[Audit] checking determinism on {} ...", path.display());
    let image = load_image(path)?;
    let features = engine.analyze_design(&image);
    let first = engine.score(&features, hexes)?;
    let second = engine.score(&features, hexes)?;

    let mut mismatches = 0usize;
    for (a, b) in first.iter().zip(second.iter()) {
        if a.final_score.to_bits() != b.final_score.to_bits() {
            eprintln!("  MISMATCH {}: {} vs {}", a.hex, a.final_score, b.final_score);
            mismatches += 1;
        }
    }
    if mismatches > 0 {
        bail!("determinism audit failed with {} mismatches", mismatches);
    }
    println!("  determinism check passed ({} candidates)", first.len());
    Ok(())
}
