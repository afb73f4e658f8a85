//! # Backdrop Core
//!
//! A deterministic Rust engine that scores how well solid garment background
//! colors pair with a piece of foreground artwork. Given one design (an RGBA
//! raster) and N candidate background hex codes, it returns for each candidate
//! a final score in [0, 100], a three-level suitability class, and the
//! diagnostic components behind the score.
//!
//! Scoring runs in two phases:
//!
//! 1. **Design analysis** — one-shot feature extraction: downsampling,
//!    alpha segmentation, CIELAB conversion, median-cut dominant colors,
//!    luminance statistics, Sobel edge metrics, and deterministic edge-biased
//!    pixel sampling.
//! 2. **Per-background evaluation** — a raw perceptual score from CIEDE2000
//!    deltas, then a distribution-aware pass that budgets aesthetic and
//!    commercial adjustments against the variance of the raw slate, with
//!    stability guards and a bounded retry loop.
//!
//! ## Quick Start
//!
//! ```rust
//! use backdrop_core::{RasterImage, ScoringEngine};
//!
//! // A 4x4 solid white design, fully opaque
//! let image = RasterImage::filled(4, 4, [255, 255, 255, 255]);
//!
//! let engine = ScoringEngine::default();
//! let results = engine.score_image(&image, &["#000000".into(), "#FFFFFF".into()]).unwrap();
//!
//! assert!(results[0].final_score > results[1].final_score);
//! ```
//!
//! ## Core Modules
//!
//! - [`config`] - Scoring thresholds and constants, loadable from TOML
//! - [`color`] - sRGB ↔ CIELAB conversion and CIEDE2000 distance
//! - [`analyzer`] - Per-design feature extraction
//! - [`engine`] - Two-pass scoring with stability guards

pub mod analyzer;
pub mod color;
pub mod config;
pub mod engine;
pub mod evaluate;
pub mod features;
pub mod market;
pub mod quantize;

pub use analyzer::{DesignAnalyzer, RasterImage};
pub use color::{ciede2000, relative_luminance, srgb_to_lab, Lab};
pub use config::{ConfigError, ScoringConfig, SCORING_MODEL_VERSION};
pub use engine::{EvaluationResult, ScoringEngine, Suitability};
pub use evaluate::{parse_hex, ParseColorError, RawEvaluator, RawScore};
pub use features::{DesignFeatures, DominantColor};
pub use market::market_bias;
pub use quantize::quantize;
