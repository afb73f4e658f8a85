/// Demonstration of the background scoring pipeline
///
/// This example shows how to:
/// 1. Build a design raster and analyze it
/// 2. Score it against a garment color slate
/// 3. Interpret the tiered recommendation output
use backdrop_core::config::ConfigError;
use backdrop_core::{
    RasterImage, ScoringConfig, ScoringEngine, Suitability, SCORING_MODEL_VERSION,
};

const SLATE: [(&str, &str); 10] = [
    ("White", "#ffffff"),
    ("Butter", "#F5E1A4"),
    ("Grey", "#7A7F79"),
    ("Sapphire", "#03b2d3"),
    ("Graphite", "#373231"),
    ("Black", "#000000"),
    ("Navy", "#263040"),
    ("Neon Pink", "#f57caf"),
    ("Chili", "#853F44"),
    ("Red", "#A80D27"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let engine = ScoringEngine::new(config);
    println!("=== Background Scoring Demo (model {}) ===\n", SCORING_MODEL_VERSION);

    // A white glyph with a thin black outline on a transparent canvas --
    // the classic print-on-demand sticker shape.
    let design = RasterImage::from_fn(240, 240, |x, y| {
        let m = x % 12;
        if (3..=8).contains(&m) && (30..210).contains(&y) {
            if m == 3 || m == 8 || y == 30 || y == 209 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            }
        } else {
            [0, 0, 0, 0]
        }
    });

    let features = engine.analyze_design(&design);
    println!(
        "Design: {} foreground px / {} total, transparency {:.2}, edge density {:.2}",
        features.foreground_pixel_count,
        features.total_pixel_count,
        features.transparency_ratio,
        features.edge_density
    );
    println!(
        "Dominants: {}",
        features
            .dominant_colors
            .iter()
            .map(|d| format!("#{:02X}{:02X}{:02X} ({:.0}%)", d.r, d.g, d.b, d.weight * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let hexes: Vec<String> = SLATE.iter().map(|(_, hex)| hex.to_string()).collect();
    let mut results = engine.score(&features, &hexes)?;
    results.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());

    for tier in [Suitability::Promoted, Suitability::Passed, Suitability::Rejected] {
        println!("\n{}:", tier);
        for res in results.iter().filter(|r| r.suitability == tier) {
            let name = SLATE
                .iter()
                .find(|(_, hex)| *hex == res.hex)
                .map(|(name, _)| *name)
                .unwrap_or("?");
            println!(
                "  {:<10} {}  final {:5.1} | raw {:6.1} | p10 {:5.1} | aesthetic {:+5.2} | market {:+5.2}",
                name, res.hex, res.final_score, res.raw_score, res.p10_delta_e,
                res.aesthetic_total, res.market_bonus
            );
        }
    }

    Ok(())
}

fn load_config() -> Result<ScoringConfig, ConfigError> {
    ScoringConfig::load_from_file("config/scoring.toml").or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        Ok(ScoringConfig::default())
    })
}
