//! Background-intrinsic commercial bias.
//!
//! Apparel buyers do not sample garment colors uniformly: neutrals and dark
//! mid-tones dominate sales, saturated novelty colors trail. This module
//! scores that prior from the background Lab alone, independent of any
//! design. The blend is deliberately smooth — every term is a gaussian or a
//! chroma-gated ramp — so a one-step sweep in L* or hue never jumps by more
//! than half a point.
//!
//! The output is clamped to [-2, 2]; the engine scales it by 2 and may halve
//! it when the harmony reward already pays for the same pairing. Catalog
//! overrides supersede the formula per hex.

use crate::color::{hue_distance, Lab};

/// Hard range of the bias formula.
pub const MARKET_BIAS_MIN: f64 = -2.0;
pub const MARKET_BIAS_MAX: f64 = 2.0;

/// Centering offset so the catalog-wide mean sits near zero.
const CENTERING_OFFSET: f64 = 0.35;

const NEUTRAL_GAIN: f64 = 0.75;
const NEUTRAL_CHROMA_SIGMA: f64 = 28.0;

const MID_TONE_GAIN: f64 = 0.30;
const MID_TONE_CENTER: f64 = 52.0;
const MID_TONE_SIGMA: f64 = 26.0;

const VIBRANCY_FLOOR: f64 = 30.0;
const VIBRANCY_SLOPE: f64 = 0.03;
const RED_PROTECTION_HUE: f64 = 30.0;
const RED_PROTECTION_SIGMA: f64 = 28.0;
const RED_PROTECTION_STRENGTH: f64 = 0.85;

const HUE_CONFIDENCE_CHROMA: f64 = 25.0;

const DARK_VERSATILITY_GAIN: f64 = 0.35;
const DARK_VERSATILITY_CENTER: f64 = 16.0;
const DARK_VERSATILITY_SIGMA: f64 = 20.0;
const LIGHT_VERSATILITY_GAIN: f64 = 0.15;
const LIGHT_VERSATILITY_CENTER: f64 = 92.0;
const LIGHT_VERSATILITY_SIGMA: f64 = 12.0;

fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let t = (x - center) / sigma;
    (-(t * t)).exp()
}

/// Commercial bias of a background color, in [-2, 2].
pub fn market_bias(bg: Lab) -> f64 {
    let chroma = bg.chroma();
    let hue = bg.hue_degrees();

    // Neutrals sell across the whole catalog
    let neutral = NEUTRAL_GAIN * gaussian(chroma, 0.0, NEUTRAL_CHROMA_SIGMA);

    // Mid-lightness garments flatter most artwork
    let mid_tone = MID_TONE_GAIN * gaussian(bg.l, MID_TONE_CENTER, MID_TONE_SIGMA);

    // Saturation beyond the floor reads as novelty; classic reds are exempt
    let red_protection = gaussian(hue_distance(hue, RED_PROTECTION_HUE), 0.0, RED_PROTECTION_SIGMA);
    let vibrancy = -VIBRANCY_SLOPE
        * (chroma - VIBRANCY_FLOOR).max(0.0)
        * (1.0 - RED_PROTECTION_STRENGTH * red_protection);

    // Hue band preferences, weighted by how chromatic the color really is
    let hue_confidence = (chroma / HUE_CONFIDENCE_CHROMA).min(1.0);
    let band_preference = if (200.0..=260.0).contains(&hue) {
        0.3
    } else if (30.0..=70.0).contains(&hue) {
        0.2
    } else if (300.0..=340.0).contains(&hue) {
        -0.2
    } else {
        0.0
    };
    let band = band_preference * hue_confidence;

    // Very dark and very light garments pair with the widest design range
    let versatility = DARK_VERSATILITY_GAIN
        * gaussian(bg.l, DARK_VERSATILITY_CENTER, DARK_VERSATILITY_SIGMA)
        + LIGHT_VERSATILITY_GAIN * gaussian(bg.l, LIGHT_VERSATILITY_CENTER, LIGHT_VERSATILITY_SIGMA);

    let bias = neutral + mid_tone + vibrancy + band + versatility - CENTERING_OFFSET;
    bias.clamp(MARKET_BIAS_MIN, MARKET_BIAS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::srgb_to_lab;
    use crate::evaluate::parse_hex;

    fn bias_of(hex: &str) -> f64 {
        let (r, g, b) = parse_hex(hex).unwrap();
        market_bias(srgb_to_lab(r, g, b))
    }

    #[test]
    fn anchor_colors_land_in_expected_bands() {
        // Catalog staples stay positive
        let black = bias_of("#000000");
        assert!(black > 0.0 && black < 1.0, "black bias {}", black);
        let navy = bias_of("#263040");
        assert!(navy > 0.0 && navy < 1.0, "navy bias {}", navy);
        let grey = bias_of("#7A7F79");
        assert!(grey > 0.0 && grey < 1.0, "grey bias {}", grey);

        // Neon pink is penalized hard
        let neon_pink = bias_of("#f57caf");
        assert!(neon_pink < -0.3, "neon pink bias {}", neon_pink);

        // Saturated classic red is protected from the vibrancy penalty
        let red = bias_of("#A80D27");
        assert!(red > -2.0 && red < 0.5, "red bias {}", red);
    }

    #[test]
    fn output_is_always_clamped() {
        // Deterministic sweep over the Lab envelope, including points well
        // outside the sRGB gamut
        for i in 0..200u32 {
            let l = (i as f64 * 37.0) % 140.0 - 20.0;
            let a = (i as f64 * 53.0) % 256.0 - 128.0;
            let b = (i as f64 * 71.0) % 256.0 - 128.0;
            let bias = market_bias(Lab::new(l, a, b));
            assert!(
                (MARKET_BIAS_MIN..=MARKET_BIAS_MAX).contains(&bias),
                "bias {} out of range for ({}, {}, {})",
                bias,
                l,
                a,
                b
            );
        }
    }

    #[test]
    fn lightness_sweep_is_smooth() {
        let mut prev = market_bias(Lab::new(0.0, 0.0, 0.0));
        for l in 1..=100 {
            let cur = market_bias(Lab::new(l as f64, 0.0, 0.0));
            assert!(
                (cur - prev).abs() <= 0.5,
                "jump at L = {}: {} -> {}",
                l,
                prev,
                cur
            );
            prev = cur;
        }
    }

    #[test]
    fn hue_sweep_is_smooth_at_high_chroma() {
        let mut prev: Option<f64> = None;
        for h in 0..=360 {
            let rad = (h as f64).to_radians();
            let cur = market_bias(Lab::new(50.0, 50.0 * rad.cos(), 50.0 * rad.sin()));
            if let Some(p) = prev {
                assert!(
                    (cur - p).abs() <= 0.5,
                    "jump at hue {}: {} -> {}",
                    h,
                    p,
                    cur
                );
            }
            prev = Some(cur);
        }
    }

    #[test]
    fn neutrals_beat_equivalent_saturated_colors() {
        let grey = market_bias(Lab::new(50.0, 0.0, 0.0));
        let vivid = market_bias(Lab::new(50.0, 60.0, -60.0));
        assert!(grey > vivid);
    }
}
