//! Deterministic color space conversions and perceptual distance.
//!
//! Provides fixed-parameter sRGB → CIELAB conversion using the CIE 1931 2°
//! standard observer and D65 illuminant, WCAG relative luminance, and the full
//! CIEDE2000 color difference per Sharma, Wu, Dalal (2005). Everything is
//! computed in IEEE-754 double precision with analytic transforms only, so
//! identical inputs produce bit-identical outputs on every platform.

use serde::{Deserialize, Serialize};

const D65_WHITE_POINT: [f64; 3] = [0.95047, 1.0, 1.08883];
const LAB_EPSILON: f64 = 0.008856;
const LAB_KAPPA: f64 = 903.3;
const POW7_25: f64 = 6103515625.0; // 25^7

/// A color in CIELAB coordinates (D65).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    /// Lightness, nominally 0..=100
    pub l: f64,
    /// Green-red opponent axis
    pub a: f64,
    /// Blue-yellow opponent axis
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma magnitude C* = sqrt(a² + b²).
    #[inline]
    pub fn chroma(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Hue angle in degrees, wrapped to [0, 360).
    ///
    /// Near-neutral colors (chroma ≈ 0) report an angle of 0; callers that
    /// care must gate on [`Lab::chroma`] first.
    #[inline]
    pub fn hue_degrees(&self) -> f64 {
        let h = self.b.atan2(self.a).to_degrees();
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    }
}

/// Expand one gamma-encoded sRGB channel in [0, 1] to linear light.
#[inline]
fn gamma_expand(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

/// Convert an 8-bit sRGB triple to CIELAB under the D65 illuminant.
pub fn srgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let rl = gamma_expand(r as f64 / 255.0);
    let gl = gamma_expand(g as f64 / 255.0);
    let bl = gamma_expand(b as f64 / 255.0);

    // Linear RGB -> XYZ, ITU-R BT.709 primaries
    let x = 0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl;
    let y = 0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl;
    let z = 0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl;

    let fx = lab_f(x / D65_WHITE_POINT[0]);
    let fy = lab_f(y / D65_WHITE_POINT[1]);
    let fz = lab_f(z / D65_WHITE_POINT[2]);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// WCAG relative luminance of an 8-bit sRGB triple, in [0, 1].
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * gamma_expand(r as f64 / 255.0)
        + 0.7152 * gamma_expand(g as f64 / 255.0)
        + 0.0722 * gamma_expand(b as f64 / 255.0)
}

/// Smallest circular distance between two hue angles in degrees.
#[inline]
pub fn hue_distance(h1: f64, h2: f64) -> f64 {
    let d = (h1 - h2).abs() % 360.0;
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

fn hue_angle(b: f64, a_prime: f64) -> f64 {
    let h = b.atan2(a_prime);
    if h < 0.0 {
        h + 2.0 * std::f64::consts::PI
    } else {
        h
    }
}

/// CIEDE2000 color difference ΔE₀₀ between two Lab colors.
///
/// Full formulation per Sharma, Wu, Dalal (2005), including the G chroma
/// rescaling, hue rotation term, and the C1'·C2' = 0 guard. Always ≥ 0 and
/// symmetric in its arguments.
pub fn ciede2000(x: Lab, y: Lab) -> f64 {
    use std::f64::consts::PI;

    let l_bar = (x.l + y.l) / 2.0;
    let c1 = x.chroma();
    let c2 = y.chroma();
    let c_bar = (c1 + c2) / 2.0;

    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + POW7_25)).sqrt());

    let a1p = x.a * (1.0 + g);
    let a2p = y.a * (1.0 + g);

    let c1p = (a1p * a1p + x.b * x.b).sqrt();
    let c2p = (a2p * a2p + y.b * y.b).sqrt();
    let c_bar_p = (c1p + c2p) / 2.0;
    let dc_p = c2p - c1p;

    let h1p = hue_angle(x.b, a1p);
    let h2p = hue_angle(y.b, a2p);

    let dh_p = if c1p == 0.0 || c2p == 0.0 {
        0.0
    } else if (h2p - h1p).abs() <= PI {
        h2p - h1p
    } else if h2p - h1p > PI {
        h2p - h1p - 2.0 * PI
    } else {
        h2p - h1p + 2.0 * PI
    };

    let dh_cap = 2.0 * (c1p * c2p).sqrt() * (dh_p / 2.0).sin();

    let h_bar_p = if c1p == 0.0 || c2p == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= PI {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 2.0 * PI {
        (h1p + h2p + 2.0 * PI) / 2.0
    } else {
        (h1p + h2p - 2.0 * PI) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30f64.to_radians()).cos()
        + 0.24 * (2.0 * h_bar_p).cos()
        + 0.32 * (3.0 * h_bar_p + 6f64.to_radians()).cos()
        - 0.20 * (4.0 * h_bar_p - 63f64.to_radians()).cos();

    let l_bar_50sq = (l_bar - 50.0) * (l_bar - 50.0);
    let sl = 1.0 + 0.015 * l_bar_50sq / (20.0 + l_bar_50sq).sqrt();
    let sc = 1.0 + 0.045 * c_bar_p;
    let sh = 1.0 + 0.015 * c_bar_p * t;

    let ratio = (h_bar_p - 275f64.to_radians()) / 25f64.to_radians();
    let d_theta = 30f64.to_radians() * (-(ratio * ratio)).exp();

    let c_bar_p7 = c_bar_p.powi(7);
    let rc = 2.0 * (c_bar_p7 / (c_bar_p7 + POW7_25)).sqrt();
    let rt = -(2.0 * d_theta).sin() * rc;

    let l_term = (y.l - x.l) / sl;
    let c_term = dc_p / sc;
    let h_term = dh_cap / sh;

    (l_term * l_term + c_term * c_term + h_term * h_term + rt * c_term * h_term).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{} !≈ {}", a, b);
    }

    #[test]
    fn srgb_to_lab_reference_white() {
        let lab = srgb_to_lab(255, 255, 255);
        approx(lab.l, 100.0, 1e-3);
        approx(lab.a, 0.0, 1e-3);
        approx(lab.b, 0.0, 1e-3);
    }

    #[test]
    fn srgb_to_lab_reference_black() {
        let lab = srgb_to_lab(0, 0, 0);
        approx(lab.l, 0.0, 1e-9);
        approx(lab.a, 0.0, 1e-9);
        approx(lab.b, 0.0, 1e-9);
    }

    #[test]
    fn srgb_to_lab_mid_gray() {
        let lab = srgb_to_lab(128, 128, 128);
        approx(lab.l, 53.585, 0.01);
        approx(lab.a, 0.0, 1e-3);
        approx(lab.b, 0.0, 1e-3);
    }

    #[test]
    fn srgb_to_lab_primaries() {
        let red = srgb_to_lab(255, 0, 0);
        approx(red.l, 53.24, 0.01);
        assert!(red.a > 70.0, "red a* = {}", red.a);
        assert!(red.b > 50.0, "red b* = {}", red.b);

        let green = srgb_to_lab(0, 255, 0);
        approx(green.l, 87.73, 0.01);
        assert!(green.a < -70.0, "green a* = {}", green.a);
    }

    #[test]
    fn relative_luminance_endpoints() {
        approx(relative_luminance(0, 0, 0), 0.0, 1e-12);
        approx(relative_luminance(255, 255, 255), 1.0, 1e-12);
        // green dominates the luminance weights
        assert!(relative_luminance(0, 255, 0) > relative_luminance(255, 0, 0));
        assert!(relative_luminance(255, 0, 0) > relative_luminance(0, 0, 255));
    }

    #[test]
    fn ciede2000_sharma_reference_pair() {
        // Pair 1 of the Sharma/Wu/Dalal supplementary test data
        let d = ciede2000(
            Lab::new(50.0, 2.6772, -79.7751),
            Lab::new(50.0, 0.0, -82.7485),
        );
        approx(d, 2.0425, 0.01);
    }

    #[test]
    fn ciede2000_zero_for_identical_inputs() {
        let lab = srgb_to_lab(137, 42, 200);
        assert_eq!(ciede2000(lab, lab), 0.0);
    }

    #[test]
    fn ciede2000_symmetric() {
        let a = srgb_to_lab(200, 30, 60);
        let b = srgb_to_lab(15, 190, 130);
        let fwd = ciede2000(a, b);
        let rev = ciede2000(b, a);
        assert!((fwd - rev).abs() < 1e-2, "{} vs {}", fwd, rev);
        assert!(fwd >= 0.0);
    }

    #[test]
    fn ciede2000_neutral_axis_guard() {
        // C1'·C2' = 0: hue terms must collapse without NaN
        let d = ciede2000(Lab::new(50.0, 0.0, 0.0), Lab::new(80.0, 0.0, 0.0));
        assert!(d.is_finite());
        assert!(d > 0.0);
    }

    #[test]
    fn ciede2000_white_vs_black_is_large() {
        let d = ciede2000(srgb_to_lab(255, 255, 255), srgb_to_lab(0, 0, 0));
        approx(d, 100.0, 0.01);
    }

    #[test]
    fn hue_distance_wraps() {
        approx(hue_distance(350.0, 10.0), 20.0, 1e-12);
        approx(hue_distance(10.0, 350.0), 20.0, 1e-12);
        approx(hue_distance(90.0, 270.0), 180.0, 1e-12);
        approx(hue_distance(42.0, 42.0), 0.0, 1e-12);
    }

    #[test]
    fn chroma_and_hue_helpers() {
        let lab = Lab::new(50.0, 3.0, 4.0);
        approx(lab.chroma(), 5.0, 1e-12);
        let h = Lab::new(50.0, 0.0, 10.0).hue_degrees();
        approx(h, 90.0, 1e-9);
        let h = Lab::new(50.0, 0.0, -10.0).hue_degrees();
        approx(h, 270.0, 1e-9);
    }
}
