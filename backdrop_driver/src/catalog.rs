//! The production garment color catalog.
//!
//! The scoring core deliberately ships no catalog; this driver owns the list
//! of printable garment colors and any per-hex market overrides.

/// A garment color as sold, with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub hex: &'static str,
}

pub const BACKGROUND_COLORS: [NamedColor; 34] = [
    NamedColor { name: "White", hex: "#ffffff" },
    NamedColor { name: "Brick", hex: "#915C5C" },
    NamedColor { name: "Ivory", hex: "#FFF7E7" },
    NamedColor { name: "Mustard", hex: "#D0AE6E" },
    NamedColor { name: "Yam", hex: "#C9814F" },
    NamedColor { name: "Espresso", hex: "#846b5b" },
    NamedColor { name: "Butter", hex: "#F5E1A4" },
    NamedColor { name: "Pepper", hex: "#5F605B" },
    NamedColor { name: "Grey", hex: "#7A7F79" },
    NamedColor { name: "Bay", hex: "#C3CFC1" },
    NamedColor { name: "Moss", hex: "#747F66" },
    NamedColor { name: "Island Reef", hex: "#A2D8C2" },
    NamedColor { name: "Chalky Mint", hex: "#A7D9D4" },
    NamedColor { name: "Light Green", hex: "#738874" },
    NamedColor { name: "Blue Spruce", hex: "#536758" },
    NamedColor { name: "Lagoon Blue", hex: "#89E4ED" },
    NamedColor { name: "Sapphire", hex: "#03b2d3" },
    NamedColor { name: "Chambray", hex: "#D9EDF5" },
    NamedColor { name: "Flo Blue", hex: "#7682C2" },
    NamedColor { name: "Blue Jean", hex: "#788CA1" },
    NamedColor { name: "Graphite", hex: "#373231" },
    NamedColor { name: "Black", hex: "#000000" },
    NamedColor { name: "Navy", hex: "#263040" },
    NamedColor { name: "Violet", hex: "#A88FD7" },
    NamedColor { name: "Neon Violet", hex: "#e8ace3" },
    NamedColor { name: "Orchid", hex: "#CBB3CC" },
    NamedColor { name: "Blossom", hex: "#F8D1E2" },
    NamedColor { name: "Neon Pink", hex: "#f57caf" },
    NamedColor { name: "Crunchberry", hex: "#EB7CA2" },
    NamedColor { name: "Berry", hex: "#775568" },
    NamedColor { name: "Watermelon", hex: "#DA807B" },
    NamedColor { name: "Chili", hex: "#853F44" },
    NamedColor { name: "Crimson", hex: "#B66A74" },
    NamedColor { name: "Red", hex: "#A80D27" },
];

/// All catalog hexes in display order.
pub fn catalog_hexes() -> Vec<String> {
    BACKGROUND_COLORS.iter().map(|c| c.hex.to_string()).collect()
}

/// Display name for a hex, if it is in the catalog.
pub fn name_of(hex: &str) -> Option<&'static str> {
    BACKGROUND_COLORS
        .iter()
        .find(|c| c.hex.eq_ignore_ascii_case(hex))
        .map(|c| c.name)
}
