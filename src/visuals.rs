//! Color palettes and fog.
//!
//! Particles pick a color from the active [`Palette`] once, at spawn time.
//! Connection lines reuse the colors of their two endpoints, dimmed by the
//! edge's fade weight.
//!
//! # Example
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! let config = Config::default()
//!     .with_palette(Palette::Ember)
//!     .with_fog(Fog::new(Vec3::new(0.02, 0.02, 0.05), 0.035));
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fixed set of colors particles are tinted with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Cool blues, violet and cyan (default).
    #[default]
    Nebula,

    /// Warm oranges, reds and gold.
    Ember,

    /// Teals and deep blues.
    Ocean,

    /// Vibrant cyberpunk colors (pink, cyan, purple).
    Neon,

    /// Shades of gray through white.
    Grayscale,

    /// User supplied colors (RGB, 0.0-1.0).
    Custom(Vec<Vec3>),
}

impl Palette {
    /// The palette's color stops.
    pub fn colors(&self) -> Vec<Vec3> {
        match self {
            Palette::Nebula => vec![
                Vec3::new(0.388, 0.400, 0.945), // Indigo
                Vec3::new(0.545, 0.361, 0.965), // Violet
                Vec3::new(0.024, 0.714, 0.831), // Cyan
                Vec3::new(0.376, 0.647, 0.980), // Sky
            ],
            Palette::Ember => vec![
                Vec3::new(0.976, 0.451, 0.086),
                Vec3::new(0.937, 0.267, 0.267),
                Vec3::new(0.984, 0.749, 0.141),
            ],
            Palette::Ocean => vec![
                Vec3::new(0.000, 0.200, 0.400),
                Vec3::new(0.000, 0.400, 0.600),
                Vec3::new(0.000, 0.600, 0.700),
                Vec3::new(0.200, 0.800, 0.800),
            ],
            Palette::Neon => vec![
                Vec3::new(1.000, 0.000, 0.500), // Hot pink
                Vec3::new(0.500, 0.000, 1.000), // Purple
                Vec3::new(0.000, 1.000, 1.000), // Cyan
            ],
            Palette::Grayscale => vec![
                Vec3::new(0.45, 0.45, 0.45),
                Vec3::new(0.70, 0.70, 0.70),
                Vec3::new(1.00, 1.00, 1.00),
            ],
            Palette::Custom(colors) => colors.clone(),
        }
    }

    /// True when the palette has no colors to pick from.
    pub fn is_empty(&self) -> bool {
        matches!(self, Palette::Custom(colors) if colors.is_empty())
    }
}

/// Exponential-squared distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fog {
    /// Color far geometry fades towards. Also used as the clear color.
    pub color: Vec3,
    /// Fog density; 0 disables fog.
    pub density: f32,
}

impl Fog {
    pub fn new(color: Vec3, density: f32) -> Self {
        Self { color, density }
    }

    /// Fraction of fog color at the given view depth (0 = clear, 1 = fully fogged).
    pub fn factor(&self, depth: f32) -> f32 {
        let d = self.density * depth;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.02, 0.02, 0.05),
            density: 0.025,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_not_empty() {
        for palette in [
            Palette::Nebula,
            Palette::Ember,
            Palette::Ocean,
            Palette::Neon,
            Palette::Grayscale,
        ] {
            assert!(!palette.is_empty());
            assert!(!palette.colors().is_empty());
        }
    }

    #[test]
    fn test_custom_palette() {
        assert!(Palette::Custom(vec![]).is_empty());
        let p = Palette::Custom(vec![Vec3::X]);
        assert_eq!(p.colors(), vec![Vec3::X]);
    }

    #[test]
    fn test_fog_factor() {
        let fog = Fog::new(Vec3::ZERO, 0.1);
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(5.0) < fog.factor(10.0));
        assert!(fog.factor(1000.0) > 0.99);

        let off = Fog::new(Vec3::ZERO, 0.0);
        assert_eq!(off.factor(100.0), 0.0);
    }
}
