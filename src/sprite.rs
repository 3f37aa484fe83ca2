//! Procedural glow sprite.
//!
//! Every particle is drawn as a billboard sampling this texture, so points
//! read as soft round glows instead of hard-edged squares. The sprite is
//! white; the particle color is applied in the fragment shader.
//!
//! ```ignore
//! let sprite = GlowSprite::generate(64)?;
//! sprite.save_png("glow.png")?;
//! ```

use std::path::Path;

use image::{ImageResult, Rgba, RgbaImage};

use crate::error::ResourceError;

/// Largest sprite edge length accepted by [`GlowSprite::generate`].
pub const MAX_SPRITE_SIZE: u32 = 4096;

/// Radial alpha falloff as `(normalized radius, alpha)` stops.
const GRADIENT_STOPS: [(f32, f32); 4] = [(0.0, 1.0), (0.2, 0.8), (0.4, 0.3), (1.0, 0.0)];

/// Square RGBA radial-gradient texture. Immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct GlowSprite {
    image: RgbaImage,
}

impl GlowSprite {
    /// Render a `size` x `size` sprite: opaque at the center, transparent at the edge.
    pub fn generate(size: u32) -> Result<Self, ResourceError> {
        if size == 0 || size > MAX_SPRITE_SIZE {
            return Err(ResourceError::SpriteSize { size });
        }

        let half = size as f32 * 0.5;
        let image = RgbaImage::from_fn(size, size, |x, y| {
            let dx = x as f32 + 0.5 - half;
            let dy = y as f32 + 0.5 - half;
            let r = (dx * dx + dy * dy).sqrt() / half;
            let alpha = gradient_alpha(r);
            Rgba([255, 255, 255, (alpha * 255.0).round() as u8])
        });

        Ok(Self { image })
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Raw RGBA bytes, row-major, 4 bytes per pixel.
    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y).0[3]
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Write the sprite to disk (format chosen from the extension).
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.image.save(path)
    }
}

/// Piecewise-linear alpha along [`GRADIENT_STOPS`]; zero beyond the rim.
fn gradient_alpha(r: f32) -> f32 {
    if r >= 1.0 {
        return 0.0;
    }
    for pair in GRADIENT_STOPS.windows(2) {
        let (r0, a0) = pair[0];
        let (r1, a1) = pair[1];
        if r <= r1 {
            let t = (r - r0) / (r1 - r0);
            return a0 + (a1 - a0) * t;
        }
    }
    0.0
}
