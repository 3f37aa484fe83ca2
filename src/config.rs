//! Engine configuration.
//!
//! [`Config`] is supplied once by whatever mounts the engine. It can be built
//! in code with the `with_*` methods or loaded from JSON; missing JSON fields
//! fall back to their defaults.
//!
//! ```ignore
//! let config = Config::from_json(r#"{ "particle_count": 120, "field_radius": 8.0 }"#)?;
//! ```
//!
//! Validation never clamps: a bad value is reported as a [`ConfigError`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scene::AmbientRotation;
use crate::visuals::{Fog, Palette};
use glam::Vec3;

/// Largest pixel ratio rendered at on capable devices.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Pixel ratio cap in reduced-quality mode.
pub const REDUCED_PIXEL_RATIO: f32 = 1.0;

/// Perspective camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Distance from the field center.
    pub distance: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            distance: 26.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

/// Size of the surface the engine is mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in logical (CSS) pixels.
    pub width: u32,
    /// Height in logical (CSS) pixels.
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Physical render size with the pixel ratio capped at `max_pixel_ratio`.
    pub fn render_size(&self, max_pixel_ratio: f32) -> (u32, u32) {
        let ratio = self.device_pixel_ratio.min(max_pixel_ratio).max(0.1);
        (
            ((self.width as f32 * ratio).round() as u32).max(1),
            ((self.height as f32 * ratio).round() as u32).max(1),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

/// Rendering knobs derived from [`Config::reduced_quality`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderQuality {
    pub antialias: bool,
    pub max_pixel_ratio: f32,
}

impl RenderQuality {
    /// MSAA sample count for the color target.
    pub fn sample_count(&self) -> u32 {
        if self.antialias {
            4
        } else {
            1
        }
    }
}

/// Everything the engine needs to know at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particle_count: u32,
    /// Radius of the bounding sphere, centered at the origin.
    pub field_radius: f32,
    /// Pairs closer than this are connected.
    pub connection_threshold: f32,
    pub pointer_influence_radius: f32,
    pub pointer_influence_strength: f32,
    /// Exponential smoothing factor for the pointer world target.
    pub smoothing_alpha: f32,
    /// Maximum absolute value of each initial velocity component, per frame.
    pub initial_speed: f32,
    /// Billboard half-size in world units.
    pub point_size: f32,
    /// Glow sprite edge length in pixels.
    pub sprite_size: u32,
    pub palette: Palette,
    pub fog: Fog,
    pub rotation: AmbientRotation,
    pub camera: CameraParams,
    pub viewport: Viewport,
    /// Constrained devices: no antialiasing and a lower pixel-ratio cap.
    pub reduced_quality: bool,
    /// Fixed RNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 150,
            field_radius: 10.0,
            connection_threshold: 2.6,
            pointer_influence_radius: 4.0,
            pointer_influence_strength: 0.03,
            smoothing_alpha: 0.06,
            initial_speed: 0.02,
            point_size: 0.35,
            sprite_size: 64,
            palette: Palette::default(),
            fog: Fog::default(),
            rotation: AmbientRotation::default(),
            camera: CameraParams::default(),
            viewport: Viewport::default(),
            reduced_quality: false,
            seed: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_field_radius(mut self, radius: f32) -> Self {
        self.field_radius = radius;
        self
    }

    pub fn with_connection_threshold(mut self, threshold: f32) -> Self {
        self.connection_threshold = threshold;
        self
    }

    /// Set the pointer attraction radius and strength.
    pub fn with_pointer_influence(mut self, radius: f32, strength: f32) -> Self {
        self.pointer_influence_radius = radius;
        self.pointer_influence_strength = strength;
        self
    }

    pub fn with_smoothing_alpha(mut self, alpha: f32) -> Self {
        self.smoothing_alpha = alpha;
        self
    }

    pub fn with_initial_speed(mut self, speed: f32) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn with_sprite_size(mut self, size: u32) -> Self {
        self.sprite_size = size;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_fog(mut self, fog: Fog) -> Self {
        self.fog = fog;
        self
    }

    pub fn with_rotation(mut self, rotation: AmbientRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_camera(mut self, camera: CameraParams) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_reduced_quality(mut self, reduced: bool) -> Self {
        self.reduced_quality = reduced;
        self
    }

    /// Use a fixed seed so particle placement is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Capacity of the connection buffers: every unordered pair.
    pub fn max_edges(&self) -> usize {
        crate::graph::pair_count(self.particle_count as usize)
    }

    pub fn render_quality(&self) -> RenderQuality {
        if self.reduced_quality {
            RenderQuality {
                antialias: false,
                max_pixel_ratio: REDUCED_PIXEL_RATIO,
            }
        } else {
            RenderQuality {
                antialias: true,
                max_pixel_ratio: MAX_PIXEL_RATIO,
            }
        }
    }

    /// Check every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NonPositive {
                field: "particle_count",
                value: 0.0,
            });
        }

        positive("field_radius", self.field_radius)?;
        positive("connection_threshold", self.connection_threshold)?;
        positive("pointer_influence_radius", self.pointer_influence_radius)?;
        positive("point_size", self.point_size)?;
        positive("camera.fov_degrees", self.camera.fov_degrees)?;
        positive("camera.distance", self.camera.distance)?;
        positive("camera.near", self.camera.near)?;
        positive("camera.far", self.camera.far)?;
        finite("pointer_influence_strength", self.pointer_influence_strength)?;
        finite("initial_speed", self.initial_speed)?;
        finite("fog.density", self.fog.density)?;
        finite("rotation.drift", self.rotation.drift)?;
        finite("rotation.tilt_amplitude", self.rotation.tilt_amplitude)?;
        finite("rotation.tilt_frequency", self.rotation.tilt_frequency)?;

        if self.pointer_influence_strength < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "pointer_influence_strength",
                value: self.pointer_influence_strength as f64,
            });
        }

        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::SmoothingOutOfRange(self.smoothing_alpha));
        }

        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }

        let v = &self.viewport;
        if v.width == 0 || v.height == 0 || !(v.device_pixel_ratio > 0.0) {
            return Err(ConfigError::InvalidViewport {
                width: v.width,
                height: v.height,
            });
        }

        if self.sprite_size == 0 {
            return Err(ConfigError::NonPositive {
                field: "sprite_size",
                value: 0.0,
            });
        }

        Ok(())
    }

    /// Background clear color, shared with the fog.
    pub fn background(&self) -> Vec3 {
        self.fog.color
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field,
            value: value as f64,
        })
    }
}
