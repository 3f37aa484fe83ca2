//! # driftfield
//!
//! An ambient particle field: a few hundred glowing points drifting inside a
//! sphere, joined by faint lines whenever two of them come close, gently
//! pulled toward the pointer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     let config = Config::default()
//!         .with_particle_count(180)
//!         .with_connection_threshold(2.4)
//!         .with_palette(Palette::Ocean);
//!     driftfield::run(config)
//! }
//! ```
//!
//! ## Frame order
//!
//! Every frame, [`Scene::step`] runs, in this order:
//!
//! 1. the pointer tracker re-projects the cursor onto the `z = 0` plane and
//!    smooths its world target,
//! 2. the particle field integrates velocities, applies the pointer pull and
//!    reflects particles off the boundary sphere,
//! 3. the proximity graph is rebuilt from scratch (all pairs, O(n²)),
//! 4. positions and faded edge colors are copied into fixed-capacity buffers.
//!
//! ## Hosts
//!
//! The simulation never touches a GPU directly. An [`Engine`] mounts a
//! [`Scene`] on any [`RenderHost`]; the bundled [`GpuRenderer`] draws with
//! wgpu into a winit window, and tests mount scenes on in-memory hosts.
//!
//! ```ignore
//! let mut engine = Engine::mount(&config, my_host)?;
//! engine.pointer_move(400.0, 300.0);
//! engine.frame(clock.tick())?;
//! engine.stop();
//! ```
//!
//! ## Scaling
//!
//! Neighbor search compares every pair each frame. Counts up to ~300 stay
//! well inside a 60 Hz budget; beyond that, a warning is logged at start.

pub mod buffers;
pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
mod gpu;
pub mod graph;
pub mod input;
pub mod scene;
pub mod spawn;
pub mod sprite;
pub mod time;
pub mod visuals;
mod window;

pub use buffers::FrameBuffers;
pub use camera::{Camera, Plane, Ray};
pub use config::{CameraParams, Config, RenderQuality, Viewport};
pub use engine::{Engine, LifecycleState, PointStyle, RenderHost};
pub use error::{ConfigError, EngineError, GpuError, ResourceError, RunError};
pub use field::{Particle, ParticleField};
pub use glam::{Mat4, Vec2, Vec3};
pub use gpu::GpuRenderer;
pub use graph::{Edge, ProximityGraph};
pub use input::{PointerState, PointerTracker};
pub use scene::{AmbientRotation, Frame, Scene};
pub use spawn::SpawnContext;
pub use sprite::GlowSprite;
pub use time::FrameClock;
pub use visuals::{Fog, Palette};
pub use window::run;

/// Convenience re-exports for the common case.
///
/// ```ignore
/// use driftfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, Viewport};
    pub use crate::engine::{Engine, RenderHost};
    pub use crate::error::{EngineError, RunError};
    pub use crate::scene::{AmbientRotation, Frame, Scene};
    pub use crate::time::FrameClock;
    pub use crate::visuals::{Fog, Palette};
    pub use crate::{Vec2, Vec3};
}
