//! Engine lifecycle.
//!
//! An [`Engine`] is a [`Scene`] mounted on a [`RenderHost`]:
//!
//! ```text
//! Idle --start()--> Running --stop()/drop--> Disposed
//! ```
//!
//! `start` allocates the glow sprite and vertex buffers and attaches input;
//! `stop` detaches input and releases everything. Host resources are
//! released exactly once, whether `stop` is called explicitly, runs from
//! `Drop`, or `start` itself failed halfway.
//!
//! ```ignore
//! let mut engine = Engine::mount(&config, host)?;
//! engine.pointer_move(320.0, 200.0);
//! engine.frame(clock.elapsed())?;
//! engine.stop();
//! ```

use winit::event::WindowEvent;

use crate::buffers::FrameBuffers;
use crate::config::{Config, Viewport};
use crate::error::{EngineError, ResourceError};
use crate::scene::{Frame, Scene};
use crate::sprite::GlowSprite;

/// Lifecycle state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not mounted.
    Idle,
    /// Frame loop active.
    Running,
    /// Resources released; the engine can no longer render.
    Disposed,
}

/// How points are drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum PointStyle {
    /// Billboards textured with a glow sprite.
    Sprite(GlowSprite),
    /// Untextured round points, used when no sprite could be allocated.
    Flat,
}

impl PointStyle {
    pub fn sprite(&self) -> Option<&GlowSprite> {
        match self {
            PointStyle::Sprite(sprite) => Some(sprite),
            PointStyle::Flat => None,
        }
    }
}

/// Whatever rasterizes frames: a GPU backend, a test double, ...
///
/// The engine calls `release` once after any successful or partial
/// allocation and never calls `present` outside `Running`.
pub trait RenderHost {
    /// Upload the glow sprite as a texture.
    fn allocate_sprite(&mut self, sprite: &GlowSprite) -> Result<(), ResourceError>;

    /// Create vertex buffers sized for `buffers`' full capacity.
    fn allocate_buffers(&mut self, buffers: &FrameBuffers) -> Result<(), ResourceError>;

    /// Start forwarding pointer events.
    fn attach_input(&mut self);

    /// Stop forwarding pointer events.
    fn detach_input(&mut self);

    /// Draw one frame.
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), ResourceError>;

    /// The surface changed size.
    fn resize(&mut self, _viewport: &Viewport) {}

    /// Free the sprite texture and vertex buffers.
    fn release(&mut self);
}

/// Releases host resources on drop unless disarmed.
struct AllocationGuard<'a, H: RenderHost> {
    host: &'a mut H,
    armed: bool,
}

impl<'a, H: RenderHost> AllocationGuard<'a, H> {
    fn new(host: &'a mut H) -> Self {
        Self { host, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<H: RenderHost> Drop for AllocationGuard<'_, H> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("releasing partially allocated resources");
            self.host.release();
        }
    }
}

/// A scene mounted on a render host.
pub struct Engine<H: RenderHost> {
    scene: Scene,
    host: H,
    sprite_size: u32,
    point_style: PointStyle,
    state: LifecycleState,
}

impl<H: RenderHost> Engine<H> {
    /// Build an idle engine. Configuration errors are reported here, before
    /// the host is touched.
    pub fn new(config: &Config, host: H) -> Result<Self, EngineError> {
        let scene = Scene::new(config)?;
        Ok(Self::with_scene(config, scene, host))
    }

    /// Idle engine around a prepared scene. `config` supplies the sprite size.
    pub fn with_scene(config: &Config, scene: Scene, host: H) -> Self {
        Self {
            scene,
            host,
            sprite_size: config.sprite_size,
            point_style: PointStyle::Flat,
            state: LifecycleState::Idle,
        }
    }

    /// Mount: allocate the sprite and buffers, then attach input.
    ///
    /// A sprite that cannot be created or uploaded is retried once at half
    /// size, then points fall back to flat rendering. A buffer allocation
    /// failure releases whatever was allocated and is returned; the engine
    /// is then disposed.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != LifecycleState::Idle {
            return Err(EngineError::AlreadyStarted);
        }

        let mut guard = AllocationGuard::new(&mut self.host);
        let style = allocate_sprite(guard.host, self.sprite_size);
        if let Err(e) = guard.host.allocate_buffers(self.scene.buffers()) {
            drop(guard);
            self.state = LifecycleState::Disposed;
            return Err(e.into());
        }
        guard.host.attach_input();
        guard.disarm();

        self.point_style = style;
        self.state = LifecycleState::Running;

        let particles = self.scene.field().len();
        log::info!(
            "driftfield started: {} particles, {} edge slots, {} points",
            particles,
            self.scene.buffers().max_edges(),
            if self.point_style.sprite().is_some() { "glow" } else { "flat" },
        );
        if particles > 300 {
            log::warn!(
                "{} particles: neighbor search is O(n^2) and may miss frame budgets",
                particles
            );
        }
        Ok(())
    }

    /// Convenience for [`Engine::new`] followed by [`Engine::start`].
    pub fn mount(config: &Config, host: H) -> Result<Self, EngineError> {
        let mut engine = Self::new(config, host)?;
        engine.start()?;
        Ok(engine)
    }

    /// Step the scene and present it. Fails with `NotRunning` outside `Running`.
    pub fn frame(&mut self, elapsed: f32) -> Result<(), EngineError> {
        if self.state != LifecycleState::Running {
            return Err(EngineError::NotRunning);
        }
        let frame = self.scene.step(elapsed);
        self.host.present(&frame)?;
        Ok(())
    }

    /// Pointer moved, in logical pixels. Ignored unless running.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.state == LifecycleState::Running {
            self.scene.pointer_move(x, y);
        }
    }

    /// Pointer left the surface. Ignored unless running.
    pub fn pointer_leave(&mut self) {
        if self.state == LifecycleState::Running {
            self.scene.pointer_leave();
        }
    }

    /// Route a winit cursor event to the pointer tracker. Returns `true` if
    /// the event was consumed.
    pub fn handle_pointer_event(&mut self, event: &WindowEvent, scale_factor: f64) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        self.scene.pointer_mut().handle_event(event, scale_factor)
    }

    pub fn resize(&mut self, viewport: &Viewport) {
        if self.state != LifecycleState::Running {
            return;
        }
        self.scene.resize(viewport);
        self.host.resize(viewport);
    }

    /// Detach input and release host resources. Safe to call repeatedly;
    /// an engine that never started is simply marked disposed.
    pub fn stop(&mut self) {
        match self.state {
            LifecycleState::Running => {
                self.host.detach_input();
                self.host.release();
                log::debug!("driftfield stopped after {} frames", self.scene.frame_count());
            }
            LifecycleState::Idle => {}
            LifecycleState::Disposed => return,
        }
        self.state = LifecycleState::Disposed;
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn point_style(&self) -> &PointStyle {
        &self.point_style
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: RenderHost> Drop for Engine<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Generate and upload the sprite, retrying once at half size.
fn allocate_sprite<H: RenderHost>(host: &mut H, size: u32) -> PointStyle {
    for attempt in [size, size / 2] {
        let result = GlowSprite::generate(attempt)
            .and_then(|sprite| host.allocate_sprite(&sprite).map(|()| sprite));
        match result {
            Ok(sprite) => return PointStyle::Sprite(sprite),
            Err(e) => log::warn!("glow sprite ({}px) unavailable: {}", attempt, e),
        }
    }
    log::warn!("falling back to flat point rendering");
    PointStyle::Flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct MockHost {
        sprite_sizes: Vec<u32>,
        fail_sprite: bool,
        fail_buffers: bool,
        input_attached: bool,
        presented: usize,
        releases: usize,
    }

    impl RenderHost for MockHost {
        fn allocate_sprite(&mut self, sprite: &GlowSprite) -> Result<(), ResourceError> {
            self.sprite_sizes.push(sprite.size());
            if self.fail_sprite {
                return Err(ResourceError::OutOfMemory);
            }
            Ok(())
        }

        fn allocate_buffers(&mut self, _buffers: &FrameBuffers) -> Result<(), ResourceError> {
            if self.fail_buffers {
                return Err(ResourceError::Allocation {
                    label: "line positions",
                    message: "mock".into(),
                });
            }
            Ok(())
        }

        fn attach_input(&mut self) {
            self.input_attached = true;
        }

        fn detach_input(&mut self) {
            self.input_attached = false;
        }

        fn present(&mut self, _frame: &Frame<'_>) -> Result<(), ResourceError> {
            self.presented += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn config() -> Config {
        Config::default().with_particle_count(20).with_seed(3)
    }

    #[test]
    fn test_lifecycle() {
        let mut engine = Engine::new(&config(), MockHost::default()).unwrap();
        assert_eq!(engine.state(), LifecycleState::Idle);
        assert!(matches!(engine.frame(0.0), Err(EngineError::NotRunning)));

        engine.start().unwrap();
        assert_eq!(engine.state(), LifecycleState::Running);
        assert!(engine.host().input_attached);
        assert!(engine.point_style().sprite().is_some());

        engine.frame(0.0).unwrap();
        engine.frame(0.016).unwrap();
        assert_eq!(engine.host().presented, 2);

        engine.stop();
        assert_eq!(engine.state(), LifecycleState::Disposed);
        assert!(!engine.host().input_attached);
        assert_eq!(engine.host().releases, 1);
        assert!(matches!(engine.frame(0.0), Err(EngineError::NotRunning)));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = Engine::mount(&config(), MockHost::default()).unwrap();
        engine.stop();
        engine.stop();
        assert_eq!(engine.host().releases, 1);
    }

    #[test]
    fn test_double_start_rejected() {
        let mut engine = Engine::mount(&config(), MockHost::default()).unwrap();
        assert!(matches!(engine.start(), Err(EngineError::AlreadyStarted)));
        assert_eq!(engine.state(), LifecycleState::Running);
    }

    #[test]
    fn test_stop_before_start_releases_nothing() {
        let mut engine = Engine::new(&config(), MockHost::default()).unwrap();
        engine.stop();
        assert_eq!(engine.state(), LifecycleState::Disposed);
        assert_eq!(engine.host().releases, 0);
        assert!(matches!(engine.start(), Err(EngineError::AlreadyStarted)));
    }

    #[test]
    fn test_buffer_failure_releases_once() {
        let host = MockHost {
            fail_buffers: true,
            ..Default::default()
        };
        let mut engine = Engine::new(&config(), host).unwrap();
        assert!(matches!(engine.start(), Err(EngineError::Resource(_))));
        assert_eq!(engine.state(), LifecycleState::Disposed);
        assert!(!engine.host().input_attached);
        assert_eq!(engine.host().releases, 1);

        engine.stop();
        assert_eq!(engine.host().releases, 1);
    }

    #[test]
    fn test_sprite_failure_falls_back_to_flat() {
        let host = MockHost {
            fail_sprite: true,
            ..Default::default()
        };
        let config = config().with_sprite_size(64);
        let engine = Engine::mount(&config, host).unwrap();
        assert_eq!(engine.point_style(), &PointStyle::Flat);
        assert_eq!(engine.host().sprite_sizes, vec![64, 32]);
        assert_eq!(engine.state(), LifecycleState::Running);
    }

    #[test]
    fn test_config_error_before_host_is_touched() {
        let result = Engine::new(&config().with_connection_threshold(0.0), MockHost::default());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_field_is_a_resource_error() {
        let config = config().with_particle_count(u32::MAX);
        assert!(config.validate().is_ok());
        let result = Engine::new(&config, MockHost::default());
        assert!(matches!(result, Err(EngineError::Resource(ResourceError::Allocation { .. }))));
    }

    #[test]
    fn test_pointer_ignored_unless_running() {
        let mut engine = Engine::new(&config(), MockHost::default()).unwrap();
        engine.pointer_move(10.0, 10.0);
        assert!(!engine.scene().pointer().is_active());

        engine.start().unwrap();
        engine.pointer_move(10.0, 10.0);
        assert!(engine.scene().pointer().is_active());
        engine.pointer_leave();
        assert!(!engine.scene().pointer().is_active());
    }
}
