//! Scene composition.
//!
//! [`Scene`] owns the camera, fog, ambient rotation and every simulation
//! component, and is the only place that knows the per-frame order:
//!
//! 1. [`PointerTracker::update`]
//! 2. [`ParticleField::update`]
//! 3. [`ProximityGraph::rebuild`]
//! 4. [`FrameBuffers::upload`]
//!
//! The result of a step is a [`Frame`], everything a rasterizer needs to draw.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::buffers::FrameBuffers;
use crate::camera::Camera;
use crate::config::{Config, Viewport};
use crate::error::EngineError;
use crate::field::ParticleField;
use crate::graph::ProximityGraph;
use crate::input::PointerTracker;
use crate::spawn::SpawnContext;
use crate::visuals::Fog;

/// Slow spin of the whole field, independent of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientRotation {
    /// Yaw added every frame, in radians.
    pub drift: f32,
    /// Peak pitch of the tilt oscillation, in radians.
    pub tilt_amplitude: f32,
    /// Tilt oscillation speed, in radians per second of elapsed time.
    pub tilt_frequency: f32,
}

impl AmbientRotation {
    /// Pitch at `elapsed` seconds.
    pub fn tilt(&self, elapsed: f32) -> f32 {
        (elapsed * self.tilt_frequency).sin() * self.tilt_amplitude
    }
}

impl Default for AmbientRotation {
    fn default() -> Self {
        Self {
            drift: 0.0008,
            tilt_amplitude: 0.12,
            tilt_frequency: 0.15,
        }
    }
}

/// Renderable unit for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    /// Ambient rotation of the field.
    pub model: Mat4,
    pub camera_position: Vec3,
    pub fog: Fog,
    pub point_size: f32,
    pub buffers: &'a FrameBuffers,
}

impl Frame<'_> {
    pub fn point_count(&self) -> usize {
        self.buffers.point_count()
    }

    /// Line vertices inside the draw range.
    pub fn line_vertex_count(&self) -> usize {
        self.buffers.line_vertex_count()
    }
}

/// The whole visual: simulation plus presentation state.
#[derive(Debug, Clone)]
pub struct Scene {
    camera: Camera,
    fog: Fog,
    rotation: AmbientRotation,
    yaw: f32,
    tilt: f32,
    point_size: f32,
    pointer: PointerTracker,
    field: ParticleField,
    graph: ProximityGraph,
    buffers: FrameBuffers,
    frame_count: u64,
}

impl Scene {
    /// Validate `config`, seed the field and allocate every buffer.
    ///
    /// Configuration errors come first. A particle count whose edge or
    /// vertex storage cannot be reserved is a [`ResourceError`].
    ///
    /// [`ResourceError`]: crate::error::ResourceError
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        // The edge list dominates memory, so reserve it before seeding.
        let graph =
            ProximityGraph::new(config.particle_count as usize, config.connection_threshold)?;
        let mut spawn = SpawnContext::new(config.seed);
        let field = ParticleField::new(config, &mut spawn)?;
        Self::assemble(config, field, graph, &mut spawn)
    }

    /// Like [`Scene::new`] but with a prepared field.
    pub fn with_field(config: &Config, field: ParticleField) -> Result<Self, EngineError> {
        config.validate()?;
        let graph = ProximityGraph::new(field.len(), config.connection_threshold)?;
        let mut spawn = SpawnContext::new(config.seed);
        Self::assemble(config, field, graph, &mut spawn)
    }

    fn assemble(
        config: &Config,
        field: ParticleField,
        graph: ProximityGraph,
        spawn: &mut SpawnContext,
    ) -> Result<Self, EngineError> {
        let palette = config.palette.colors();
        let colors: Vec<Vec3> = (0..field.len()).map(|_| spawn.pick_color(&palette)).collect();

        let mut scene = Self {
            camera: Camera::new(&config.camera, config.viewport.aspect()),
            fog: config.fog,
            rotation: config.rotation,
            yaw: 0.0,
            tilt: 0.0,
            point_size: config.point_size,
            pointer: PointerTracker::new(&config.viewport, config.smoothing_alpha),
            graph,
            buffers: FrameBuffers::new(&colors)?,
            field,
            frame_count: 0,
        };
        // First frame is drawable before any step.
        scene.buffers.upload(scene.field.particles(), scene.graph.edges());
        Ok(scene)
    }

    /// Run one frame in the fixed order and return what to draw.
    pub fn step(&mut self, elapsed: f32) -> Frame<'_> {
        self.pointer.update(&self.camera);
        let target = self.pointer_target();
        self.field.update_towards(target);
        self.graph.rebuild(self.field.particles());
        self.buffers.upload(self.field.particles(), self.graph.edges());

        self.yaw += self.rotation.drift;
        if elapsed.is_finite() {
            self.tilt = self.rotation.tilt(elapsed);
        }
        self.frame_count += 1;

        self.frame()
    }

    /// Renderable state as of the last step.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
            model: self.model_matrix(),
            camera_position: self.camera.position(),
            fog: self.fog,
            point_size: self.point_size,
            buffers: &self.buffers,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt) * Mat4::from_rotation_y(self.yaw)
    }

    /// Pointer target in the rotating field's own space, so the pull lands
    /// under the cursor as drawn. `None` while the pointer is away.
    pub fn pointer_target(&self) -> Option<Vec3> {
        self.pointer
            .is_active()
            .then(|| self.model_matrix().inverse().transform_point3(self.pointer.world_target()))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer.on_move(x, y);
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.on_leave();
    }

    /// Track a new surface size.
    pub fn resize(&mut self, viewport: &Viewport) {
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }
        self.camera.aspect = viewport.aspect();
        self.pointer.set_viewport(viewport);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerTracker {
        &mut self.pointer
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn graph(&self) -> &ProximityGraph {
        &self.graph
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
