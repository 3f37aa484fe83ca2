//! Pointer tracking.
//!
//! The host forwards raw pointer events in screen pixels; once per frame the
//! tracker casts a ray through the camera, intersects it with a fixed
//! reference plane and eases its world-space target towards the hit point.
//!
//! ```ignore
//! tracker.on_move(412.0, 230.0);
//! tracker.update(&camera);
//! let target = tracker.world_target();
//! ```
//!
//! A tracker belongs to exactly one surface. It is owned by the scene and
//! passed by reference to the particle field, so there is a single writer.

use glam::{Vec2, Vec3};
use winit::event::WindowEvent;

use crate::camera::{Camera, Plane};
use crate::config::Viewport;

/// Snapshot of the pointer as seen by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Last pointer position in logical pixels, `None` while the pointer is away.
    pub device_coord: Option<Vec2>,
    /// Smoothed world-space target.
    pub world_target: Vec3,
    pub active: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            device_coord: None,
            world_target: Vec3::ZERO,
            active: false,
        }
    }
}

/// Turns 2D pointer input into a smoothed 3D target.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    state: PointerState,
    smoothing_alpha: f32,
    plane: Plane,
    // Logical size of the surface, for NDC conversion
    viewport: Vec2,
}

impl PointerTracker {
    /// Tracker that intersects with the `z = 0` plane.
    pub fn new(viewport: &Viewport, smoothing_alpha: f32) -> Self {
        Self {
            state: PointerState::default(),
            smoothing_alpha,
            plane: Plane::XY,
            viewport: Vec2::new(viewport.width as f32, viewport.height as f32),
        }
    }

    pub fn with_plane(mut self, plane: Plane) -> Self {
        self.plane = plane;
        self
    }

    /// Pointer moved to `(x, y)` in logical pixels. Non-finite input is ignored.
    pub fn on_move(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.state.device_coord = Some(Vec2::new(x, y));
        self.state.active = true;
    }

    /// Pointer left the surface. The world target stays where it is.
    pub fn on_leave(&mut self) {
        self.state.device_coord = None;
        self.state.active = false;
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.viewport = Vec2::new(viewport.width as f32, viewport.height as f32);
    }

    /// Re-project the pointer and ease the world target towards the hit point.
    ///
    /// A ray that misses the plane (or an inactive pointer) leaves the target
    /// unchanged.
    pub fn update(&mut self, camera: &Camera) {
        let Some(ndc) = self.ndc() else {
            return;
        };
        let Some(hit) = camera
            .ray_from_ndc(ndc)
            .and_then(|ray| ray.intersect_plane(&self.plane))
        else {
            return;
        };

        let target = &mut self.state.world_target;
        *target += (hit - *target) * self.smoothing_alpha;
    }

    /// Pointer position in normalized device coordinates (-1 to 1, Y up).
    pub fn ndc(&self) -> Option<Vec2> {
        let coord = self.state.device_coord?;
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            (coord.x / self.viewport.x) * 2.0 - 1.0,
            1.0 - (coord.y / self.viewport.y) * 2.0, // Y flipped
        );
        Some(ndc.clamp(Vec2::splat(-1.0), Vec2::splat(1.0)))
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    #[inline]
    pub fn world_target(&self) -> Vec3 {
        self.state.world_target
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Route a winit window event. Returns `true` if it was a pointer event.
    ///
    /// `scale_factor` converts winit's physical cursor position to logical pixels.
    pub fn handle_event(&mut self, event: &WindowEvent, scale_factor: f64) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(scale_factor);
                self.on_move(logical.x as f32, logical.y as f32);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.on_leave();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraParams;

    fn tracker() -> PointerTracker {
        PointerTracker::new(&Viewport::new(800, 600, 1.0), 0.06)
    }

    fn camera() -> Camera {
        Camera::new(&CameraParams::default(), 800.0 / 600.0)
    }

    #[test]
    fn test_mouse_ndc() {
        let mut input = tracker();

        // Center of window should be (0, 0) in NDC
        input.on_move(400.0, 300.0);
        let ndc = input.ndc().unwrap();
        assert!(ndc.x.abs() < 0.01);
        assert!(ndc.y.abs() < 0.01);

        // Top-left corner
        input.on_move(0.0, 0.0);
        let ndc = input.ndc().unwrap();
        assert!((ndc.x + 1.0).abs() < 0.01);
        assert!((ndc.y - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_move_and_leave() {
        let mut input = tracker();
        assert!(!input.is_active());

        input.on_move(10.0, 20.0);
        assert!(input.is_active());
        assert_eq!(input.state().device_coord, Some(Vec2::new(10.0, 20.0)));

        input.on_leave();
        assert!(!input.is_active());
        assert!(input.state().device_coord.is_none());
        assert!(input.ndc().is_none());
    }

    #[test]
    fn test_ignores_non_finite() {
        let mut input = tracker();
        input.on_move(f32::NAN, 5.0);
        assert!(!input.is_active());
        input.on_move(5.0, f32::INFINITY);
        assert!(!input.is_active());
    }

    #[test]
    fn test_update_smooths_towards_hit() {
        let mut input = tracker();
        let cam = camera();
        input.on_move(600.0, 300.0);

        input.update(&cam);
        let first = input.world_target();
        assert!(first.x > 0.0);

        let mut last = first.x;
        for _ in 0..100 {
            input.update(&cam);
            let x = input.world_target().x;
            assert!(x > last);
            last = x;
        }
    }

    #[test]
    fn test_miss_keeps_target() {
        // Plane parallel to the view direction never intersects.
        let mut input = tracker().with_plane(Plane::new(Vec3::X, -1000.0));
        input.on_move(400.0, 300.0);
        input.update(&camera());
        assert_eq!(input.world_target(), Vec3::ZERO);
    }

    #[test]
    fn test_inactive_update_is_noop() {
        let mut input = tracker();
        input.update(&camera());
        assert_eq!(input.world_target(), Vec3::ZERO);
    }
}
