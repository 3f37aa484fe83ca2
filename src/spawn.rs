//! Random sampling helpers used when seeding the field.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seeded RNG with helpers for common spawn patterns.
///
/// ```ignore
/// let mut ctx = SpawnContext::new(Some(7));
/// let position = ctx.random_in_sphere(10.0);
/// let velocity = ctx.random_velocity(0.02);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context. Without a seed, the current time is used so every
    /// mount looks different.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });

        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume: the radius uses the cube
    /// root of a uniform variable and the polar angle is drawn so that
    /// `cos(phi)` is uniform.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        let cos_phi: f32 = self.rng.gen_range(-1.0..=1.0);
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
        let r = radius * self.rng.gen::<f32>().cbrt();

        Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * cos_phi,
        )
    }

    /// Velocity with each component uniform in `[-max_component, max_component]`.
    pub fn random_velocity(&mut self, max_component: f32) -> Vec3 {
        if max_component <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.rng.gen_range(-max_component..=max_component),
            self.rng.gen_range(-max_component..=max_component),
            self.rng.gen_range(-max_component..=max_component),
        )
    }

    /// Pick one of `colors` uniformly. Returns white for an empty slice.
    pub fn pick_color(&mut self, colors: &[Vec3]) -> Vec3 {
        if colors.is_empty() {
            return Vec3::ONE;
        }
        colors[self.rng.gen_range(0..colors.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_points_inside_radius() {
        let mut ctx = SpawnContext::new(Some(1));
        for _ in 0..1000 {
            assert!(ctx.random_in_sphere(5.0).length() <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn test_sphere_not_center_clustered() {
        // Uniform volume sampling puts ~87.5% of points beyond half the radius.
        let mut ctx = SpawnContext::new(Some(2));
        let outer = (0..4000)
            .filter(|_| ctx.random_in_sphere(1.0).length() > 0.5)
            .count();
        assert!(outer > 3300, "only {} of 4000 points in the outer shell", outer);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = SpawnContext::new(Some(99));
        let mut b = SpawnContext::new(Some(99));
        assert_eq!(a.random_in_sphere(3.0), b.random_in_sphere(3.0));
        assert_eq!(a.random_velocity(0.1), b.random_velocity(0.1));
    }

    #[test]
    fn test_velocity_bounds() {
        let mut ctx = SpawnContext::new(Some(3));
        for _ in 0..500 {
            let v = ctx.random_velocity(0.02);
            assert!(v.abs().max_element() <= 0.02);
        }
        assert_eq!(ctx.random_velocity(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_pick_color() {
        let mut ctx = SpawnContext::new(Some(4));
        let colors = [Vec3::X, Vec3::Y];
        for _ in 0..50 {
            let c = ctx.pick_color(&colors);
            assert!(c == Vec3::X || c == Vec3::Y);
        }
        assert_eq!(ctx.pick_color(&[]), Vec3::ONE);
    }
}
