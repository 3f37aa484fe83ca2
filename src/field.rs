//! The particle field.
//!
//! A fixed set of particles drifts inside a sphere centered at the origin.
//! Each frame every particle:
//!
//! 1. moves by its velocity (one fixed step, no delta-time scaling),
//! 2. is pulled towards the pointer target when the pointer is active and near,
//! 3. is put back on the sphere and has its velocity reversed if it left it.
//!
//! Particles are never created or destroyed after [`ParticleField::new`].

use glam::Vec3;

use crate::config::Config;
use crate::error::{try_with_capacity, ResourceError};
use crate::input::PointerTracker;
use crate::spawn::SpawnContext;

/// Particles closer than this to the pointer target are left alone.
pub const POINTER_EPSILON: f32 = 1e-3;

/// A simulated point. Identified only by its index in the field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }
}

/// Owns every particle and integrates them once per frame.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    radius: f32,
    influence_radius: f32,
    influence_strength: f32,
}

impl ParticleField {
    /// Seed `config.particle_count` particles uniformly inside the field sphere.
    pub fn new(config: &Config, spawn: &mut SpawnContext) -> Result<Self, ResourceError> {
        let mut particles = try_with_capacity("particles", config.particle_count as usize)?;
        particles.extend((0..config.particle_count).map(|_| Particle {
            position: spawn.random_in_sphere(config.field_radius),
            velocity: spawn.random_velocity(config.initial_speed),
        }));

        Ok(Self {
            particles,
            radius: config.field_radius,
            influence_radius: config.pointer_influence_radius,
            influence_strength: config.pointer_influence_strength,
        })
    }

    /// Build a field from explicit particles.
    pub fn from_particles(
        particles: Vec<Particle>,
        radius: f32,
        influence_radius: f32,
        influence_strength: f32,
    ) -> Self {
        Self {
            particles,
            radius,
            influence_radius,
            influence_strength,
        }
    }

    /// Advance every particle by one frame, pulled towards the pointer's
    /// world target.
    pub fn update(&mut self, pointer: &PointerTracker) {
        self.update_towards(pointer.is_active().then(|| pointer.world_target()));
    }

    /// Advance every particle by one frame. `target` is in field space;
    /// `None` means no pointer pull.
    pub fn update_towards(&mut self, target: Option<Vec3>) {
        for p in &mut self.particles {
            p.position += p.velocity;

            if let Some(target) = target {
                let to_target = target - p.position;
                let distance = to_target.length();
                if distance > POINTER_EPSILON && distance < self.influence_radius {
                    let pull = pointer_pull(distance, self.influence_radius, self.influence_strength);
                    p.position += to_target * pull;
                }
            }

            let distance = p.position.length();
            if distance > self.radius {
                p.position *= self.radius / distance;
                p.velocity = -p.velocity;
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Fraction of the way towards the pointer a particle moves this frame.
///
/// Linear in distance: `strength` at the target, zero at `radius`.
pub fn pointer_pull(distance: f32, radius: f32, strength: f32) -> f32 {
    strength * (1.0 - distance / radius).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;

    fn idle_pointer() -> PointerTracker {
        PointerTracker::new(&Viewport::default(), 0.06)
    }

    #[test]
    fn test_seeded_inside_sphere() {
        let config = Config::default().with_particle_count(300).with_seed(5);
        let field = ParticleField::new(&config, &mut SpawnContext::new(config.seed)).unwrap();
        assert_eq!(field.len(), 300);
        for p in field.particles() {
            assert!(p.position.length() <= config.field_radius + 1e-4);
            assert!(p.velocity.abs().max_element() <= config.initial_speed);
        }
    }

    #[test]
    fn test_integrates_velocity() {
        let mut field = ParticleField::from_particles(
            vec![Particle::new(Vec3::ZERO, Vec3::new(0.1, 0.0, -0.2))],
            10.0,
            4.0,
            0.05,
        );
        field.update(&idle_pointer());
        field.update(&idle_pointer());
        let p = field.particles()[0];
        assert!((p.position - Vec3::new(0.2, 0.0, -0.4)).length() < 1e-6);
    }

    #[test]
    fn test_reflects_at_boundary() {
        let mut field = ParticleField::from_particles(
            vec![Particle::new(Vec3::new(9.95, 0.0, 0.0), Vec3::new(0.1, 0.02, 0.0))],
            10.0,
            4.0,
            0.05,
        );
        field.update(&idle_pointer());
        let p = field.particles()[0];
        assert!(p.position.length() <= 10.0 + 1e-4);
        assert_eq!(p.velocity, Vec3::new(-0.1, -0.02, 0.0));
    }

    #[test]
    fn test_empty_field_is_noop() {
        let mut field = ParticleField::from_particles(vec![], 10.0, 4.0, 0.05);
        field.update(&idle_pointer());
        assert!(field.is_empty());
    }

    #[test]
    fn test_pointer_pull_is_linear() {
        assert_eq!(pointer_pull(0.0, 4.0, 0.1), 0.1);
        assert!((pointer_pull(2.0, 4.0, 0.1) - 0.05).abs() < 1e-7);
        assert_eq!(pointer_pull(4.0, 4.0, 0.1), 0.0);
        assert_eq!(pointer_pull(6.0, 4.0, 0.1), 0.0);
    }
}
