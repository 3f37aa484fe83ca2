//! Perspective orbit camera and the ray/plane math used for pointer picking.

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraParams;

/// Orbit camera looking at the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera on the +Z axis looking at the origin.
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: params.distance,
            target: Vec3::ZERO,
            fov_y: params.fov_degrees.to_radians(),
            aspect,
            near: params.near,
            far: params.far,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the camera through a point in normalized device coordinates
    /// (`-1..1`, Y up). Returns `None` if the matrices are degenerate.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let inv = self.view_proj().inverse();
        // glam perspective maps the near plane to z = 0 and the far plane to z = 1.
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - near).try_normalize()?;
        if !near.is_finite() {
            return None;
        }
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point where the ray meets `plane`, or `None` if it runs parallel to it
    /// or the plane lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = -(plane.normal.dot(self.origin) + plane.constant) / denom;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

/// Plane satisfying `normal . p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// The `z = 0` plane, facing a camera on +Z.
    pub const XY: Plane = Plane {
        normal: Vec3::Z,
        constant: 0.0,
    };

    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&CameraParams::default(), 16.0 / 9.0)
    }

    #[test]
    fn test_default_position_on_z_axis() {
        let cam = camera();
        let pos = cam.position();
        assert!(pos.x.abs() < 1e-5 && pos.y.abs() < 1e-5);
        assert!((pos.z - CameraParams::default().distance).abs() < 1e-4);
    }

    #[test]
    fn test_center_ray_hits_origin() {
        let cam = camera();
        let ray = cam.ray_from_ndc(Vec2::ZERO).unwrap();
        let hit = ray.intersect_plane(&Plane::XY).unwrap();
        assert!(hit.length() < 1e-3, "hit = {:?}", hit);
    }

    #[test]
    fn test_offset_ray_hits_offset_point() {
        let cam = camera();
        let hit = cam
            .ray_from_ndc(Vec2::new(0.5, 0.5))
            .and_then(|r| r.intersect_plane(&Plane::XY))
            .unwrap();
        assert!(hit.x > 0.0 && hit.y > 0.0);
        assert!(hit.z.abs() < 1e-3);
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::X,
        };
        assert!(ray.intersect_plane(&Plane::XY).is_none());
    }

    #[test]
    fn test_plane_behind_ray_misses() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::Z,
        };
        assert!(ray.intersect_plane(&Plane::XY).is_none());
    }
}
