//! CPU-side vertex buffers handed to the rasterizer.
//!
//! All four arrays are allocated once, at full capacity, and only ever
//! overwritten in place. Lines use a draw range: the first
//! `active_edge_count * 2` vertices are drawn, anything after that is stale
//! data from earlier frames and is left as is.
//!
//! Layout (all `f32`, tightly packed):
//!
//! | Buffer | Length | Per element |
//! |--------|--------|-------------|
//! | `point_positions` | `n * 3` | xyz |
//! | `point_colors` | `n * 3` | rgb, fixed at init |
//! | `line_positions` | `max_edges * 6` | xyz of both endpoints |
//! | `line_colors` | `max_edges * 6` | endpoint rgb times fade |

use glam::Vec3;

use crate::error::{try_with_capacity, ResourceError};
use crate::field::Particle;
use crate::graph::{pair_count, Edge};

/// Floats per point vertex.
pub const POINT_STRIDE: usize = 3;
/// Floats per line segment (two vertices).
pub const SEGMENT_STRIDE: usize = 6;

/// Preallocated point and line vertex data.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    point_positions: Vec<f32>,
    point_colors: Vec<f32>,
    line_positions: Vec<f32>,
    line_colors: Vec<f32>,
    active_edge_count: usize,
    max_edges: usize,
}

impl FrameBuffers {
    /// Allocate buffers for one particle per entry of `colors`.
    ///
    /// Fails without aborting if any array is too large to reserve.
    pub fn new(colors: &[Vec3]) -> Result<Self, ResourceError> {
        let n = colors.len();
        let max_edges = pair_count(n);

        let mut point_colors = try_with_capacity("point colors", floats(n, POINT_STRIDE)?)?;
        point_colors.extend(colors.iter().flat_map(|c| c.to_array()));

        Ok(Self {
            point_positions: zeroed("point positions", floats(n, POINT_STRIDE)?)?,
            point_colors,
            line_positions: zeroed("line positions", floats(max_edges, SEGMENT_STRIDE)?)?,
            line_colors: zeroed("line colors", floats(max_edges, SEGMENT_STRIDE)?)?,
            active_edge_count: 0,
            max_edges,
        })
    }

    /// Copy this frame's particle positions and edges into the buffers.
    ///
    /// Particles past the point capacity are ignored, as are edges that
    /// touch them or do not fit. With a graph built from the same particles
    /// neither can happen.
    pub fn upload(&mut self, particles: &[Particle], edges: &[Edge]) {
        let particles = &particles[..particles.len().min(self.point_count())];

        for (dst, p) in self
            .point_positions
            .chunks_exact_mut(POINT_STRIDE)
            .zip(particles)
        {
            dst.copy_from_slice(&p.position.to_array());
        }

        let mut edge_index = 0;
        for edge in edges.iter().take(self.max_edges) {
            let (Some(a), Some(b)) = (particles.get(edge.i), particles.get(edge.j)) else {
                continue;
            };

            let base = edge_index * SEGMENT_STRIDE;
            let positions = &mut self.line_positions[base..base + SEGMENT_STRIDE];
            positions[..3].copy_from_slice(&a.position.to_array());
            positions[3..].copy_from_slice(&b.position.to_array());

            let color_a = self.point_color(edge.i) * edge.fade;
            let color_b = self.point_color(edge.j) * edge.fade;
            let colors = &mut self.line_colors[base..base + SEGMENT_STRIDE];
            colors[..3].copy_from_slice(&color_a.to_array());
            colors[3..].copy_from_slice(&color_b.to_array());

            edge_index += 1;
        }

        self.active_edge_count = edge_index;
    }

    /// Color assigned to particle `index` at init.
    pub fn point_color(&self, index: usize) -> Vec3 {
        let base = index * POINT_STRIDE;
        Vec3::from_slice(&self.point_colors[base..base + POINT_STRIDE])
    }

    pub fn point_count(&self) -> usize {
        self.point_positions.len() / POINT_STRIDE
    }

    pub fn active_edge_count(&self) -> usize {
        self.active_edge_count
    }

    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Number of line vertices to draw this frame.
    pub fn line_vertex_count(&self) -> usize {
        self.active_edge_count * 2
    }

    pub fn point_positions(&self) -> &[f32] {
        &self.point_positions
    }

    pub fn point_colors(&self) -> &[f32] {
        &self.point_colors
    }

    /// Full line position buffer, including the inactive tail.
    pub fn line_positions(&self) -> &[f32] {
        &self.line_positions
    }

    /// Full line color buffer, including the inactive tail.
    pub fn line_colors(&self) -> &[f32] {
        &self.line_colors
    }

    /// Slice of line positions inside the draw range.
    pub fn active_line_positions(&self) -> &[f32] {
        &self.line_positions[..self.active_edge_count * SEGMENT_STRIDE]
    }

    /// Slice of line colors inside the draw range.
    pub fn active_line_colors(&self) -> &[f32] {
        &self.line_colors[..self.active_edge_count * SEGMENT_STRIDE]
    }
}

fn floats(elements: usize, stride: usize) -> Result<usize, ResourceError> {
    elements
        .checked_mul(stride)
        .ok_or_else(|| ResourceError::Allocation {
            label: "vertex buffers",
            message: format!("{} elements of {} floats overflow usize", elements, stride),
        })
}

fn zeroed(label: &'static str, len: usize) -> Result<Vec<f32>, ResourceError> {
    let mut vec = try_with_capacity(label, len)?;
    vec.resize(len, 0.0);
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ProximityGraph;

    fn particles() -> Vec<Particle> {
        vec![
            Particle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO),
            Particle::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
            Particle::new(Vec3::new(9.0, 0.0, 0.0), Vec3::ZERO),
        ]
    }

    #[test]
    fn test_capacity() {
        let buffers = FrameBuffers::new(&[Vec3::ONE; 4]).unwrap();
        assert_eq!(buffers.point_positions().len(), 12);
        assert_eq!(buffers.point_colors().len(), 12);
        assert_eq!(buffers.max_edges(), 6);
        assert_eq!(buffers.line_positions().len(), 36);
        assert_eq!(buffers.line_colors().len(), 36);
    }

    #[test]
    fn test_upload_writes_points_and_lines() {
        let colors = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::ONE];
        let mut buffers = FrameBuffers::new(&colors).unwrap();
        let particles = particles();
        let mut graph = ProximityGraph::new(3, 2.0).unwrap();
        graph.rebuild(&particles);

        buffers.upload(&particles, graph.edges());

        assert_eq!(&buffers.point_positions()[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(buffers.active_edge_count(), 1);
        assert_eq!(buffers.line_vertex_count(), 2);
        assert_eq!(buffers.active_line_positions(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(buffers.active_line_colors(), &[0.5, 0.0, 0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_colors_are_not_rewritten() {
        let colors = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut buffers = FrameBuffers::new(&colors).unwrap();
        let before = buffers.point_colors().to_vec();
        buffers.upload(&particles(), &[]);
        assert_eq!(buffers.point_colors(), before.as_slice());
    }

    #[test]
    fn test_tail_left_untouched() {
        let mut buffers = FrameBuffers::new(&[Vec3::ONE; 3]).unwrap();
        let mut graph = ProximityGraph::new(3, 100.0).unwrap();
        let particles = particles();

        graph.rebuild(&particles);
        buffers.upload(&particles, graph.edges());
        assert_eq!(buffers.active_edge_count(), 3);
        let stale = buffers.line_positions()[6..].to_vec();

        let mut near = ProximityGraph::new(3, 2.0).unwrap();
        near.rebuild(&particles);
        buffers.upload(&particles, near.edges());
        assert_eq!(buffers.active_edge_count(), 1);
        assert_eq!(&buffers.line_positions()[6..], stale.as_slice());
    }

    #[test]
    fn test_edges_never_exceed_capacity() {
        let mut buffers = FrameBuffers::new(&[Vec3::ONE; 2]).unwrap();
        let bogus = Edge { i: 0, j: 1, distance: 0.5, fade: 0.5 };
        buffers.upload(&particles(), &[bogus, bogus, bogus]);
        assert_eq!(buffers.active_edge_count(), 1);

        // Particle 2 exists but has no color slot.
        let past_colors = Edge { i: 0, j: 2, distance: 0.5, fade: 0.5 };
        buffers.upload(&particles(), &[past_colors]);
        assert_eq!(buffers.active_edge_count(), 0);
        assert_eq!(buffers.point_positions(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_buffers_not_reallocated() {
        let mut buffers = FrameBuffers::new(&[Vec3::ONE; 3]).unwrap();
        let ptr = buffers.line_positions().as_ptr();
        let mut graph = ProximityGraph::new(3, 100.0).unwrap();
        for _ in 0..10 {
            graph.rebuild(&particles());
            buffers.upload(&particles(), graph.edges());
        }
        assert_eq!(buffers.line_positions().as_ptr(), ptr);
    }
}
