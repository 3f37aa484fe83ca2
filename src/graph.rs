//! Proximity graph.
//!
//! Every frame, each unordered pair of particles closer than the connection
//! threshold becomes an [`Edge`]. Edges carry a fade weight that drops
//! linearly from 1 at zero distance to 0 at the threshold; the renderer uses
//! it to dim longer connections.
//!
//! Neighbor discovery is brute force, O(n²). That is fine for a few hundred
//! particles; a spatial grid would be the next step for larger fields.

use crate::error::{try_with_capacity, ResourceError};
use crate::field::Particle;

/// A connection between particles `i` and `j`, with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub i: usize,
    pub j: usize,
    pub distance: f32,
    /// Opacity multiplier in `[0, 1]`.
    pub fade: f32,
}

/// Opacity for a connection of length `distance`.
#[inline]
pub fn fade_weight(distance: f32, threshold: f32) -> f32 {
    (1.0 - distance / threshold).clamp(0.0, 1.0)
}

/// Number of unordered pairs among `n` particles. Saturates at `usize::MAX`.
#[inline]
pub fn pair_count(n: usize) -> usize {
    n.checked_mul(n.saturating_sub(1))
        .map_or(usize::MAX, |pairs| pairs / 2)
}

/// Edge list rebuilt from scratch each frame.
///
/// Storage is reserved for every possible pair up front, so rebuilding never
/// reallocates.
#[derive(Debug, Clone)]
pub struct ProximityGraph {
    edges: Vec<Edge>,
    threshold: f32,
}

impl ProximityGraph {
    /// Graph for up to `particle_count` particles.
    ///
    /// Fails if the edge list for every possible pair cannot be reserved.
    pub fn new(particle_count: usize, threshold: f32) -> Result<Self, ResourceError> {
        Ok(Self {
            edges: try_with_capacity("edge list", pair_count(particle_count))?,
            threshold,
        })
    }

    /// Replace the edge set with every pair closer than the threshold.
    pub fn rebuild(&mut self, particles: &[Particle]) {
        self.edges.clear();
        let threshold_sq = self.threshold * self.threshold;

        for (i, a) in particles.iter().enumerate() {
            for (offset, b) in particles[i + 1..].iter().enumerate() {
                let dist_sq = a.position.distance_squared(b.position);
                if dist_sq >= threshold_sq {
                    continue;
                }
                let distance = dist_sq.sqrt();
                self.edges.push(Edge {
                    i,
                    j: i + 1 + offset,
                    distance,
                    fade: fade_weight(distance, self.threshold),
                });
            }
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Reserved edge slots.
    pub fn capacity(&self) -> usize {
        self.edges.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn at(x: f32, y: f32, z: f32) -> Particle {
        Particle::new(Vec3::new(x, y, z), Vec3::ZERO)
    }

    #[test]
    fn test_single_close_pair() {
        let mut graph = ProximityGraph::new(2, 2.0).unwrap();
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(1.0, 0.0, 0.0)]);
        assert_eq!(graph.len(), 1);
        let e = graph.edges()[0];
        assert_eq!((e.i, e.j), (0, 1));
        assert_eq!(e.distance, 1.0);
        assert_eq!(e.fade, 0.5);
    }

    #[test]
    fn test_far_pair_not_connected() {
        let mut graph = ProximityGraph::new(2, 2.0).unwrap();
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(5.0, 0.0, 0.0)]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut graph = ProximityGraph::new(2, 2.0).unwrap();
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(2.0, 0.0, 0.0)]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_rebuild_replaces_previous_edges() {
        let mut graph = ProximityGraph::new(3, 2.0).unwrap();
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(1.0, 0.0, 0.0), at(1.5, 0.0, 0.0)]);
        assert_eq!(graph.len(), 3);
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(5.0, 0.0, 0.0), at(10.0, 0.0, 0.0)]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_never_reallocates() {
        let mut graph = ProximityGraph::new(4, 100.0).unwrap();
        let capacity = graph.capacity();
        assert!(capacity >= 6);
        let cluster = [at(0.0, 0.0, 0.0), at(0.1, 0.0, 0.0), at(0.2, 0.0, 0.0), at(0.3, 0.0, 0.0)];
        graph.rebuild(&cluster);
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.capacity(), capacity);
    }

    #[test]
    fn test_edges_are_ordered_pairs() {
        let mut graph = ProximityGraph::new(3, 100.0).unwrap();
        graph.rebuild(&[at(0.0, 0.0, 0.0), at(1.0, 1.0, 0.0), at(0.0, 2.0, 3.0)]);
        assert!(graph.edges().iter().all(|e| e.i < e.j));
    }

    #[test]
    fn test_fade_weight() {
        assert_eq!(fade_weight(0.0, 2.0), 1.0);
        assert_eq!(fade_weight(2.0, 2.0), 0.0);
        assert!(fade_weight(0.5, 2.0) > fade_weight(1.5, 2.0));
        assert_eq!(fade_weight(3.0, 2.0), 0.0);
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(200), 19_900);
        assert_eq!(pair_count(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_unreservable_capacity_is_an_error() {
        let err = ProximityGraph::new(usize::MAX, 1.0).unwrap_err();
        assert!(matches!(err, ResourceError::Allocation { label: "edge list", .. }));
    }
}
