/*!
Geometry probe root module.

Read-only geometric queries over placed meshes. Nothing in here owns or mutates
scene state; every query takes a [`Placed`] view (mesh + world transform) so the
same mesh can be probed at any pose, which is how the shock pass tests pieces at
their reconstructed per-frame transforms.

- bounds:          world AABBs, bbox centroids, minimum height
- shared_vertices: near-coincident vertex counting used as the adjacency test
- overlap:         BVH-accelerated triangle overlap with an approximate contact point
*/

pub mod bounds;
pub mod overlap;
pub mod shared_vertices;

use crate::{
    mesh::{Body, Mesh, Piece},
    types::{Mat4, Point3},
};

// Re-export the query entry points.
pub use bounds::{centroid, min_height, world_aabb};
pub use overlap::overlap_contact;
pub use shared_vertices::count_shared_vertices;

/// A mesh positioned in the world.
#[derive(Clone, Copy, Debug)]
pub struct Placed<'a> {
    pub mesh: &'a Mesh,
    pub transform: &'a Mat4,
}

impl<'a> Placed<'a> {
    #[inline]
    pub fn new(mesh: &'a Mesh, transform: &'a Mat4) -> Self {
        Self { mesh, transform }
    }

    /// A fracture piece at the pose it was created with.
    #[inline]
    pub fn piece(piece: &'a Piece) -> Self {
        Self::new(&piece.mesh, &piece.transform)
    }

    /// A scene body at an externally sampled world transform.
    #[inline]
    pub fn body(body: &'a Body, transform: &'a Mat4) -> Self {
        Self::new(&body.mesh, transform)
    }

    /// All vertices transformed to world space.
    pub fn world_vertices(&self) -> Vec<Point3> {
        self.mesh
            .vertices
            .iter()
            .map(|v| self.transform.transform_point(v))
            .collect()
    }
}
