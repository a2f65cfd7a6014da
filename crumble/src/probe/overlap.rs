use rapier3d::parry::{
    bounding_volume::Aabb,
    partitioning::{Bvh, BvhBuildStrategy},
    query,
    shape::Triangle,
};

use super::{
    Placed,
    bounds::{aabb_intersects, triangle_aabb, world_aabb},
};
use crate::types::{Iso, Point3, Vec3};

/// World-space triangles of a placed mesh together with their bounding boxes.
struct WorldTriangles {
    triangles: Vec<Triangle>,
    aabbs: Vec<Aabb>,
}

impl WorldTriangles {
    fn build(placed: Placed<'_>) -> Self {
        let verts = placed.world_vertices();
        let mut triangles = Vec::with_capacity(placed.mesh.triangles.len());
        let mut aabbs = Vec::with_capacity(placed.mesh.triangles.len());

        for [i, j, k] in placed.mesh.triangles.iter().copied() {
            let (Some(a), Some(b), Some(c)) = (
                verts.get(i as usize),
                verts.get(j as usize),
                verts.get(k as usize),
            ) else {
                // Faces pointing past the vertex buffer are skipped rather than trusted.
                continue;
            };
            triangles.push(Triangle::new(*a, *b, *c));
            aabbs.push(triangle_aabb(a, b, c));
        }

        Self { triangles, aabbs }
    }
}

/// Test whether the surfaces of `a` and `b` overlap and, if so, return an approximate
/// world-space contact point.
///
/// Approach
/// - Reject on the world bounding boxes first (cheap, and the common case in the shock pass).
/// - Build a BVH over `b`'s world triangles and query it with every triangle box of `a`.
/// - Confirm candidate pairs with an exact triangle/triangle intersection test.
///
/// The contact point is the mean of the box centers of every `b` face taking part in an
/// overlapping pair (a face hit by several triangles of `a` is counted once per pair).
/// It is a face-level estimate, not the intersection curve.
///
/// Only surfaces are tested: a mesh fully enclosed by the other reports no contact.
pub fn overlap_contact(a: Placed<'_>, b: Placed<'_>) -> Option<Point3> {
    if !aabb_intersects(&world_aabb(a), &world_aabb(b)) {
        return None;
    }

    let tris_a = WorldTriangles::build(a);
    let tris_b = WorldTriangles::build(b);
    if tris_a.triangles.is_empty() || tris_b.triangles.is_empty() {
        return None;
    }

    let bvh_b = Bvh::from_leaves(BvhBuildStrategy::Binned, &tris_b.aabbs);
    let identity = Iso::identity();

    let mut sum = Vec3::zeros();
    let mut hits = 0usize;

    for (tri_a, aabb_a) in tris_a.triangles.iter().zip(tris_a.aabbs.iter()) {
        for leaf in bvh_b.intersect_aabb(aabb_a) {
            let idx = leaf as usize;
            let tri_b = &tris_b.triangles[idx];
            // Degenerate triangles can make the support-map test bail out; treat as no hit.
            if let Ok(true) = query::intersection_test(&identity, tri_a, &identity, tri_b) {
                sum += tris_b.aabbs[idx].center().coords;
                hits += 1;
            }
        }
    }

    (hits > 0).then(|| Point3::from(sum / hits as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::Mesh,
        types::{Mat4, Quat, trs},
    };

    fn cube(half: f32) -> Mesh {
        Mesh::cuboid(Point3::origin(), Vec3::new(half, half, half))
    }

    #[test]
    fn disjoint_meshes_do_not_overlap() {
        let m = cube(0.5);
        let xa = Mat4::identity();
        let xb = trs(Vec3::new(3.0, 0.0, 0.0), Quat::identity(), 1.0);
        assert!(overlap_contact(Placed::new(&m, &xa), Placed::new(&m, &xb)).is_none());
    }

    #[test]
    fn crossing_meshes_report_a_contact_near_the_shared_region() {
        let small = cube(0.25);
        let big = cube(1.0);
        // Small cube straddles the +X face of the big one.
        let xa = trs(Vec3::new(1.0, 0.0, 0.0), Quat::identity(), 1.0);
        let xb = Mat4::identity();

        let contact = overlap_contact(Placed::new(&small, &xa), Placed::new(&big, &xb))
            .expect("straddling cubes overlap");
        // All contacted faces of the big cube touch the region around x = 1.
        assert!(contact.x > 0.0, "contact {contact:?}");
        assert!(contact.y.abs() <= 1.0 && contact.z.abs() <= 1.0);
    }

    #[test]
    fn fully_enclosed_mesh_has_no_surface_contact() {
        let small = cube(0.1);
        let big = cube(2.0);
        let xa = Mat4::identity();
        assert!(overlap_contact(Placed::new(&small, &xa), Placed::new(&big, &xa)).is_none());
    }

    #[test]
    fn empty_mesh_never_overlaps() {
        let empty = Mesh::default();
        let big = cube(1.0);
        let xa = Mat4::identity();
        assert!(overlap_contact(Placed::new(&empty, &xa), Placed::new(&big, &xa)).is_none());
    }
}
