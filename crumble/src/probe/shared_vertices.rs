use super::{
    Placed,
    bounds::{aabb_inflate, aabb_intersects, world_aabb},
};

/// Outcome of a shared-vertex scan, including how much work it took.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SharedVertexScan {
    /// Coincident vertex pairs found, capped at the requested maximum.
    pub count: usize,
    /// Vertex pairs compared before returning. Zero when the box test rejected early.
    pub comparisons: usize,
}

/// Count vertex pairs of `a` and `b` that lie within `tolerance` of each other,
/// stopping as soon as `max_count` pairs were found.
///
/// This is the adjacency test of the connectivity graph: fracture cells that share a
/// face share its corner vertices (up to the crack gap), so `max_count` coincident
/// pairs approximate face contact without needing topology from the fracturer.
///
/// The result is `min(total coincident pairs, max_count)`, which is independent of
/// argument order.
pub fn count_shared_vertices(a: Placed<'_>, b: Placed<'_>, tolerance: f32, max_count: usize) -> usize {
    scan_shared_vertices(a, b, tolerance, max_count).count
}

/// [`count_shared_vertices`] with the comparison count reported alongside.
pub fn scan_shared_vertices(
    a: Placed<'_>,
    b: Placed<'_>,
    tolerance: f32,
    max_count: usize,
) -> SharedVertexScan {
    if max_count == 0 {
        return SharedVertexScan::default();
    }

    // O(1) reject. The boxes are grown by the tolerance so vertices that sit across a
    // crack gap narrower than the tolerance are still considered.
    let box_a = aabb_inflate(&world_aabb(a), tolerance);
    let box_b = world_aabb(b);
    if !aabb_intersects(&box_a, &box_b) {
        return SharedVertexScan::default();
    }

    let verts_a = a.world_vertices();
    let verts_b = b.world_vertices();
    let tol_sq = tolerance * tolerance;

    let mut scan = SharedVertexScan::default();
    for u in &verts_a {
        for v in &verts_b {
            scan.comparisons += 1;
            if (u - v).norm_squared() < tol_sq {
                scan.count += 1;
                if scan.count == max_count {
                    return scan;
                }
            }
        }
    }

    scan
}
