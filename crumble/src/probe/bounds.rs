use nalgebra as na;
use rapier3d::parry::bounding_volume::Aabb;

use super::Placed;
use crate::types::Point3;

/// World-space AABB of a placed mesh, built from the 8 corners of its local bounding box.
///
/// This is looser than the tight box over all vertices once the transform rotates the
/// mesh, but it only costs 8 point transforms regardless of mesh size.
/// An empty mesh collapses to a point box at its transformed origin.
pub fn world_aabb(placed: Placed<'_>) -> Aabb {
    let mut mins = Point3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut maxs = Point3::new(-f32::MAX, -f32::MAX, -f32::MAX);

    for corner in placed.mesh.bound_box().iter() {
        let b = placed.transform.transform_point(corner);
        mins = mins.inf(&b);
        maxs = maxs.sup(&b);
    }

    Aabb { mins, maxs }
}

/// World position of the local bounding-box center.
pub fn centroid(placed: Placed<'_>) -> Point3 {
    placed.transform.transform_point(&placed.mesh.bound_center())
}

/// Lowest world-space height (Y) over all vertices. `f32::MAX` for an empty mesh.
pub fn min_height(placed: Placed<'_>) -> f32 {
    placed
        .mesh
        .vertices
        .iter()
        .map(|v| placed.transform.transform_point(v).y)
        .fold(f32::MAX, f32::min)
}

/// Inflate an AABB by `margin` on all sides.
pub(crate) fn aabb_inflate(a: &Aabb, margin: f32) -> Aabb {
    if margin <= 0.0 {
        return *a;
    }
    let delta = na::Vector3::new(margin, margin, margin);
    Aabb {
        mins: a.mins - delta,
        maxs: a.maxs + delta,
    }
}

/// Test two AABBs for intersection. Touching faces count as intersecting.
pub(crate) fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.maxs.x < b.mins.x
        || a.mins.x > b.maxs.x
        || a.maxs.y < b.mins.y
        || a.mins.y > b.maxs.y
        || a.maxs.z < b.mins.z
        || a.mins.z > b.maxs.z)
}

/// Smallest AABB around a triangle.
pub(crate) fn triangle_aabb(a: &Point3, b: &Point3, c: &Point3) -> Aabb {
    Aabb {
        mins: a.inf(b).inf(c),
        maxs: a.sup(b).sup(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::Mesh,
        types::{Mat4, Quat, Vec3, trs},
    };

    #[test]
    fn world_aabb_follows_translation_and_scale() {
        let mesh = Mesh::cuboid(Point3::origin(), Vec3::new(0.5, 0.5, 0.5));
        let xf = trs(Vec3::new(10.0, 0.0, -3.0), Quat::identity(), 2.0);
        let aabb = world_aabb(Placed::new(&mesh, &xf));

        assert!((aabb.mins - Point3::new(9.0, -1.0, -4.0)).norm() < 1.0e-5);
        assert!((aabb.maxs - Point3::new(11.0, 1.0, -2.0)).norm() < 1.0e-5);
    }

    #[test]
    fn rotated_box_aabb_grows() {
        let mesh = Mesh::cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let xf = trs(
            Vec3::zeros(),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_4),
            1.0,
        );
        let aabb = world_aabb(Placed::new(&mesh, &xf));
        assert!((aabb.maxs.x - std::f32::consts::SQRT_2).abs() < 1.0e-4);
        assert!((aabb.maxs.y - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn min_height_uses_world_vertices() {
        let mesh = Mesh::cuboid(Point3::new(0.0, 3.0, 0.0), Vec3::new(1.0, 0.25, 1.0));
        let xf = trs(Vec3::new(0.0, -1.0, 0.0), Quat::identity(), 1.0);
        assert!((min_height(Placed::new(&mesh, &xf)) - 1.75).abs() < 1.0e-6);
        assert_eq!(min_height(Placed::new(&Mesh::default(), &Mat4::identity())), f32::MAX);
    }

    #[test]
    fn centroid_is_transformed_box_center() {
        let mesh = Mesh::cuboid(Point3::new(1.0, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5));
        let xf = trs(Vec3::new(0.0, 2.0, 0.0), Quat::identity(), 1.0);
        assert!((centroid(Placed::new(&mesh, &xf)) - Point3::new(1.0, 2.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn inflate_and_intersect() {
        let a = Aabb {
            mins: Point3::new(0.0, 0.0, 0.0),
            maxs: Point3::new(1.0, 1.0, 1.0),
        };
        let b = Aabb {
            mins: Point3::new(1.005, 0.0, 0.0),
            maxs: Point3::new(2.0, 1.0, 1.0),
        };
        assert!(!aabb_intersects(&a, &b));
        assert!(aabb_intersects(&aabb_inflate(&a, 0.01), &b));
        assert!(aabb_intersects(&a, &a));
    }
}
