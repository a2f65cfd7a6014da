use std::fmt;

use crate::{
    bitmask_flags::CollisionCollections,
    types::{Mat4, Point3, Vec3},
};

/// Dense index of a fracture piece. Assigned by the fracturing service in creation order
/// and used as the node id of the connectivity graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(pub u32);

impl PieceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for PieceId {
    fn from(i: usize) -> Self {
        Self(i as u32)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece#{}", self.0)
    }
}

/// Triangle mesh in local (object) space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Axis-aligned box mesh centered on `center` (8 vertices, 12 triangles).
    pub fn cuboid(center: Point3, half_extents: Vec3) -> Self {
        let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);
        #[rustfmt::skip]
        let corners = [
            Vec3::new(-hx, -hy, -hz), // left bottom rear
            Vec3::new(-hx, -hy,  hz), // left bottom front
            Vec3::new(-hx,  hy, -hz), // left top rear
            Vec3::new(-hx,  hy,  hz), // left top front
            Vec3::new( hx, -hy, -hz), // right bottom rear
            Vec3::new( hx, -hy,  hz), // right bottom front
            Vec3::new( hx,  hy, -hz), // right top rear
            Vec3::new( hx,  hy,  hz), // right top front
        ];
        #[rustfmt::skip]
        let triangles = vec![
            [1, 0, 4], [5, 1, 4], // bottom
            [6, 2, 3], [6, 3, 7], // top
            [0, 1, 2], [3, 2, 1], // left
            [4, 6, 7], [4, 7, 5], // right
            [0, 2, 6], [0, 6, 4], // back
            [5, 7, 3], [3, 1, 5], // front
        ];

        Self {
            vertices: corners.iter().map(|c| center + *c).collect(),
            triangles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Local min/max corners, or `None` for a mesh without vertices.
    pub fn local_bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.inf(v), hi.sup(v))
        }))
    }

    /// The 8 corners of the local bounding box. All at the origin for an empty mesh.
    pub fn bound_box(&self) -> [Point3; 8] {
        let (lo, hi) = self
            .local_bounds()
            .unwrap_or((Point3::origin(), Point3::origin()));
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Center of the local bounding box.
    pub fn bound_center(&self) -> Point3 {
        let corners = self.bound_box();
        let sum = corners.iter().fold(Vec3::zeros(), |acc, c| acc + c.coords);
        Point3::from(sum / 8.0)
    }
}

/// Physical properties the target hands down to its fragments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBodySettings {
    /// Mass per unit volume (kg / m^3).
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub collections: CollisionCollections,
}

impl Default for RigidBodySettings {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            collections: CollisionCollections::first_only(),
        }
    }
}

/// A scene object taking part in a smash: the target or the impactor.
#[derive(Clone, Debug)]
pub struct Body {
    pub name: String,
    pub mesh: Mesh,
    /// Only the target needs these. Fragments inherit them.
    pub rigid_body: Option<RigidBodySettings>,
}

impl Body {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            rigid_body: None,
        }
    }

    pub fn with_rigid_body(mut self, settings: RigidBodySettings) -> Self {
        self.rigid_body = Some(settings);
        self
    }
}

/// One fragment produced by the fracturing service.
///
/// The mesh is expressed around the piece's own origin; `transform` places it in the
/// world at the moment of creation.
#[derive(Clone, Debug)]
pub struct Piece {
    pub id: PieceId,
    pub mesh: Mesh,
    pub transform: Mat4,
    pub rigid_body: RigidBodySettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_bounds_match_half_extents() {
        let mesh = Mesh::cuboid(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 1.5));
        let (lo, hi) = mesh.local_bounds().unwrap();
        assert_eq!(lo, Point3::new(0.5, 1.0, 1.5));
        assert_eq!(hi, Point3::new(1.5, 3.0, 4.5));
        assert_eq!(mesh.triangles.len(), 12);
        assert!(mesh.triangles.iter().flatten().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn bound_center_is_box_center() {
        let mesh = Mesh::cuboid(Point3::new(-2.0, 0.0, 4.0), Vec3::new(1.0, 1.0, 1.0));
        assert!((mesh.bound_center() - Point3::new(-2.0, 0.0, 4.0)).norm() < 1.0e-6);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let mesh = Mesh::default();
        assert!(mesh.is_empty());
        assert!(mesh.local_bounds().is_none());
        assert_eq!(mesh.bound_center(), Point3::origin());
    }
}
