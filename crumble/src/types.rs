/*!
Core math aliases and pose types shared by every stage of the smash pipeline.

This module intentionally contains no algorithms beyond pose (de)composition. It
defines the data exchanged between:
- probe   (bounding boxes, vertex scans, triangle overlap)
- impact  (per-frame sampling and relative transforms)
- shock   (pose reconstruction for attached pieces)
- physics (kinematic targets for the rapier bridge)

World transforms are full affine 4x4 matrices because fracture pieces inherit
whatever scale the target carries. Anything that needs a rigid isometry (rapier)
goes through [`Pose`] and drops the scale.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type Mat4 = na::Matrix4<f32>;

/// Columns whose length falls below this are treated as collapsed when decomposing.
const DEGENERATE_AXIS: f32 = 1.0e-12;

/// A decomposed affine transform: translation, rotation and per-axis scale.
///
/// This is what gets emitted for attached pieces every frame; the animation side
/// stores it as location / rotation / scale channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Rebuild the 4x4 matrix `T * R * S`.
    pub fn to_matrix(&self) -> Mat4 {
        let mut m = self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    /// Split an affine matrix into translation, rotation and scale.
    ///
    /// Shear is not representable and is folded into the rotation estimate. A negative
    /// determinant is carried by flipping the sign of the X scale.
    pub fn from_matrix(m: &Mat4) -> Self {
        let translation = m.fixed_view::<3, 1>(0, 3).into_owned();
        let mut linear: na::Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();

        let mut scale = Vec3::new(
            linear.column(0).norm(),
            linear.column(1).norm(),
            linear.column(2).norm(),
        );
        if linear.determinant() < 0.0 {
            scale.x = -scale.x;
        }

        for axis in 0..3 {
            if scale[axis].abs() > DEGENERATE_AXIS {
                let unit = linear.column(axis) / scale[axis];
                linear.set_column(axis, &unit);
            }
        }

        let rotation =
            Quat::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(linear));

        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Rigid part of the pose, for consumers that cannot represent scale.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform a point by an affine matrix.
#[inline]
pub fn transform_point(m: &Mat4, p: &Point3) -> Point3 {
    m.transform_point(p)
}

/// Build a matrix from translation, rotation and uniform scale.
pub fn trs(translation: Vec3, rotation: Quat, scale: f32) -> Mat4 {
    Pose::new(translation, rotation, Vec3::new(scale, scale, scale)).to_matrix()
}

/// Inverse of an affine transform, falling back to identity for singular matrices.
///
/// A fully collapsed target (zero scale on some axis) has no meaningful local frame; the
/// identity keeps the relative transforms finite instead of poisoning them with NaNs.
pub fn inverse_or_identity(m: &Mat4) -> Mat4 {
    m.try_inverse().unwrap_or_else(Mat4::identity)
}
