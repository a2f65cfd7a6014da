use log::debug;

use crate::{
    error::SmashError,
    mesh::{Body, Mesh, Piece, PieceId},
    types::{Mat4, Point3, Vec3},
};

/// Hard cap on the number of cells when no source limit is requested.
pub const UNLIMITED_CELL_CAP: u32 = 4096;

/// Splits a target into pieces.
///
/// Implementations must return pieces with ids `0..n` in order, each carrying a copy of the
/// target's rigid body settings, placed so that together they cover the target at `world`.
pub trait Fracture {
    fn fracture(
        &mut self,
        target: &Body,
        world: &Mat4,
        crack_gap: f32,
        source_limit: u32,
    ) -> Result<Vec<Piece>, SmashError>;
}

impl<F> Fracture for F
where
    F: FnMut(&Body, &Mat4, f32, u32) -> Result<Vec<Piece>, SmashError>,
{
    fn fracture(
        &mut self,
        target: &Body,
        world: &Mat4,
        crack_gap: f32,
        source_limit: u32,
    ) -> Result<Vec<Piece>, SmashError> {
        self(target, world, crack_gap, source_limit)
    }
}

/// Cuts the target's local bounding box into a grid of cuboid cells.
///
/// The grid resolution is picked so cells stay as close to cubes as the cell budget allows.
/// Every cell is shrunk by half the crack gap on each side, so neighbours end up exactly
/// `crack_gap` apart, and each piece's origin sits at its cell center.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridFracture;

impl GridFracture {
    /// Cells per axis for a box of `extent` with at most `budget` cells.
    pub fn grid_dims(extent: Vec3, budget: u32) -> [u32; 3] {
        let budget = budget.max(1);
        let mut dims = [1u32; 3];

        loop {
            // Split the axis with the largest cells first.
            let mut axes = [0usize, 1, 2];
            axes.sort_by(|&a, &b| {
                let sa = extent[a] / dims[a] as f32;
                let sb = extent[b] / dims[b] as f32;
                sb.total_cmp(&sa)
            });

            let product = |d: &[u32; 3]| d[0] as u64 * d[1] as u64 * d[2] as u64;
            let grown = axes.iter().find_map(|&axis| {
                if extent[axis] <= 0.0 {
                    return None;
                }
                let mut next = dims;
                next[axis] += 1;
                (product(&next) <= budget as u64).then_some(next)
            });

            match grown {
                Some(next) => dims = next,
                None => return dims,
            }
        }
    }
}

impl Fracture for GridFracture {
    fn fracture(
        &mut self,
        target: &Body,
        world: &Mat4,
        crack_gap: f32,
        source_limit: u32,
    ) -> Result<Vec<Piece>, SmashError> {
        let rigid_body = target.rigid_body.ok_or(SmashError::NoRigidBody)?;
        let (lo, hi) = target
            .mesh
            .local_bounds()
            .ok_or_else(|| SmashError::Fracture(format!("`{}` has no vertices", target.name)))?;

        let budget = match source_limit {
            0 => UNLIMITED_CELL_CAP,
            n => n.min(UNLIMITED_CELL_CAP),
        };
        let extent = hi - lo;
        let dims = Self::grid_dims(extent, budget);
        let cell = Vec3::new(
            extent.x / dims[0] as f32,
            extent.y / dims[1] as f32,
            extent.z / dims[2] as f32,
        );

        // Never let the gap eat a cell entirely.
        let half_gap = crack_gap.max(0.0) * 0.5;
        let half = (cell * 0.5).map(|h| (h - half_gap).max(h * 0.5));

        debug!(
            "Fracturing `{}` into {}x{}x{} cells (gap {})",
            target.name, dims[0], dims[1], dims[2], crack_gap
        );

        let mut pieces = Vec::with_capacity((dims[0] * dims[1] * dims[2]) as usize);
        for ix in 0..dims[0] {
            for iy in 0..dims[1] {
                for iz in 0..dims[2] {
                    let center = Point3::new(
                        lo.x + (ix as f32 + 0.5) * cell.x,
                        lo.y + (iy as f32 + 0.5) * cell.y,
                        lo.z + (iz as f32 + 0.5) * cell.z,
                    );
                    pieces.push(Piece {
                        id: PieceId::from(pieces.len()),
                        mesh: Mesh::cuboid(Point3::origin(), half),
                        transform: world * Mat4::new_translation(&center.coords),
                        rigid_body,
                    });
                }
            }
        }

        Ok(pieces)
    }
}
