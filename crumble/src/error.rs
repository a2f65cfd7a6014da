use thiserror::Error;

use crate::mesh::PieceId;

/// Everything that can abort a smash run.
///
/// All of these are raised before the first event reaches the sink, so a failed run
/// never leaves half-written animation behind.
#[derive(Debug, Error, PartialEq)]
pub enum SmashError {
    #[error("a target object is required")]
    MissingTarget,

    #[error("the target needs rigid body settings")]
    NoRigidBody,

    #[error("setting `{name}` is out of range: {value}")]
    InvalidSetting { name: &'static str, value: f32 },

    #[error("fracturing produced no pieces")]
    EmptyFracture,

    #[error("piece {0} has no vertices")]
    EmptyPiece(PieceId),

    #[error("fracture failed: {0}")]
    Fracture(String),
}
