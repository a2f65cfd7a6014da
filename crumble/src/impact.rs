//! First-contact detection and the fracture hand-off.
//!
//! The detector walks the timeline once. Every sampled [`Frame`] is kept so the shock pass
//! can replay the same transforms without touching the scene again.

use log::{debug, info};

use crate::{
    error::SmashError,
    fracture::Fracture,
    mesh::{Body, Piece},
    probe::{self, Placed},
    scene::{Frame, SceneStepper},
    stopwatch::LogStopwatch,
    types::{Mat4, Point3, inverse_or_identity},
};

/// Where and when the impactor first touched the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactRecord {
    /// Contact point in the target's local space at the impact frame.
    pub local: Point3,
    /// Contact point in world space.
    pub global: Point3,
    pub frame: i32,
}

/// A detected impact together with the pieces it produced.
#[derive(Clone, Debug)]
pub struct Impact {
    pub record: ImpactRecord,
    pub pieces: Vec<Piece>,
    /// `inverse(target world at impact) * piece world`, indexed by piece id.
    pub relative: Vec<Mat4>,
}

/// Result of the detection pass.
#[derive(Clone, Debug, Default)]
pub struct ImpactOutcome {
    /// Every frame of the timeline, in order.
    pub frames: Vec<Frame>,
    pub impact: Option<Impact>,
}

/// Walks the timeline looking for the first frame where `impactor` touches `target`.
pub struct ImpactDetector<'a> {
    pub target: &'a Body,
    pub impactor: &'a Body,
    pub crack_gap: f32,
    pub source_limit: u32,
}

impl<'a> ImpactDetector<'a> {
    pub fn new(target: &'a Body, impactor: &'a Body, crack_gap: f32, source_limit: u32) -> Self {
        Self {
            target,
            impactor,
            crack_gap,
            source_limit,
        }
    }

    pub fn run<S, F>(&self, stepper: &mut S, fracture: &mut F) -> Result<ImpactOutcome, SmashError>
    where
        S: SceneStepper + ?Sized,
        F: Fracture + ?Sized,
    {
        let timeline = stepper.timeline();
        let mut outcome = ImpactOutcome {
            frames: Vec::with_capacity(timeline.len()),
            impact: None,
        };

        for index in timeline.frames() {
            let frame = stepper.sample(index);
            outcome.frames.push(frame);

            // Fracture happens once; later frames are only sampled.
            if outcome.impact.is_some() {
                continue;
            }

            let contact = probe::overlap_contact(
                Placed::body(self.impactor, &frame.impactor),
                Placed::body(self.target, &frame.target),
            );
            if let Some(global) = contact {
                info!(
                    "`{}` hits `{}` at frame {} ({:.3}, {:.3}, {:.3})",
                    self.impactor.name, self.target.name, index, global.x, global.y, global.z
                );
                outcome.impact = Some(self.fracture_at(&frame, global, fracture)?);
            }
        }

        if outcome.impact.is_none() {
            info!(
                "`{}` never touches `{}` in {}..{}",
                self.impactor.name, self.target.name, timeline.start, timeline.end
            );
        }
        Ok(outcome)
    }

    fn fracture_at<F>(&self, frame: &Frame, global: Point3, fracture: &mut F) -> Result<Impact, SmashError>
    where
        F: Fracture + ?Sized,
    {
        let inverse_target = inverse_or_identity(&frame.target);
        let record = ImpactRecord {
            local: inverse_target.transform_point(&global),
            global,
            frame: frame.index,
        };

        let pieces = {
            let _sw = LogStopwatch::new("fracture");
            fracture.fracture(self.target, &frame.target, self.crack_gap, self.source_limit)?
        };
        check_pieces(&pieces)?;
        debug!("{} pieces from `{}`", pieces.len(), self.target.name);

        let relative = pieces.iter().map(|p| inverse_target * p.transform).collect();

        Ok(Impact {
            record,
            pieces,
            relative,
        })
    }
}

fn check_pieces(pieces: &[Piece]) -> Result<(), SmashError> {
    if pieces.is_empty() {
        return Err(SmashError::EmptyFracture);
    }
    for (i, piece) in pieces.iter().enumerate() {
        if piece.id.index() != i {
            return Err(SmashError::Fracture(format!(
                "piece ids must be dense, found {} at position {}",
                piece.id, i
            )));
        }
        if piece.mesh.is_empty() {
            return Err(SmashError::EmptyPiece(piece.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fracture::GridFracture,
        mesh::{Mesh, PieceId, RigidBodySettings},
        scene::{KeyframedScene, Timeline, Track},
        types::{Pose, Quat, Vec3},
    };

    fn at(x: f32, y: f32) -> Pose {
        Pose::new(Vec3::new(x, y, 0.0), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    fn bodies() -> (Body, Body) {
        let target = Body::new("wall", Mesh::cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 0.25)))
            .with_rigid_body(RigidBodySettings::default());
        let impactor = Body::new("ball", Mesh::cuboid(Point3::origin(), Vec3::new(0.2, 0.2, 0.2)));
        (target, impactor)
    }

    /// Impactor slides along +X towards a wall centered at x = 5 and enters it at frame 10.
    fn approaching_scene() -> KeyframedScene {
        KeyframedScene::new(
            Timeline::new(1, 100, 24.0),
            Track::fixed(at(5.0, 1.0)),
            Track::default().with_key(1, at(-5.0, 1.0)).with_key(100, at(94.0, 1.0)),
        )
    }

    #[test]
    fn first_contact_frame_and_contact_point() {
        let (target, impactor) = bodies();
        let mut scene = approaching_scene();
        let mut fracture_calls = 0;
        let mut fracture = |t: &Body, w: &Mat4, g: f32, n: u32| -> Result<Vec<Piece>, SmashError> {
            fracture_calls += 1;
            GridFracture.fracture(t, w, g, n)
        };

        let outcome = ImpactDetector::new(&target, &impactor, 0.001, 8)
            .run(&mut scene, &mut fracture)
            .unwrap();

        // Ball right face at x = -5 + (f - 1) + 0.2, wall left face at x = 4.
        // f = 9 leaves a 0.2 gap; f = 10 puts the ball across the face.
        let impact = outcome.impact.expect("impact");
        assert_eq!(impact.record.frame, 10);
        assert_eq!(fracture_calls, 1);
        assert_eq!(outcome.frames.len(), 99);
        assert_eq!(outcome.frames[0].index, 1);

        // Contact is on the wall's -X face, local = world - wall origin.
        assert!((impact.record.global.x - 4.0).abs() < 1.0e-4);
        let expected_local = impact.record.global - Vec3::new(5.0, 1.0, 0.0);
        assert!((impact.record.local - expected_local).norm() < 1.0e-4);

        assert_eq!(impact.relative.len(), impact.pieces.len());
    }

    #[test]
    fn relative_transforms_recompose_to_piece_transforms() {
        let (target, impactor) = bodies();
        let mut scene = approaching_scene();
        let outcome = ImpactDetector::new(&target, &impactor, 0.001, 8)
            .run(&mut scene, &mut GridFracture)
            .unwrap();
        let impact = outcome.impact.unwrap();
        let target_world = outcome.frames[(impact.record.frame - 1) as usize].target;

        for (piece, rel) in impact.pieces.iter().zip(&impact.relative) {
            let back = target_world * rel;
            assert!((back - piece.transform).abs().max() < 1.0e-5);
        }
    }

    #[test]
    fn no_contact_is_not_an_error() {
        let (target, impactor) = bodies();
        let mut scene = KeyframedScene::new(
            Timeline::new(1, 20, 24.0),
            Track::fixed(at(5.0, 1.0)),
            Track::fixed(at(-50.0, 1.0)),
        );
        let outcome = ImpactDetector::new(&target, &impactor, 0.001, 8)
            .run(&mut scene, &mut GridFracture)
            .unwrap();
        assert!(outcome.impact.is_none());
        assert_eq!(outcome.frames.len(), 19);
    }

    #[test]
    fn bad_fracture_output_is_rejected() {
        let (target, impactor) = bodies();

        let mut empty = |_: &Body, _: &Mat4, _: f32, _: u32| -> Result<Vec<Piece>, SmashError> { Ok(Vec::new()) };
        let err = ImpactDetector::new(&target, &impactor, 0.001, 8)
            .run(&mut approaching_scene(), &mut empty)
            .unwrap_err();
        assert_eq!(err, SmashError::EmptyFracture);

        let mut hollow = |_: &Body, w: &Mat4, _: f32, _: u32| -> Result<Vec<Piece>, SmashError> {
            Ok(vec![Piece {
                id: PieceId(0),
                mesh: Mesh::default(),
                transform: *w,
                rigid_body: RigidBodySettings::default(),
            }])
        };
        let err = ImpactDetector::new(&target, &impactor, 0.001, 8)
            .run(&mut approaching_scene(), &mut hollow)
            .unwrap_err();
        assert_eq!(err, SmashError::EmptyPiece(PieceId(0)));
    }
}
