use log::info;

use crate::{
    bitmask_flags::CollisionCollections,
    error::SmashError,
    events::{Event, EventSink, ObjectRef},
    fracture::Fracture,
    graph::ConnectivityGraph,
    impact::{ImpactDetector, ImpactRecord},
    mesh::{Body, Piece, PieceId},
    scene::SceneStepper,
    settings::SmashSettings,
    shock::ShockSimulator,
    stopwatch::LogStopwatch,
};

/// Summary of a finished run.
#[derive(Clone, Debug, Default)]
pub struct SmashReport {
    /// `None` when the impactor never reached the target; nothing was emitted then.
    pub impact: Option<ImpactRecord>,
    /// Pieces as created at the impact frame.
    pub pieces: Vec<Piece>,
    pub base_count: usize,
    /// Release frame per piece id.
    pub release_frames: Vec<Option<i32>>,
    pub frames_sampled: usize,
}

impl SmashReport {
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn released_count(&self) -> usize {
        self.release_frames.iter().filter(|f| f.is_some()).count()
    }

    pub fn release_frame(&self, piece: PieceId) -> Option<i32> {
        self.release_frames.get(piece.index()).copied().flatten()
    }
}

/// Smash `target` with `impactor` over the stepper's timeline.
///
/// Steps:
/// - validate inputs (nothing is emitted on error)
/// - find the first contact and fracture the target there
/// - build the connection graph
/// - replay every frame through the shock simulation, handing the target over to its pieces
///   at the impact frame
///
/// The scene is left at the start of its timeline.
pub fn smash<S, F, K>(
    target: Option<&Body>,
    impactor: &Body,
    settings: &SmashSettings,
    stepper: &mut S,
    fracture: &mut F,
    sink: &mut K,
) -> Result<SmashReport, SmashError>
where
    S: SceneStepper + ?Sized,
    F: Fracture + ?Sized,
    K: EventSink + ?Sized,
{
    let target = target.ok_or(SmashError::MissingTarget)?;
    let target_settings = target.rigid_body.ok_or(SmashError::NoRigidBody)?;
    settings.validate()?;
    let timeline = stepper.timeline();
    if timeline.is_empty() {
        info!("Timeline {}..{} has no frames, nothing to smash", timeline.start, timeline.end);
        return Ok(SmashReport::default());
    }

    let mut sw = LogStopwatch::new(format!("smash `{}`", target.name));

    sw.span("impact");
    let detector = ImpactDetector::new(target, impactor, settings.crack_gap, settings.source_limit);
    let outcome = detector.run(stepper, fracture);
    stepper.sample(timeline.start);
    let outcome = outcome?;

    let mut report = SmashReport {
        frames_sampled: outcome.frames.len(),
        ..Default::default()
    };
    let Some(impact) = outcome.impact else {
        return Ok(report);
    };

    sw.span("connection graph");
    let graph = ConnectivityGraph::build(&impact.pieces, settings.detect_disconnected);
    let base_count = graph.base_count();

    sw.span("shock");
    let hit = impact.record.frame;
    let mut sim = ShockSimulator::new(
        impactor,
        &impact,
        graph,
        settings.shock_speed,
        settings.shock_duration,
        timeline.frame_duration(),
    );
    sim.run(&outcome.frames, sink, |frame, sink| {
        if frame.index == hit {
            hand_over(&impact.pieces, target_settings.collections, hit, sink);
        }
    });
    sw.end_span();

    report.release_frames = sim.release_frames().to_vec();
    report.base_count = base_count;
    report.impact = Some(impact.record);
    report.pieces = impact.pieces;

    info!(
        "Smashed `{}` at frame {}: {} pieces, {} released, {} base",
        target.name,
        hit,
        report.piece_count(),
        report.released_count(),
        report.base_count
    );
    Ok(report)
}

/// Swap the target out for its pieces at `frame`: visibility and collision collections are
/// keyed on `frame - 1` (old state) and `frame` (new state).
fn hand_over<K: EventSink + ?Sized>(
    pieces: &[Piece],
    collections: CollisionCollections,
    frame: i32,
    sink: &mut K,
) {
    let none = CollisionCollections::default();

    for (at, target_on) in [(frame - 1, true), (frame, false)] {
        sink.emit(Event::Visibility {
            object: ObjectRef::Target,
            frame: at,
            visible: target_on,
        });
        sink.emit(Event::CollisionGroups {
            object: ObjectRef::Target,
            frame: at,
            collections: if target_on { collections } else { none },
        });

        for piece in pieces {
            let object = ObjectRef::Piece(piece.id);
            sink.emit(Event::Visibility {
                object,
                frame: at,
                visible: !target_on,
            });
            sink.emit(Event::CollisionGroups {
                object,
                frame: at,
                collections: if target_on { none } else { collections },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Recording,
        fracture::GridFracture,
        mesh::{Mesh, RigidBodySettings},
        types::Mat4,
        scene::{KeyframedScene, Timeline, Track},
        types::{Point3, Pose, Quat, Vec3},
    };

    fn at(x: f32) -> Pose {
        Pose::new(Vec3::new(x, 1.0, 0.0), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    fn wall() -> Body {
        Body::new("wall", Mesh::cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 0.25)))
            .with_rigid_body(RigidBodySettings::default())
    }

    fn ball() -> Body {
        Body::new("ball", Mesh::cuboid(Point3::origin(), Vec3::new(0.2, 0.2, 0.2)))
    }

    fn scene(impactor: Track) -> KeyframedScene {
        KeyframedScene::new(Timeline::new(1, 30, 24.0), Track::fixed(at(5.0)), impactor)
    }

    #[test]
    fn validation_happens_before_any_event() {
        let mut rec = Recording::new();
        let mut s = scene(Track::fixed(at(5.0)));

        let err = smash(None, &ball(), &SmashSettings::default(), &mut s, &mut GridFracture, &mut rec);
        assert_eq!(err.unwrap_err(), SmashError::MissingTarget);

        let loose = Body::new("loose", Mesh::cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0)));
        let err = smash(Some(&loose), &ball(), &SmashSettings::default(), &mut s, &mut GridFracture, &mut rec);
        assert_eq!(err.unwrap_err(), SmashError::NoRigidBody);

        let bad = SmashSettings {
            shock_speed: 2000.0,
            ..Default::default()
        };
        let err = smash(Some(&wall()), &ball(), &bad, &mut s, &mut GridFracture, &mut rec);
        assert!(matches!(err, Err(SmashError::InvalidSetting { name: "shock_speed", .. })));

        assert!(rec.is_empty());
    }

    #[test]
    fn empty_timeline_finishes_without_an_impact() {
        let mut rec = Recording::new();
        let mut calls = 0;
        let mut fracture = |target: &Body, world: &Mat4, gap: f32, limit: u32| -> Result<Vec<Piece>, SmashError> {
            calls += 1;
            GridFracture.fracture(target, world, gap, limit)
        };

        for (start, end) in [(5, 5), (9, 3)] {
            let mut empty = KeyframedScene::new(Timeline::new(start, end, 24.0), Track::default(), Track::default());
            let report = smash(Some(&wall()), &ball(), &SmashSettings::default(), &mut empty, &mut fracture, &mut rec)
                .unwrap();
            assert!(report.impact.is_none());
            assert_eq!(report.piece_count(), 0);
            assert_eq!(report.frames_sampled, 0);
        }

        assert_eq!(calls, 0);
        assert!(rec.is_empty());
    }

    #[test]
    fn hand_over_keys_both_sides_of_the_impact_frame() {
        let mut s = scene(Track::default().with_key(1, at(0.0)).with_key(29, at(28.0)));
        let mut rec = Recording::new();
        let settings = SmashSettings {
            source_limit: 4,
            ..Default::default()
        };
        let report = smash(Some(&wall()), &ball(), &settings, &mut s, &mut GridFracture, &mut rec).unwrap();
        let hit = report.impact.unwrap().frame;

        let target_visibility: Vec<_> = rec
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Visibility {
                    object: ObjectRef::Target,
                    frame,
                    visible,
                } => Some((*frame, *visible)),
                _ => None,
            })
            .collect();
        assert_eq!(target_visibility, vec![(hit - 1, true), (hit, false)]);

        let piece_groups = rec.events().iter().rev().find_map(|e| match e {
            Event::CollisionGroups {
                object: ObjectRef::Piece(_),
                frame,
                collections,
            } => Some((*frame, *collections)),
            _ => None,
        });
        assert_eq!(piece_groups, Some((hit, CollisionCollections::first_only())));
        assert_eq!(s.current_frame(), 1);
    }
}
