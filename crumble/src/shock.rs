//! Progressive release of fracture pieces.
//!
//! After the impact a spherical shock front grows from the contact point. Each frame, every
//! piece still attached to the target is either released (handed to the physics side as a
//! dynamic body) or keyed at the pose it has while rigidly following the target.
//!
//! A piece is released once the hit is underway (strictly after the impact frame) and any of
//! the following holds:
//! - its bounding-box center lies inside the shock front
//! - the impactor overlaps it
//! - it lost every path to the ground (only with disconnection detection)

use log::debug;

use crate::{
    events::{Event, EventSink},
    graph::ConnectivityGraph,
    impact::Impact,
    mesh::{Body, Mesh, PieceId},
    probe::{self, Placed},
    scene::Frame,
    types::{Mat4, Point3, Pose},
};

/// Size of the shock front.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShockState {
    /// Seconds since the first frame after the impact, capped at the shock duration.
    pub elapsed: f32,
    pub radius: f32,
}

impl ShockState {
    /// Grow the front by one frame. Once `duration` is reached the state is frozen.
    pub fn advance(&mut self, dt: f32, speed: f32, duration: f32) {
        if self.elapsed >= duration {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(duration);
        self.radius = self.elapsed * speed;
    }
}

/// Per-piece state. The only transition is `Attached -> Released`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Attached,
    Released,
}

/// Why a piece was let go. Reported in debug logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseCause {
    Disconnected,
    Shock,
    Overlap,
}

pub struct ShockSimulator<'a> {
    impactor: &'a Body,
    impact: &'a Impact,
    graph: ConnectivityGraph,
    speed: f32,
    duration: f32,
    frame_duration: f32,
    shock: ShockState,
    lifecycle: Vec<LifecycleState>,
    release_frames: Vec<Option<i32>>,
}

impl<'a> ShockSimulator<'a> {
    pub fn new(
        impactor: &'a Body,
        impact: &'a Impact,
        graph: ConnectivityGraph,
        speed: f32,
        duration: f32,
        frame_duration: f32,
    ) -> Self {
        let n = impact.pieces.len();
        Self {
            impactor,
            impact,
            graph,
            speed,
            duration,
            frame_duration,
            shock: ShockState::default(),
            lifecycle: vec![LifecycleState::Attached; n],
            release_frames: vec![None; n],
        }
    }

    pub fn shock(&self) -> ShockState {
        self.shock
    }

    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    pub fn lifecycle(&self, id: PieceId) -> LifecycleState {
        self.lifecycle.get(id.index()).copied().unwrap_or_default()
    }

    /// Release frame per piece id, `None` for pieces that stayed attached.
    pub fn release_frames(&self) -> &[Option<i32>] {
        &self.release_frames
    }

    pub fn released_count(&self) -> usize {
        self.release_frames.iter().filter(|f| f.is_some()).count()
    }

    /// Run every frame in order, closing each with [`Event::FrameEnd`]. `before` sees each
    /// frame ahead of the piece updates and may emit its own events into `sink`.
    pub fn run<K, H>(&mut self, frames: &[Frame], sink: &mut K, mut before: H)
    where
        K: EventSink + ?Sized,
        H: FnMut(&Frame, &mut K),
    {
        for frame in frames {
            before(frame, sink);
            self.step(frame, sink);
            sink.emit(Event::FrameEnd { frame: frame.index });
        }
    }

    /// Evaluate one frame. Returns the number of pieces released in it.
    pub fn step<K: EventSink + ?Sized>(&mut self, frame: &Frame, sink: &mut K) -> usize {
        let in_hit_sequence = frame.index > self.impact.record.frame;
        if in_hit_sequence {
            self.shock.advance(self.frame_duration, self.speed, self.duration);
        }

        let origin = frame.target.transform_point(&self.impact.record.local);
        let mut released = 0;

        for (i, piece) in self.impact.pieces.iter().enumerate() {
            if self.lifecycle[i] == LifecycleState::Released {
                continue;
            }

            let world = frame.target * self.impact.relative[i];

            let cause = if in_hit_sequence {
                self.release_cause(piece.id, &piece.mesh, &world, frame, &origin)
            } else {
                None
            };

            match cause {
                Some(cause) => {
                    debug!("{} released at frame {} ({:?})", piece.id, frame.index, cause);
                    self.graph.set_crumbled(piece.id);
                    self.lifecycle[i] = LifecycleState::Released;
                    self.release_frames[i] = Some(frame.index);
                    released += 1;
                    sink.emit(Event::Released {
                        piece: piece.id,
                        frame: frame.index,
                    });
                }
                None => sink.emit(Event::Pose {
                    piece: piece.id,
                    frame: frame.index,
                    pose: Pose::from_matrix(&world),
                }),
            }
        }

        released
    }

    fn release_cause(
        &self,
        id: PieceId,
        mesh: &Mesh,
        world: &Mat4,
        frame: &Frame,
        origin: &Point3,
    ) -> Option<ReleaseCause> {
        if !self.graph.is_connected_to_base(id) {
            return Some(ReleaseCause::Disconnected);
        }

        let placed = Placed::new(mesh, world);
        let distance = (probe::centroid(placed) - origin).norm();
        if distance < self.shock.radius {
            return Some(ReleaseCause::Shock);
        }

        probe::overlap_contact(Placed::body(self.impactor, &frame.impactor), placed)
            .map(|_| ReleaseCause::Overlap)
    }
}
