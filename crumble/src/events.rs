use crate::{bitmask_flags::CollisionCollections, mesh::PieceId, types::Pose};

/// Which scene object an event is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Target,
    Piece(PieceId),
}

/// Animation and physics changes produced by a smash run, in emission order.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The piece stops following the target and becomes a dynamic body from `frame` on.
    Released { piece: PieceId, frame: i32 },
    /// Keyed transform of a still attached piece.
    Pose { piece: PieceId, frame: i32, pose: Pose },
    /// Keyed render/viewport visibility.
    Visibility { object: ObjectRef, frame: i32, visible: bool },
    /// Keyed collision collection membership.
    CollisionGroups {
        object: ObjectRef,
        frame: i32,
        collections: CollisionCollections,
    },
    /// Every event of `frame` has been emitted.
    FrameEnd { frame: i32 },
}

impl Event {
    pub fn frame(&self) -> i32 {
        match self {
            Event::Released { frame, .. }
            | Event::Pose { frame, .. }
            | Event::Visibility { frame, .. }
            | Event::CollisionGroups { frame, .. }
            | Event::FrameEnd { frame } => *frame,
        }
    }
}

/// Receiver of smash output.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) {
        (**self).emit(event);
    }
}

/// Fans every event out to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: Event) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}

/// Event log with lookup helpers.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    events: Vec<Event>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Frame at which `piece` was released, if ever.
    pub fn release_frame(&self, piece: PieceId) -> Option<i32> {
        self.events.iter().find_map(|e| match e {
            Event::Released { piece: p, frame } if *p == piece => Some(*frame),
            _ => None,
        })
    }

    pub fn released_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Released { .. }))
            .count()
    }

    /// Keyed poses of one piece, in frame order.
    pub fn poses(&self, piece: PieceId) -> impl Iterator<Item = (i32, &Pose)> + '_ {
        self.events.iter().filter_map(move |e| match e {
            Event::Pose { piece: p, frame, pose } if *p == piece => Some((*frame, pose)),
            _ => None,
        })
    }

    pub fn last_pose_frame(&self, piece: PieceId) -> Option<i32> {
        self.poses(piece).map(|(f, _)| f).last()
    }
}

impl EventSink for Recording {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
