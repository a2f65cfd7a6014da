//! Scene stepping: the animation timeline and per-frame transform sampling.
//!
//! Everything downstream of the stepper receives an explicit [`Frame`] instead of reading
//! "current" transforms from shared scene state.

use std::ops::Range;

use crate::{
    constants::DEFAULT_FPS,
    types::{Mat4, Pose},
};

/// Half-open frame range `start..end` played back at `fps`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    pub start: i32,
    pub end: i32,
    pub fps: f32,
}

impl Timeline {
    pub fn new(start: i32, end: i32, fps: f32) -> Self {
        Self { start, end, fps }
    }

    pub fn frames(&self) -> Range<i32> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        (i64::from(self.end) - i64::from(self.start)).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Seconds per frame. Non-positive rates fall back to the default rate.
    pub fn frame_duration(&self) -> f32 {
        let fps = if self.fps > 0.0 { self.fps } else { DEFAULT_FPS };
        1.0 / fps
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(1, 250, DEFAULT_FPS)
    }
}

/// World transforms of the two participating bodies at one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub index: i32,
    pub target: Mat4,
    pub impactor: Mat4,
}

/// Source of per-frame world transforms.
pub trait SceneStepper {
    fn timeline(&self) -> Timeline;

    /// Evaluate the scene at `frame`. Also moves the scene's current frame there.
    fn sample(&mut self, frame: i32) -> Frame;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: i32,
    pub pose: Pose,
}

/// Keyframed transform channel. Translation and scale are interpolated linearly,
/// rotation spherically. Outside the keyed range the nearest key holds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    keys: Vec<Keyframe>,
}

impl Track {
    /// A track that never moves.
    pub fn fixed(pose: Pose) -> Self {
        Self {
            keys: vec![Keyframe { frame: 0, pose }],
        }
    }

    /// Inserts a key, replacing any existing key at the same frame.
    pub fn with_key(mut self, frame: i32, pose: Pose) -> Self {
        match self.keys.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => self.keys[i].pose = pose,
            Err(i) => self.keys.insert(i, Keyframe { frame, pose }),
        }
        self
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn pose_at(&self, frame: i32) -> Pose {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Pose::identity();
        };
        if frame <= first.frame {
            return first.pose;
        }
        if frame >= last.frame {
            return last.pose;
        }

        // First key strictly after `frame`; there is always one before it here.
        let next = self.keys.partition_point(|k| k.frame <= frame);
        let (a, b) = (&self.keys[next - 1], &self.keys[next]);
        let t = (frame - a.frame) as f32 / (b.frame - a.frame) as f32;

        let rotation = a
            .pose
            .rotation
            .try_slerp(&b.pose.rotation, t, 1.0e-6)
            .unwrap_or(if t < 0.5 { a.pose.rotation } else { b.pose.rotation });

        Pose::new(
            a.pose.translation.lerp(&b.pose.translation, t),
            rotation,
            a.pose.scale.lerp(&b.pose.scale, t),
        )
    }

    pub fn matrix_at(&self, frame: i32) -> Mat4 {
        self.pose_at(frame).to_matrix()
    }
}

/// In-memory scene with one keyframed track per body.
#[derive(Clone, Debug)]
pub struct KeyframedScene {
    timeline: Timeline,
    target: Track,
    impactor: Track,
    current_frame: i32,
}

impl KeyframedScene {
    pub fn new(timeline: Timeline, target: Track, impactor: Track) -> Self {
        Self {
            current_frame: timeline.start,
            timeline,
            target,
            impactor,
        }
    }

    pub fn current_frame(&self) -> i32 {
        self.current_frame
    }

    pub fn target_track(&self) -> &Track {
        &self.target
    }

    pub fn impactor_track(&self) -> &Track {
        &self.impactor
    }
}

impl SceneStepper for KeyframedScene {
    fn timeline(&self) -> Timeline {
        self.timeline
    }

    fn sample(&mut self, frame: i32) -> Frame {
        self.current_frame = frame;
        Frame {
            index: frame,
            target: self.target.matrix_at(frame),
            impactor: self.impactor.matrix_at(frame),
        }
    }
}
