//! Rapier-backed event sink.
//!
//! Replays smash output into a rigid-body simulation: attached pieces are kinematic bodies
//! driven by their keyed poses, released pieces turn dynamic and fall under gravity, and
//! every [`Event::FrameEnd`] advances the simulation by one frame.
//!
//! Conventions
//! - Units are meters, Y is up.
//! - Rapier cannot scale bodies. Each piece's hull is baked with the scale the piece had
//!   when it was created.

use log::{debug, warn};
use rapier3d::prelude::*;

use crate::{
    bitmask_flags::CollisionCollections,
    events::{Event, EventSink, ObjectRef},
    mesh::{Piece, PieceId, RigidBodySettings},
    types::{Iso, Pose, Quat, Vec3},
};

/// Immutable world collider, e.g. the ground.
#[derive(Clone, Debug)]
pub struct StaticDef {
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    pub shape: StaticShape,
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum StaticShape {
    /// Infinite plane (half-space).
    ///
    /// The plane normal is derived from the pose as `rotation * +Y`, and the plane sits at
    /// `dot(normal, translation) + offset_along_normal` along it.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },
}

impl StaticDef {
    /// Horizontal ground plane at height `y`.
    pub fn ground(y: f32) -> Self {
        Self {
            translation: Vec3::new(0.0, y, 0.0),
            rotation: Quat::identity(),
            shape: StaticShape::Plane {
                offset_along_normal: 0.0,
            },
        }
    }
}

/// Build a parentless Rapier collider from a [`StaticDef`].
pub fn collider_from_def(def: &StaticDef) -> Collider {
    match &def.shape {
        StaticShape::Plane {
            offset_along_normal,
        } => {
            // n ⋅ x = dist, where x is any point on the plane.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;

            let unit_n = UnitVector::new_normalize(n);
            let halfspace = HalfSpace::new(unit_n);
            ColliderBuilder::new(SharedShape::new(halfspace))
                .translation(unit_n.into_inner() * dist)
                .build()
        }

        StaticShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .translation(def.translation)
                .rotation(def.rotation.scaled_axis())
                .build()
        }
    }
}

/// Collision filter for a set of collision collections: bodies interact when they share
/// at least one collection.
pub fn interaction_groups(collections: CollisionCollections) -> InteractionGroups {
    let group = Group::from_bits_truncate(collections.bits);
    InteractionGroups {
        memberships: group,
        filter: group,
        ..InteractionGroups::all()
    }
}

#[derive(Clone, Copy, Debug)]
struct PieceBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    released_at: Option<i32>,
}

pub struct PhysicsBridge {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pieces: Vec<PieceBody>,
    last_frame: Option<i32>,
    steps: usize,
}

impl PhysicsBridge {
    /// One kinematic body per piece, placed where the fracture put it.
    pub fn new(pieces: &[Piece], frame_duration: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: frame_duration,
            ..IntegrationParameters::default()
        };

        let mut bridge = Self {
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pieces: Vec::with_capacity(pieces.len()),
            last_frame: None,
            steps: 0,
        };

        for piece in pieces {
            let handle = bridge.insert_piece(piece);
            bridge.pieces.push(handle);
        }
        bridge
    }

    /// Adds static world geometry.
    pub fn with_static(mut self, def: &StaticDef) -> Self {
        self.colliders.insert(collider_from_def(def));
        self
    }

    fn insert_piece(&mut self, piece: &Piece) -> PieceBody {
        let pose = Pose::from_matrix(&piece.transform);
        let rb = RigidBodyBuilder::kinematic_position_based()
            .translation(pose.translation)
            .rotation(pose.rotation.scaled_axis())
            .build();
        let body = self.bodies.insert(rb);

        let collider = piece_collider(piece, &pose.scale, &piece.rigid_body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        PieceBody {
            body,
            collider,
            released_at: None,
        }
    }

    fn handles(&self, piece: PieceId) -> Option<PieceBody> {
        let handles = self.pieces.get(piece.index()).copied();
        if handles.is_none() {
            warn!("Event for unknown {piece}");
        }
        handles
    }

    /// Perform one simulation step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.steps += 1;
    }

    pub fn replay<'e>(&mut self, events: impl IntoIterator<Item = &'e Event>) {
        for event in events {
            self.emit(event.clone());
        }
    }

    /// Current rigid pose of a piece.
    pub fn piece_pose(&self, piece: PieceId) -> Option<Iso> {
        let handles = self.pieces.get(piece.index())?;
        let body = self.bodies.get(handles.body)?;
        Some(Iso::from_parts((*body.translation()).into(), *body.rotation()))
    }

    pub fn is_dynamic(&self, piece: PieceId) -> bool {
        self.pieces
            .get(piece.index())
            .and_then(|h| self.bodies.get(h.body))
            .is_some_and(|b| b.is_dynamic())
    }

    pub fn released_at(&self, piece: PieceId) -> Option<i32> {
        self.pieces.get(piece.index())?.released_at
    }

    pub fn collider_enabled(&self, piece: PieceId) -> bool {
        self.pieces
            .get(piece.index())
            .and_then(|h| self.colliders.get(h.collider))
            .is_some_and(|c| c.is_enabled())
    }

    pub fn last_frame(&self) -> Option<i32> {
        self.last_frame
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl EventSink for PhysicsBridge {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Pose { piece, pose, .. } => {
                let Some(handles) = self.handles(piece) else {
                    return;
                };
                if let Some(body) = self.bodies.get_mut(handles.body) {
                    if body.is_kinematic() {
                        body.set_next_kinematic_translation(pose.translation);
                        body.set_next_kinematic_rotation(pose.rotation);
                    }
                }
            }

            Event::Released { piece, frame } => {
                let Some(handles) = self.handles(piece) else {
                    return;
                };
                if let Some(body) = self.bodies.get_mut(handles.body) {
                    body.set_body_type(RigidBodyType::Dynamic, true);
                }
                if let Some(slot) = self.pieces.get_mut(piece.index()) {
                    slot.released_at = Some(frame);
                }
            }

            Event::Visibility {
                object: ObjectRef::Piece(piece),
                visible,
                ..
            } => {
                let Some(handles) = self.handles(piece) else {
                    return;
                };
                if let Some(collider) = self.colliders.get_mut(handles.collider) {
                    collider.set_enabled(visible);
                }
            }

            Event::CollisionGroups {
                object: ObjectRef::Piece(piece),
                collections,
                ..
            } => {
                let Some(handles) = self.handles(piece) else {
                    return;
                };
                if let Some(collider) = self.colliders.get_mut(handles.collider) {
                    collider.set_collision_groups(interaction_groups(collections));
                }
            }

            // The unfractured target has no body here.
            Event::Visibility {
                object: ObjectRef::Target,
                ..
            }
            | Event::CollisionGroups {
                object: ObjectRef::Target,
                ..
            } => {}

            Event::FrameEnd { frame } => {
                self.step();
                self.last_frame = Some(frame);
            }
        }
    }
}

/// Convex hull of the piece's scaled vertices, carrying the inherited surface settings.
fn piece_collider(piece: &Piece, scale: &Vec3, settings: &RigidBodySettings) -> Collider {
    let points: Vec<Point<Real>> = piece
        .mesh
        .vertices
        .iter()
        .map(|v| Point::from(v.coords.component_mul(scale)))
        .collect();

    let builder = ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
        // Flat or degenerate pieces: fall back to their (scaled) bounding box.
        let half = piece
            .mesh
            .local_bounds()
            .map(|(lo, hi)| ((hi - lo) * 0.5).component_mul(scale).abs())
            .unwrap_or_else(Vec3::zeros)
            .map(|h| h.max(1.0e-3));
        debug!("{} has no convex hull, using a box", piece.id);
        ColliderBuilder::cuboid(half.x, half.y, half.z)
    });

    builder
        .density(settings.density)
        .friction(settings.friction)
        .restitution(settings.restitution)
        .collision_groups(interaction_groups(settings.collections))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::Mesh,
        types::{Point3, trs},
    };

    fn piece_at(id: usize, y: f32) -> Piece {
        Piece {
            id: PieceId::from(id),
            mesh: Mesh::cuboid(Point3::origin(), Vec3::new(0.5, 0.5, 0.5)),
            transform: trs(Vec3::new(id as f32 * 3.0, y, 0.0), Quat::identity(), 1.0),
            rigid_body: RigidBodySettings::default(),
        }
    }

    #[test]
    fn released_pieces_fall_and_attached_pieces_follow_their_poses() {
        let pieces = vec![piece_at(0, 10.0), piece_at(1, 10.0)];
        let mut bridge = PhysicsBridge::new(&pieces, 1.0 / 24.0).with_static(&StaticDef::ground(0.0));

        bridge.emit(Event::Released {
            piece: PieceId(0),
            frame: 2,
        });
        for frame in 2..26 {
            bridge.emit(Event::Pose {
                piece: PieceId(1),
                frame,
                pose: Pose::new(
                    Vec3::new(3.0, 10.0 + 0.1 * (frame - 1) as f32, 0.0),
                    Quat::identity(),
                    Vec3::new(1.0, 1.0, 1.0),
                ),
            });
            bridge.emit(Event::FrameEnd { frame });
        }

        assert!(bridge.is_dynamic(PieceId(0)));
        assert!(!bridge.is_dynamic(PieceId(1)));
        assert_eq!(bridge.released_at(PieceId(0)), Some(2));
        assert_eq!(bridge.steps(), 24);
        assert_eq!(bridge.last_frame(), Some(25));

        let fallen = bridge.piece_pose(PieceId(0)).unwrap();
        assert!(fallen.translation.vector.y < 9.0, "y = {}", fallen.translation.vector.y);

        let lifted = bridge.piece_pose(PieceId(1)).unwrap();
        assert!((lifted.translation.vector.y - 12.4).abs() < 1.0e-3);
    }

    #[test]
    fn ground_stops_falling_pieces() {
        let pieces = vec![piece_at(0, 2.0)];
        let mut bridge = PhysicsBridge::new(&pieces, 1.0 / 24.0).with_static(&StaticDef::ground(0.0));
        bridge.emit(Event::Released {
            piece: PieceId(0),
            frame: 1,
        });
        for frame in 1..200 {
            bridge.emit(Event::FrameEnd { frame });
        }
        let y = bridge.piece_pose(PieceId(0)).unwrap().translation.vector.y;
        assert!(y > 0.3 && y < 0.7, "resting height {y}");
    }

    #[test]
    fn visibility_toggles_the_collider() {
        let pieces = vec![piece_at(0, 2.0)];
        let mut bridge = PhysicsBridge::new(&pieces, 1.0 / 24.0);
        assert!(bridge.collider_enabled(PieceId(0)));
        bridge.emit(Event::Visibility {
            object: ObjectRef::Piece(PieceId(0)),
            frame: 1,
            visible: false,
        });
        assert!(!bridge.collider_enabled(PieceId(0)));
    }

    #[test]
    fn unknown_pieces_are_ignored() {
        let mut bridge = PhysicsBridge::new(&[], 1.0 / 24.0);
        bridge.emit(Event::Released {
            piece: PieceId(4),
            frame: 1,
        });
        assert!(!bridge.is_dynamic(PieceId(4)));
        assert!(bridge.piece_pose(PieceId(4)).is_none());
    }
}
