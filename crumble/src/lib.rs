pub mod bitmask_flags;
pub mod constants;
pub mod error;
pub mod events;
pub mod fracture;
pub mod graph;
pub mod impact;
pub mod mesh;
pub mod physics;
pub mod probe;
pub mod scene;
pub mod settings;
pub mod shock;
pub mod smash;
pub mod stopwatch;
pub mod types;

// Re-export Rapier so downstream crates can build static geometry without depending on
// `rapier3d` directly.
pub use rapier3d;

pub use bitmask_flags::{CollisionCollection, CollisionCollections};
pub use error::SmashError;
pub use events::{Event, EventSink, ObjectRef, Recording, Tee};
pub use fracture::{Fracture, GridFracture};
pub use graph::ConnectivityGraph;
pub use impact::{Impact, ImpactDetector, ImpactOutcome, ImpactRecord};
pub use mesh::{Body, Mesh, Piece, PieceId, RigidBodySettings};
pub use physics::{PhysicsBridge, StaticDef, StaticShape};
pub use scene::{Frame, KeyframedScene, SceneStepper, Timeline, Track};
pub use settings::SmashSettings;
pub use shock::{LifecycleState, ShockSimulator, ShockState};
pub use smash::{SmashReport, smash};
pub use types::{Mat4, Point3, Pose, Quat, Vec3};
