/// Distance (world units) under which two vertices of different pieces count as coincident.
///
/// Fracture margins are usually around a millimetre, so this needs to be an order of
/// magnitude above the crack gap or neighbouring cells will never register as touching.
pub const SHARED_VERTEX_TOLERANCE: f32 = 0.01;

/// Number of coincident vertices two pieces need before they are considered touching.
///
/// Four corners is the smallest count that implies a shared face rather than a shared
/// edge or corner.
pub const SHARED_VERTEX_MIN_COUNT: usize = 4;

/// Height band (world units) above the lowest piece in which pieces are still "base" pieces.
pub const BASE_HEIGHT_EPS: f32 = 0.001;

/// Default number of fracture cells requested from the fracturing service.
pub const DEFAULT_SOURCE_LIMIT: u32 = 32;

/// Upper bound accepted for the fracture cell count. 0 means "unlimited".
pub const MAX_SOURCE_LIMIT: u32 = 10_000;

/// Default gap between fracture cells (world units).
pub const DEFAULT_CRACK_GAP: f32 = 0.001;

/// Default shock propagation speed (units per second). Roughly the speed of sound in air.
pub const DEFAULT_SHOCK_SPEED: f32 = 343.0;

/// Default time the shock keeps expanding after the hit (seconds).
pub const DEFAULT_SHOCK_DURATION: f32 = 1.0;

/// Upper bound for both the shock speed and the shock duration.
pub const MAX_SHOCK_PARAM: f32 = 1000.0;

/// Default playback rate used when a scene does not specify one.
pub const DEFAULT_FPS: f32 = 24.0;

/// Number of collision collections a rigid body can belong to.
pub const COLLISION_COLLECTION_COUNT: u8 = 20;
