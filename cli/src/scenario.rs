use crumble::{
    Body, KeyframedScene, Mesh, Point3, Pose, Quat, RigidBodySettings, Timeline, Track, Vec3,
};

/// A wall standing on the ground at the origin and a box-shaped projectile flying into
/// its face along +X.
pub struct Scenario {
    pub target: Body,
    pub impactor: Body,
    pub scene: KeyframedScene,
}

#[derive(Clone, Copy, Debug)]
pub struct ScenarioParams {
    /// Wall extents (x, y, z).
    pub wall: Vec3,
    pub projectile_size: f32,
    /// Units per frame.
    pub projectile_speed: f32,
    /// Frame on which the projectile reaches the wall face.
    pub impact_frame: i32,
    pub timeline: Timeline,
}

impl Scenario {
    pub fn wall_and_projectile(p: &ScenarioParams) -> Self {
        let half_wall = p.wall * 0.5;
        let target = Body::new("wall", Mesh::cuboid(Point3::origin(), half_wall))
            .with_rigid_body(RigidBodySettings::default());
        let target_track = Track::fixed(at(Vec3::new(0.0, half_wall.y, 0.0)));

        let half = p.projectile_size * 0.5;
        let impactor = Body::new(
            "projectile",
            Mesh::cuboid(Point3::origin(), Vec3::new(half, half, half)),
        );

        // Centered on the wall face at the impact frame, so it is half way through it.
        let face_x = -half_wall.x;
        let height = half_wall.y.min(half_wall.y * 0.5 + half);
        let frames_before = (i64::from(p.impact_frame) - i64::from(p.timeline.start)) as f32;
        let frames_after = (i64::from(p.timeline.end) - i64::from(p.impact_frame)) as f32;
        let impactor_track = Track::default()
            .with_key(
                p.timeline.start,
                at(Vec3::new(face_x - frames_before * p.projectile_speed, height, 0.0)),
            )
            .with_key(
                p.timeline.end,
                at(Vec3::new(face_x + frames_after * p.projectile_speed, height, 0.0)),
            );

        Self {
            target,
            impactor,
            scene: KeyframedScene::new(p.timeline, target_track, impactor_track),
        }
    }
}

fn at(translation: Vec3) -> Pose {
    Pose::new(translation, Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
}
