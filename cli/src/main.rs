mod scenario;

use std::process::ExitCode;

use clap::Parser;
use crumble::{
    GridFracture, PhysicsBridge, Recording, SceneStepper, SmashSettings, StaticDef, Timeline, Vec3,
    constants::{
        DEFAULT_CRACK_GAP, DEFAULT_FPS, DEFAULT_SHOCK_DURATION, DEFAULT_SHOCK_SPEED,
        DEFAULT_SOURCE_LIMIT,
    },
    smash,
};
use tracing::{Level, error, info};

use crate::scenario::{Scenario, ScenarioParams};

/// Smash a wall with a projectile and report how it crumbles.
#[derive(Parser, Debug)]
#[command(name = "crumble", version)]
struct Args {
    /// Number of fracture pieces to request (0 = as many as the fracturer allows).
    #[arg(long, default_value_t = DEFAULT_SOURCE_LIMIT)]
    source_limit: u32,

    /// Gap between neighbouring pieces.
    #[arg(long, default_value_t = DEFAULT_CRACK_GAP)]
    crack_gap: f32,

    /// Shock front speed (units per second).
    #[arg(long, default_value_t = DEFAULT_SHOCK_SPEED)]
    shock_speed: f32,

    /// How long the shock front keeps growing (seconds).
    #[arg(long, default_value_t = DEFAULT_SHOCK_DURATION)]
    shock_duration: f32,

    /// Release pieces that lose their path to the ground.
    #[arg(long)]
    detect_disconnected: bool,

    #[arg(long, default_value_t = 1)]
    start: i32,

    /// First frame past the end of the timeline.
    #[arg(long, default_value_t = 100)]
    end: i32,

    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: f32,

    /// Frame on which the projectile reaches the wall.
    #[arg(long, default_value_t = 10)]
    impact_frame: i32,

    /// Wall extents, x y z.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [4.0, 3.0, 0.5])]
    wall: Vec<f32>,

    #[arg(long, default_value_t = 0.4)]
    projectile_size: f32,

    /// Projectile speed in units per frame.
    #[arg(long, default_value_t = 1.0)]
    projectile_speed: f32,

    /// Replay the result through the rigid-body simulation and report where pieces landed.
    #[arg(long)]
    physics: bool,

    /// Log per-piece and per-phase details.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> SmashSettings {
        SmashSettings {
            source_limit: self.source_limit,
            crack_gap: self.crack_gap,
            shock_speed: self.shock_speed,
            shock_duration: self.shock_duration,
            detect_disconnected: self.detect_disconnected,
        }
    }

    fn scenario(&self) -> ScenarioParams {
        let wall = match self.wall.as_slice() {
            [x, y, z] => Vec3::new(*x, *y, *z),
            _ => Vec3::new(4.0, 3.0, 0.5),
        };
        ScenarioParams {
            wall,
            projectile_size: self.projectile_size,
            projectile_speed: self.projectile_speed,
            impact_frame: self.impact_frame,
            timeline: Timeline::new(self.start, self.end, self.fps),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let Scenario {
        target,
        impactor,
        mut scene,
    } = Scenario::wall_and_projectile(&args.scenario());

    let mut recording = Recording::new();
    let report = match smash(
        Some(&target),
        &impactor,
        &args.settings(),
        &mut scene,
        &mut GridFracture,
        &mut recording,
    ) {
        Ok(report) => report,
        Err(err) => {
            error!("Smash failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let Some(impact) = report.impact else {
        info!("No impact, nothing to do");
        return ExitCode::SUCCESS;
    };

    info!(
        "Impact at frame {} ({:.3}, {:.3}, {:.3})",
        impact.frame, impact.global.x, impact.global.y, impact.global.z
    );
    info!(
        "{} pieces, {} on the ground, {} released, {} events",
        report.piece_count(),
        report.base_count,
        report.released_count(),
        recording.len()
    );

    let mut release_frames: Vec<i32> = report.release_frames.iter().flatten().copied().collect();
    release_frames.sort_unstable();
    for same_frame in release_frames.chunk_by(|a, b| a == b) {
        info!("  frame {}: {} released", same_frame[0], same_frame.len());
    }

    if args.physics {
        let mut bridge = PhysicsBridge::new(&report.pieces, scene.timeline().frame_duration())
            .with_static(&StaticDef::ground(0.0));
        bridge.replay(recording.events());

        for piece in &report.pieces {
            if let Some(pose) = bridge.piece_pose(piece.id) {
                let t = pose.translation.vector;
                info!(
                    "  {} ends at ({:.2}, {:.2}, {:.2}){}",
                    piece.id,
                    t.x,
                    t.y,
                    t.z,
                    if bridge.is_dynamic(piece.id) { "" } else { " (attached)" }
                );
            }
        }
    }

    ExitCode::SUCCESS
}
