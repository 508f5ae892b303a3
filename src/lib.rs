//! Pounce - a slingshot cat arcade game
//!
//! Core modules:
//! - `sim`: Deterministic gameplay rules (launch body, obstacles, contacts, run progression)
//! - `settings`: Data-driven tuning, loaded from JSON
//! - `highscores`: Leaderboard of finished runs
//! - `error`: Errors for the few fallible (file-backed) operations
//!
//! Rendering, input capture, camera and audio live outside this crate. The
//! rigid-body engine is reached through [`sim::PhysicsBackend`].

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use error::StoreError;
pub use highscores::{HighScores, RunRecord};
pub use settings::Settings;

/// Game configuration constants
///
/// Velocities are in world units per fixed step, matching the step-based
/// engines this core is designed to sit on top of.
pub mod consts {
    /// Logical screen size (portrait)
    pub const GAME_WIDTH: f32 = 720.0;
    pub const GAME_HEIGHT: f32 = 1280.0;

    /// Launch body
    pub const BODY_RADIUS: f32 = 28.0;
    pub const BODY_RESTITUTION: f32 = 0.6;
    pub const BODY_FRICTION: f32 = 0.1;
    pub const BODY_AIR_FRICTION: f32 = 0.01;

    /// Bounce minimum upward speed after a scripted bounce
    pub const MIN_BOOST: f32 = 15.0;
    /// Horizontal damping applied by `add_bounce`
    pub const BOUNCE_X_DAMPING: f32 = 0.9;
    /// Upward speed set by a platform bounce
    pub const PLATFORM_BOUNCE_SPEED: f32 = 25.0;
    pub const PLATFORM_X_DAMPING: f32 = 0.8;
    /// Maximum horizontal speed reachable by air steering
    pub const MAX_STEER_SPEED: f32 = 25.0;

    /// Slingshot pull
    pub const MAX_PULL_FRACTION: f32 = 0.5;
    pub const LAUNCH_SPEED_Y: f32 = 45.0;
    pub const LAUNCH_SPEED_X: f32 = 25.0;
    /// Pull distance (downward) required to commit a launch
    pub const MIN_PULL: f32 = 30.0;

    /// Aim preview parabola
    pub const PREVIEW_GRAVITY: f32 = 0.6;
    pub const PREVIEW_STEPS: u32 = 80;
    pub const PREVIEW_CUTOFF: f32 = 150.0;

    /// Scoring
    pub const BUMPER_SCORE: u32 = 50;
    pub const HAZARD_SCORE: u32 = 100;
    pub const SUPER_METER_PER_HAZARD: u32 = 15;
    pub const MAX_SUPER_METER: u32 = 100;

    /// Bounce multipliers per obstacle
    pub const HAZARD_BOUNCE: f32 = 1.2;
    pub const BUMPER_BOUNCE: f32 = 0.8;

    /// One-way platform surface tolerance
    pub const PLATFORM_TOLERANCE: f32 = 20.0;

    /// Bumper flash lasts a 50ms yoyo (100ms) at 60 Hz
    pub const BUMPER_COOLDOWN_TICKS: u32 = 6;

    /// Flippers
    pub const FLIPPER_ANGLE: f32 = 0.4;
    pub const FLIPPER_ANGULAR_SPEED: f32 = 0.5;
    pub const FLIPPER_RETURN_FACTOR: f32 = 0.3;
    pub const FLIPPER_ARRIVAL: f32 = 0.05;
    pub const FLIPPER_CLAMP_MARGIN: f32 = 0.1;

    /// Run progression
    pub const STARTING_HEARTS: u32 = 3;
    pub const BASE_ROUND_GOAL: u64 = 500;
    pub const ROUND_GOAL_STEP: u64 = 200;
    pub const UPGRADE_OFFER_COUNT: usize = 3;

    /// Input
    pub const LAUNCHER_GRAB_DISTANCE: f32 = 150.0;
    pub const STEER_SENSITIVITY: f32 = 0.15;
    pub const STEER_DEAD_ZONE: f32 = 2.0;
    /// Flippers respond to presses below this fraction of screen height
    pub const FLIPPER_ZONE: f32 = 0.6;
}
