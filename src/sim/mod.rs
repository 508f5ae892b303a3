//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (injected, never global)
//! - Stable iteration order (by arena slot)
//! - No rendering or platform dependencies; the physics engine sits behind
//!   [`PhysicsBackend`]

pub mod arena;
pub mod backend;
pub mod body;
pub mod collision;
pub mod flipper;
pub mod game;
pub mod obstacle;
pub mod progression;
pub mod scene;
pub mod tick;
pub mod trajectory;
pub mod upgrades;

pub use backend::{BodyDesc, BodyHandle, ContactPair, HeadlessWorld, PhysicsBackend, Shape};
pub use body::{BodyState, BodyTuning, LaunchBody};
pub use collision::{CollisionResolver, ContactOutcome, ContactScope, ContactTuning, DrainOutcome};
pub use flipper::{Flipper, FlipperSide, FlipperTuning};
pub use game::Game;
pub use obstacle::{Bumper, Hazard, Obstacle, ObstacleId, ObstacleKind, ObstacleRegistry, OneWayPlatform};
pub use progression::{CHARACTERS, Character, HeartOutcome, HudSnapshot, RunProgression};
pub use scene::{
    BodyView, ClimbTuning, GameMode, InputTuning, Release, Scene, ScenePhase, SceneTally, UnknownMode,
};
pub use tick::{GameEvent, TickInput, tick};
pub use trajectory::{AimPreview, PullTuning, TrajectoryPlanner};
pub use upgrades::{Rarity, UPGRADES, Upgrade, UpgradeCatalog, UpgradeEffects, random_upgrades, upgrade_by_id};
