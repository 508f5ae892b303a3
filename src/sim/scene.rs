//! One playfield: the pinball table or the climb tower
//!
//! A scene owns the launch body, the obstacles it spawned into the backend,
//! and the counters that only live as long as the layout does. Run-level
//! state stays in [`RunProgression`] and is passed in by the caller.

use std::str::FromStr;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::backend::{BodyDesc, BodyHandle, PhysicsBackend, Shape};
use super::body::{BodyState, LaunchBody};
use super::collision::CollisionResolver;
use super::flipper::{Flipper, FlipperSide, FlipperTuning};
use super::obstacle::{ObstacleId, ObstacleKind, ObstacleRegistry};
use super::progression::{HudSnapshot, RunProgression};
use super::trajectory::{AimPreview, TrajectoryPlanner};
use crate::consts::*;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Pinball,
    Climb,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Pinball => "pinball",
            GameMode::Climb => "climb",
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinball" | "table" => Ok(GameMode::Pinball),
            "climb" | "tower" => Ok(GameMode::Climb),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScenePhase {
    #[default]
    Playing,
    /// Round goal met; waiting for an upgrade choice
    RoundComplete,
    RunOver,
}

/// Counters scoped to one scene. Climb mode keeps its hearts and score
/// here; pinball only uses the bumper streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTally {
    pub hearts: u32,
    pub max_hearts: u32,
    pub score: u64,
    pub enemies_defeated: u32,
    pub super_meter: u32,
    pub max_super_meter: u32,
    /// Bumper hits since the last launch or drain
    pub bumper_streak: u32,
    pub start_y: f32,
    /// Lowest y the body has reached (y grows downward)
    pub highest_y: f32,
}

impl SceneTally {
    pub fn new(hearts: u32, start_y: f32) -> Self {
        Self {
            hearts,
            max_hearts: hearts,
            score: 0,
            enemies_defeated: 0,
            super_meter: 0,
            max_super_meter: MAX_SUPER_METER,
            bumper_streak: 0,
            start_y,
            highest_y: start_y,
        }
    }

    /// Height climbed above the launcher
    pub fn distance(&self) -> u64 {
        (self.start_y - self.highest_y).floor().max(0.0) as u64
    }

    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            hearts: self.hearts,
            max_hearts: self.max_hearts,
            score: self.score,
            super_meter: self.super_meter,
            max_super_meter: self.max_super_meter,
            distance: self.distance(),
        }
    }
}

/// Pointer gesture tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTuning {
    /// Pinball: pointer-down closer than this to the body grabs the slingshot
    pub grab_distance: f32,
    /// Pinball: flippers respond below this fraction of screen height
    pub flipper_zone: f32,
    pub steer_sensitivity: f32,
    pub steer_dead_zone: f32,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            grab_distance: LAUNCHER_GRAB_DISTANCE,
            flipper_zone: FLIPPER_ZONE,
            steer_sensitivity: STEER_SENSITIVITY,
            steer_dead_zone: STEER_DEAD_ZONE,
        }
    }
}

/// Procedural tower content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbTuning {
    pub platform_spacing_min: f32,
    pub platform_spacing_max: f32,
    /// Horizontal keep-out from each side wall
    pub platform_margin: f32,
    pub hazard_spacing_min: f32,
    pub hazard_spacing_max: f32,
    pub hazard_margin: f32,
    pub initial_platforms: u32,
    pub initial_hazards: u32,
    /// First platform is generated above `height - platform_start_offset`
    pub platform_start_offset: f32,
    pub hazard_start_offset: f32,
    /// Generate this many screens above the highest point
    pub lookahead_screens: f32,
    /// Remove content this many screens below the body
    pub cleanup_screens: f32,
}

impl Default for ClimbTuning {
    fn default() -> Self {
        Self {
            platform_spacing_min: 150.0,
            platform_spacing_max: 400.0,
            platform_margin: 100.0,
            hazard_spacing_min: 100.0,
            hazard_spacing_max: 300.0,
            hazard_margin: 80.0,
            initial_platforms: 15,
            initial_hazards: 20,
            platform_start_offset: 300.0,
            hazard_start_offset: 400.0,
            lookahead_screens: 2.0,
            cleanup_screens: 2.0,
        }
    }
}

/// Generation cursors (y of the most recently spawned item of each kind)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimbSpawner {
    pub last_platform_y: f32,
    pub last_hazard_y: f32,
}

/// In-progress slingshot drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub start: Vec2,
    pub current: Vec2,
}

impl Drag {
    pub fn pull(&self) -> Vec2 {
        self.current - self.start
    }
}

/// Result of releasing a slingshot drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Launched(Vec2),
    Cancelled,
}

/// What a renderer needs to draw the body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyView {
    pub pos: Vec2,
    pub state: BodyState,
    pub scale: Vec2,
    pub color: u32,
}

pub struct Scene {
    pub mode: GameMode,
    pub phase: ScenePhase,
    pub width: f32,
    pub height: f32,
    pub body: LaunchBody,
    pub body_handle: BodyHandle,
    pub obstacles: ObstacleRegistry,
    pub tally: SceneTally,
    /// Reset position for the body
    pub launcher: Vec2,
    pub planner: TrajectoryPlanner,
    pub resolver: CollisionResolver,
    pub flipper_tuning: FlipperTuning,
    pub input: InputTuning,
    pub climb_tuning: ClimbTuning,
    pub spawner: Option<ClimbSpawner>,
    pub left_flipper: Option<ObstacleId>,
    pub right_flipper: Option<ObstacleId>,
    pub drag: Option<Drag>,
    /// Reference x for air steering; cleared on pointer-up
    pub last_pointer_x: Option<f32>,
    pub time_ticks: u64,
}

impl Scene {
    pub fn new<B, R>(mode: GameMode, backend: &mut B, settings: &Settings, rng: &mut R) -> Self
    where
        B: PhysicsBackend + ?Sized,
        R: Rng + ?Sized,
    {
        match mode {
            GameMode::Pinball => Self::pinball(backend, settings),
            GameMode::Climb => Self::climb(backend, settings, rng),
        }
    }

    /// Empty scene with the body at `launcher`
    fn empty<B: PhysicsBackend + ?Sized>(
        mode: GameMode,
        backend: &mut B,
        settings: &Settings,
        launcher: Vec2,
    ) -> Self {
        let body = LaunchBody::new(launcher, settings.body);
        let body_handle = backend.create_body(BodyDesc {
            shape: Shape::Circle {
                radius: settings.body.radius,
            },
            pos: launcher,
            angle: 0.0,
            is_static: true,
            is_sensor: false,
            restitution: BODY_RESTITUTION,
            friction: BODY_FRICTION,
            air_friction: BODY_AIR_FRICTION,
        });
        Self {
            mode,
            phase: ScenePhase::Playing,
            width: settings.width,
            height: settings.height,
            body,
            body_handle,
            obstacles: ObstacleRegistry::new(),
            tally: SceneTally::new(STARTING_HEARTS, launcher.y),
            launcher,
            planner: settings.planner(),
            resolver: CollisionResolver::new(settings.contact, settings.dedupe_contacts),
            flipper_tuning: settings.flipper,
            input: settings.input,
            climb_tuning: settings.climb,
            spawner: None,
            left_flipper: None,
            right_flipper: None,
            drag: None,
            last_pointer_x: None,
            time_ticks: 0,
        }
    }

    /// Table: walls, guides, drain, two flippers and six bumpers
    pub fn pinball<B: PhysicsBackend + ?Sized>(backend: &mut B, settings: &Settings) -> Self {
        let (w, h) = (settings.width, settings.height);
        let mut scene = Self::empty(GameMode::Pinball, backend, settings, Vec2::new(w / 2.0, h - 280.0));
        let obstacles = &mut scene.obstacles;

        obstacles.spawn_wall(backend, Vec2::new(w / 2.0, 20.0), Vec2::new(w - 100.0, 40.0), 0.0, 0.8);
        let side = Vec2::new(60.0, h - 400.0);
        obstacles.spawn_wall(backend, Vec2::new(30.0, h / 2.0 - 100.0), side, 0.0, 0.8);
        obstacles.spawn_wall(backend, Vec2::new(w - 30.0, h / 2.0 - 100.0), side, 0.0, 0.8);

        // Lower guides funnel into the flippers
        let guide = Vec2::new(150.0, 20.0);
        let tilt = std::f32::consts::FRAC_PI_6;
        obstacles.spawn_wall(backend, Vec2::new(80.0, h - 350.0), guide, tilt, 0.6);
        obstacles.spawn_wall(backend, Vec2::new(w - 80.0, h - 350.0), guide, -tilt, 0.6);

        obstacles.spawn_drain(backend, Vec2::new(w / 2.0, h - 30.0), w, 60.0);

        let flipper_y = h - 200.0;
        let left = Flipper::new(FlipperSide::Left, &settings.flipper);
        let right = Flipper::new(FlipperSide::Right, &settings.flipper);
        scene.left_flipper = Some(obstacles.spawn_flipper(backend, Vec2::new(180.0, flipper_y), left));
        scene.right_flipper = Some(obstacles.spawn_flipper(backend, Vec2::new(w - 180.0, flipper_y), right));

        for pos in [
            Vec2::new(w / 2.0, 200.0),
            Vec2::new(w / 3.0, 350.0),
            Vec2::new(w * 2.0 / 3.0, 350.0),
            Vec2::new(w / 4.0, 500.0),
            Vec2::new(w * 3.0 / 4.0, 500.0),
            Vec2::new(w / 2.0, 600.0),
        ] {
            obstacles.spawn_bumper(backend, pos);
        }

        log::info!("Pinball table ready ({} obstacles)", scene.obstacles.len());
        scene
    }

    /// Tower: ground, tall side walls, and the first batch of platforms and hazards
    pub fn climb<B, R>(backend: &mut B, settings: &Settings, rng: &mut R) -> Self
    where
        B: PhysicsBackend + ?Sized,
        R: Rng + ?Sized,
    {
        let (w, h) = (settings.width, settings.height);
        let mut scene = Self::empty(GameMode::Climb, backend, settings, Vec2::new(w / 2.0, h - 180.0));

        scene
            .obstacles
            .spawn_ground(backend, Vec2::new(w / 2.0, h - 20.0), Vec2::new(w, 40.0));
        let wall = Vec2::new(40.0, h + 100_000.0);
        scene
            .obstacles
            .spawn_wall(backend, Vec2::new(-20.0, -50_000.0), wall, 0.0, 0.8);
        scene
            .obstacles
            .spawn_wall(backend, Vec2::new(w + 20.0, -50_000.0), wall, 0.0, 0.8);

        let tuning = scene.climb_tuning;
        scene.spawner = Some(ClimbSpawner {
            last_platform_y: h - tuning.platform_start_offset,
            last_hazard_y: h - tuning.hazard_start_offset,
        });
        for _ in 0..tuning.initial_platforms {
            scene.spawn_platform(backend, rng);
        }
        for _ in 0..tuning.initial_hazards {
            scene.spawn_hazard(backend, rng);
        }

        log::info!("Climb tower ready ({} obstacles)", scene.obstacles.len());
        scene
    }

    fn spawn_platform<B, R>(&mut self, backend: &mut B, rng: &mut R)
    where
        B: PhysicsBackend + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(spawner) = self.spawner.as_mut() else {
            return;
        };
        let t = &self.climb_tuning;
        let spacing = lerp(t.platform_spacing_min, t.platform_spacing_max, rng.random::<f32>());
        let y = spawner.last_platform_y - spacing;
        let x = lerp(t.platform_margin, self.width - t.platform_margin, rng.random::<f32>());
        spawner.last_platform_y = y;
        self.obstacles.spawn_platform(backend, Vec2::new(x, y));
    }

    fn spawn_hazard<B, R>(&mut self, backend: &mut B, rng: &mut R)
    where
        B: PhysicsBackend + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(spawner) = self.spawner.as_mut() else {
            return;
        };
        let t = &self.climb_tuning;
        let spacing = lerp(t.hazard_spacing_min, t.hazard_spacing_max, rng.random::<f32>());
        let y = spawner.last_hazard_y - spacing;
        let x = lerp(t.hazard_margin, self.width - t.hazard_margin, rng.random::<f32>());
        spawner.last_hazard_y = y;
        self.obstacles.spawn_hazard(backend, Vec2::new(x, y));
    }

    /// Keep the tower filled up to `lookahead_screens` above the highest point
    pub fn generate_ahead<B, R>(&mut self, backend: &mut B, rng: &mut R)
    where
        B: PhysicsBackend + ?Sized,
        R: Rng + ?Sized,
    {
        if self.spawner.is_none() {
            return;
        }
        // Loops below only terminate with positive spacing
        if self.climb_tuning.platform_spacing_min <= 0.0 || self.climb_tuning.hazard_spacing_min <= 0.0 {
            log::warn!("Climb spacing must be positive; skipping generation");
            return;
        }
        let horizon = self.tally.highest_y - self.height * self.climb_tuning.lookahead_screens;
        while self.spawner.is_some_and(|s| s.last_platform_y > horizon) {
            self.spawn_platform(backend, rng);
        }
        while self.spawner.is_some_and(|s| s.last_hazard_y > horizon) {
            self.spawn_hazard(backend, rng);
        }
    }

    /// Drop platforms and hazards far below the body. Returns how many went.
    pub fn cleanup_behind<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        if self.spawner.is_none() {
            return 0;
        }
        let limit = self.body.position().y + self.height * self.climb_tuning.cleanup_screens;
        let stale: Vec<ObstacleId> = self
            .obstacles
            .iter()
            .filter(|o| matches!(o.kind, ObstacleKind::Platform(_) | ObstacleKind::Hazard(_)))
            .filter(|o| o.pos.y > limit)
            .map(|o| o.id)
            .collect();
        for &id in &stale {
            self.obstacles.remove(backend, id);
        }
        stale.len()
    }

    /// Track the highest point reached
    pub fn track_height(&mut self) {
        let y = self.body.position().y;
        if y < self.tally.highest_y {
            self.tally.highest_y = y;
        }
    }

    fn can_start_launch(&self, run: &RunProgression) -> bool {
        let hearts = match self.mode {
            GameMode::Pinball => run.hearts(),
            GameMode::Climb => self.tally.hearts,
        };
        self.phase == ScenePhase::Playing && self.body.state() == BodyState::Idle && hearts > 0
    }

    /// Begin a drag at `pos`. Pinball only grabs near the body; anywhere
    /// else is a flipper press.
    pub fn pointer_down(&mut self, pos: Vec2, run: &RunProgression) {
        if self.phase != ScenePhase::Playing {
            return;
        }
        let near_body = pos.distance(self.body.position()) < self.input.grab_distance;
        match self.mode {
            GameMode::Pinball if self.body.state() == BodyState::Idle && near_body => {
                if self.can_start_launch(run) {
                    self.begin_drag(pos);
                }
            }
            GameMode::Pinball => self.flipper_input(pos, true),
            GameMode::Climb => {
                if self.can_start_launch(run) {
                    self.begin_drag(pos);
                }
            }
        }
    }

    fn begin_drag(&mut self, pos: Vec2) {
        self.drag = Some(Drag {
            start: pos,
            current: pos,
        });
        self.body.start_charging();
    }

    /// Drag update while charging, air steering while flying (climb)
    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.mode == GameMode::Climb && self.body.state() == BodyState::Flying {
            self.air_steer(pos.x);
            return;
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.current = pos;
        let charge = self.planner.charge_amount(drag.pull());
        self.body.set_charge_amount(charge);
    }

    /// Release flippers and resolve any drag
    pub fn pointer_up(&mut self, pos: Vec2, run: &RunProgression) -> Option<Release> {
        self.last_pointer_x = None;
        if self.mode == GameMode::Pinball {
            self.flipper_input(pos, false);
        }
        let drag = self.drag.take()?;
        Some(self.commit_launch(drag.pull(), run.launch_power_multiplier()))
    }

    /// Launch for `pull` if it clears the minimum, else cancel the charge.
    /// Climb launches cost a heart.
    pub fn commit_launch(&mut self, pull: Vec2, power_multiplier: f32) -> Release {
        let Some(velocity) = self.planner.plan(pull, power_multiplier) else {
            self.body.cancel_charge();
            return Release::Cancelled;
        };
        if self.body.state() != BodyState::Charging {
            return Release::Cancelled;
        }
        if self.mode == GameMode::Climb {
            self.tally.hearts = self.tally.hearts.saturating_sub(1);
        }
        self.tally.bumper_streak = 0;
        self.body.launch(velocity);
        log::debug!("Launched with {velocity:?}");
        Release::Launched(velocity)
    }

    /// Horizontal swipe steering. The first move after a release only sets
    /// the reference point.
    pub fn air_steer(&mut self, x: f32) {
        let Some(last) = self.last_pointer_x.replace(x) else {
            return;
        };
        let dx = x - last;
        if dx.abs() > self.input.steer_dead_zone {
            self.body.steer(dx * self.input.steer_sensitivity);
        }
    }

    /// Press or release the flipper on `pos`'s half of the table
    pub fn flipper_input(&mut self, pos: Vec2, down: bool) {
        let in_zone = pos.y > self.height * self.input.flipper_zone;
        if !in_zone && self.body.state() != BodyState::Flying {
            return;
        }
        let id = if pos.x < self.width / 2.0 {
            self.left_flipper
        } else {
            self.right_flipper
        };
        let Some(ObstacleKind::Flipper(flipper)) = id
            .and_then(|id| self.obstacles.get_mut(id))
            .map(|o| &mut o.kind)
        else {
            return;
        };
        if down {
            flipper.activate();
        } else {
            flipper.deactivate();
        }
    }

    /// Run one control step on every flipper against the backend's angles
    pub fn drive_flippers<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, speed_multiplier: f32) {
        let tuning = self.flipper_tuning;
        for obstacle in self.obstacles.iter_mut() {
            let ObstacleKind::Flipper(flipper) = &mut obstacle.kind else {
                continue;
            };
            if let Some(angle) = backend.angle(obstacle.handle) {
                flipper.angle = angle;
            }
            flipper.update(speed_multiplier, &tuning);
            backend.set_angle(obstacle.handle, flipper.angle);
            backend.set_angular_velocity(obstacle.handle, flipper.angular_velocity);
        }
    }

    /// Push forced body state to the backend
    pub fn push_body<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B) {
        if !self.body.take_pending_write() {
            return;
        }
        backend.set_static(self.body_handle, self.body.is_frozen());
        backend.set_position(self.body_handle, self.body.position());
        backend.set_velocity(self.body_handle, self.body.velocity());
    }

    /// Pull integrated body state from the backend
    pub fn pull_body<B: PhysicsBackend + ?Sized>(&mut self, backend: &B) {
        if let (Some(pos), Some(vel)) = (
            backend.position(self.body_handle),
            backend.velocity(self.body_handle),
        ) {
            self.body.sync(pos, vel);
        }
    }

    pub fn aim_preview(&self, run: &RunProgression) -> Option<AimPreview> {
        let drag = self.drag?;
        (self.body.state() == BodyState::Charging).then(|| {
            self.planner
                .preview(self.body.position(), drag.pull(), run.launch_power_multiplier())
        })
    }

    pub fn hud(&self, run: &RunProgression) -> HudSnapshot {
        match self.mode {
            GameMode::Pinball => run.snapshot(),
            GameMode::Climb => self.tally.snapshot(),
        }
    }

    pub fn body_view(&self, run: &RunProgression) -> BodyView {
        BodyView {
            pos: self.body.position(),
            state: self.body.state(),
            scale: self.body.view_scale(),
            color: run.character_color(),
        }
    }

    /// Bumpers currently flashing (hit cooldown active)
    pub fn flashing_bumpers(&self) -> impl Iterator<Item = ObstacleId> + '_ {
        self.obstacles.iter().filter_map(|o| match &o.kind {
            ObstacleKind::Bumper(b) if b.hit_cooldown_active() => Some(o.id),
            _ => None,
        })
    }

    /// Remove every body this scene created
    pub fn teardown<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B) {
        self.obstacles.clear(backend);
        backend.remove_body(self.body_handle);
        self.drag = None;
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
