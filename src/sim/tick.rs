//! Fixed timestep simulation tick
//!
//! One call advances a scene by a single physics step: input, flipper
//! control, backend step, contact resolution, then scene bookkeeping.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::backend::PhysicsBackend;
use super::body::BodyState;
use super::collision::{ContactOutcome, ContactScope, DrainOutcome};
use super::progression::{HudSnapshot, RunProgression};
use super::scene::{GameMode, Release, Scene, ScenePhase};

/// Pointer gestures for a single tick, applied in field order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub pointer_down: Option<Vec2>,
    pub pointer_move: Option<Vec2>,
    pub pointer_up: Option<Vec2>,
}

impl TickInput {
    pub fn down(pos: Vec2) -> Self {
        Self {
            pointer_down: Some(pos),
            ..Self::default()
        }
    }

    pub fn moved(pos: Vec2) -> Self {
        Self {
            pointer_move: Some(pos),
            ..Self::default()
        }
    }

    pub fn up(pos: Vec2) -> Self {
        Self {
            pointer_up: Some(pos),
            ..Self::default()
        }
    }
}

/// Something the UI layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Launched { velocity: Vec2 },
    ChargeCancelled,
    BumperHit { points: u64, streak: u32 },
    HazardDefeated { points: u32 },
    PlatformBounce,
    /// Drain negated by the save chance
    Saved,
    HeartLost,
    Landed,
    RoundComplete { round: u32 },
    UpgradesOffered { ids: Vec<String> },
    UpgradeApplied { id: String },
    RunOver { score: u64 },
    /// Emitted after any state-affecting event in the same tick
    Hud(HudSnapshot),
}

impl GameEvent {
    fn from_contact(outcome: ContactOutcome) -> Option<Self> {
        match outcome {
            ContactOutcome::HazardDefeated { points } => Some(GameEvent::HazardDefeated { points }),
            ContactOutcome::PlatformBounce => Some(GameEvent::PlatformBounce),
            ContactOutcome::BumperHit { points, streak } => Some(GameEvent::BumperHit { points, streak }),
            ContactOutcome::Drained(DrainOutcome::Saved) => Some(GameEvent::Saved),
            ContactOutcome::Drained(DrainOutcome::HeartLost) => Some(GameEvent::HeartLost),
            ContactOutcome::Drained(DrainOutcome::RunOver) => Some(GameEvent::HeartLost),
            ContactOutcome::Landed
            | ContactOutcome::PassThrough
            | ContactOutcome::BumperCooling
            | ContactOutcome::Physical
            | ContactOutcome::Ignored => None,
        }
    }
}

/// Advance the scene by one fixed step
pub fn tick<B, R>(
    scene: &mut Scene,
    run: &mut RunProgression,
    backend: &mut B,
    rng: &mut R,
    input: &TickInput,
) -> Vec<GameEvent>
where
    B: PhysicsBackend + ?Sized,
    R: Rng + ?Sized,
{
    let mut events = Vec::new();
    if scene.phase != ScenePhase::Playing {
        return events;
    }

    scene.time_ticks += 1;
    scene.obstacles.tick_cooldowns();

    // Input
    if let Some(pos) = input.pointer_down {
        scene.pointer_down(pos, run);
    }
    if let Some(pos) = input.pointer_move {
        scene.pointer_move(pos);
    }
    if let Some(pos) = input.pointer_up {
        match scene.pointer_up(pos, run) {
            Some(Release::Launched(velocity)) => events.push(GameEvent::Launched { velocity }),
            Some(Release::Cancelled) => events.push(GameEvent::ChargeCancelled),
            None => {}
        }
    }

    scene.drive_flippers(backend, run.flipper_speed_multiplier());

    // Physics
    scene.push_body(backend);
    let contacts = backend.step();
    scene.pull_body(backend);

    let outcomes = {
        let mut contact_scope = ContactScope {
            mode: scene.mode,
            body: &mut scene.body,
            body_handle: scene.body_handle,
            obstacles: &mut scene.obstacles,
            run: &mut *run,
            tally: &mut scene.tally,
            launcher: scene.launcher,
            rng: &mut *rng,
        };
        scene.resolver.resolve_all(&contacts, &mut contact_scope)
    };
    let mut run_over = false;
    for outcome in outcomes {
        if outcome == ContactOutcome::Drained(DrainOutcome::RunOver) {
            run_over = true;
        }
        events.extend(GameEvent::from_contact(outcome));
    }
    scene.obstacles.sweep_destroyed(backend);

    if scene.mode == GameMode::Climb {
        scene.track_height();
        scene.generate_ahead(backend, rng);
        scene.cleanup_behind(backend);
    }

    // Landing: back to the launcher; out of hearts ends the run
    if scene.body.state() == BodyState::Landing {
        scene.body.reset_to_start(scene.launcher);
        events.push(GameEvent::Landed);
        let hearts = match scene.mode {
            GameMode::Pinball => run.hearts(),
            GameMode::Climb => scene.tally.hearts,
        };
        if hearts == 0 {
            run_over = true;
        }
    }

    if run_over {
        scene.phase = ScenePhase::RunOver;
        let score = match scene.mode {
            GameMode::Pinball => run.total_score(),
            GameMode::Climb => scene.tally.score,
        };
        log::info!("Run over: score {score}, round {}", run.current_round());
        events.push(GameEvent::RunOver { score });
    } else if scene.mode == GameMode::Pinball && run.round_goal_reached() {
        let cleared = run.current_round();
        run.advance_round();
        scene.phase = ScenePhase::RoundComplete;
        events.push(GameEvent::RoundComplete { round: cleared });
    }

    scene.push_body(backend);

    if !events.is_empty() {
        events.push(GameEvent::Hud(scene.hud(run)));
    }
    events
}
