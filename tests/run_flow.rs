//! Full-run flows against a scripted physics backend
//!
//! The backend reports exactly the contacts a test queues, so each rule
//! can be driven through `Game::tick` without depending on trajectories.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;
use pounce::Settings;
use pounce::sim::{
    BodyDesc, BodyHandle, BodyState, ContactPair, Game, GameEvent, GameMode, ObstacleKind,
    PhysicsBackend, ScenePhase, TickInput,
};

#[derive(Debug, Clone)]
struct Slot {
    desc: BodyDesc,
    vel: Vec2,
    angular_velocity: f32,
}

/// Moves bodies by their velocity (no gravity) and reports queued contacts
#[derive(Debug, Default)]
struct ScriptedBackend {
    bodies: HashMap<BodyHandle, Slot>,
    next_handle: u32,
    queued: VecDeque<Vec<ContactPair>>,
}

impl ScriptedBackend {
    fn queue(&mut self, contacts: Vec<ContactPair>) {
        self.queued.push_back(contacts);
    }

    fn is_static(&self, handle: BodyHandle) -> Option<bool> {
        self.bodies.get(&handle).map(|s| s.desc.is_static)
    }
}

impl PhysicsBackend for ScriptedBackend {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle::new(self.next_handle, 0);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Slot {
                desc,
                vel: Vec2::ZERO,
                angular_velocity: 0.0,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
    }

    fn step(&mut self) -> Vec<ContactPair> {
        for slot in self.bodies.values_mut() {
            slot.desc.angle += slot.angular_velocity;
            if !slot.desc.is_static {
                slot.desc.pos += slot.vel;
            }
        }
        self.queued.pop_front().unwrap_or_default()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|s| s.desc.pos)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|s| s.vel)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|s| s.desc.angle)
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|s| s.angular_velocity)
    }

    fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(slot) = self.bodies.get_mut(&handle) {
            slot.desc.pos = pos;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(slot) = self.bodies.get_mut(&handle) {
            slot.vel = vel;
        }
    }

    fn set_static(&mut self, handle: BodyHandle, is_static: bool) {
        if let Some(slot) = self.bodies.get_mut(&handle) {
            slot.desc.is_static = is_static;
        }
    }

    fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(slot) = self.bodies.get_mut(&handle) {
            slot.desc.angle = angle;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(slot) = self.bodies.get_mut(&handle) {
            slot.angular_velocity = angular_velocity;
        }
    }
}

fn new_game(mode: GameMode) -> Game<ScriptedBackend> {
    Game::new(ScriptedBackend::default(), Settings::with_seed(2024), mode)
}

fn launch(game: &mut Game<ScriptedBackend>, pull: Vec2) -> Vec<GameEvent> {
    let at = game.body_view().pos;
    game.tick(&TickInput::down(at));
    game.tick(&TickInput::moved(at + pull));
    game.tick(&TickInput::up(at + pull))
}

fn first_handle(game: &Game<ScriptedBackend>, pred: impl Fn(&ObstacleKind) -> bool) -> BodyHandle {
    game.scene()
        .obstacles
        .iter()
        .find(|o| pred(&o.kind))
        .map(|o| o.handle)
        .expect("obstacle present")
}

/// Queue a single contact between the body and `other`, then tick once
fn touch(game: &mut Game<ScriptedBackend>, other: BodyHandle) -> Vec<GameEvent> {
    let body = game.scene().body_handle;
    game.backend_mut().queue(vec![ContactPair::new(body, other)]);
    game.tick(&TickInput::default())
}

#[test]
fn test_launch_unfreezes_body_in_backend() {
    let mut game = new_game(GameMode::Pinball);
    let body = game.scene().body_handle;
    game.tick(&TickInput::default());
    assert_eq!(game.backend().is_static(body), Some(true));

    let events = launch(&mut game, Vec2::new(0.0, 320.0));
    assert!(matches!(events[0], GameEvent::Launched { velocity } if (velocity.y + 22.5).abs() < 1e-4));
    assert_eq!(game.backend().is_static(body), Some(false));
    assert_eq!(game.body_view().state, BodyState::Flying);
}

#[test]
fn test_bumper_scores_and_bounces() {
    let mut game = new_game(GameMode::Pinball);
    launch(&mut game, Vec2::new(0.0, 320.0));
    let bumper = first_handle(&game, |k| matches!(k, ObstacleKind::Bumper(_)));

    let events = touch(&mut game, bumper);
    assert!(events.contains(&GameEvent::BumperHit { points: 50, streak: 1 }));
    assert_eq!(game.run().round_score(), 50);
    let body = game.scene().body_handle;
    let vel = game.backend().velocity(body).unwrap();
    assert!((vel.y + 18.0).abs() < 1e-3, "0.8 x 22.5 upward, got {vel:?}");

    // Same bumper again inside the cooldown window
    let events = touch(&mut game, bumper);
    assert!(events.is_empty());
    assert_eq!(game.run().round_score(), 50);
    assert!(game.scene().flashing_bumpers().count() == 1);
}

#[test]
fn test_three_drains_end_the_run() {
    let mut game = new_game(GameMode::Pinball);
    let drain = first_handle(&game, |k| matches!(k, ObstacleKind::Drain(_)));

    for expected_hearts in [2, 1] {
        launch(&mut game, Vec2::new(0.0, 320.0));
        let events = touch(&mut game, drain);
        assert!(events.contains(&GameEvent::HeartLost));
        assert_eq!(game.run().hearts(), expected_hearts);
        assert_eq!(game.body_view().state, BodyState::Idle);
        assert_eq!(game.body_view().pos, game.scene().launcher);
    }

    launch(&mut game, Vec2::new(0.0, 320.0));
    let events = touch(&mut game, drain);
    assert!(events.iter().any(|e| matches!(e, GameEvent::RunOver { score: 0 })));
    assert!(game.is_over());

    // Nothing moves once the run is over
    assert!(game.tick(&TickInput::default()).is_empty());
    let record = game.record(0);
    assert_eq!(record.rounds_cleared, 0);
}

#[test]
fn test_round_to_upgrade_to_next_round() {
    let mut game = new_game(GameMode::Pinball);
    launch(&mut game, Vec2::new(0.0, 320.0));
    let bumpers: Vec<BodyHandle> = game
        .scene()
        .obstacles
        .iter()
        .filter(|o| matches!(o.kind, ObstacleKind::Bumper(_)))
        .map(|o| o.handle)
        .collect();
    assert_eq!(bumpers.len(), 6);

    // Ten distinct-bumper hits at 50 each reach the 500 goal
    let mut offered = Vec::new();
    for i in 0..10 {
        let events = touch(&mut game, bumpers[i % bumpers.len()]);
        for event in events {
            if let GameEvent::UpgradesOffered { ids } = event {
                offered = ids;
            }
        }
        for _ in 0..6 {
            game.tick(&TickInput::default());
        }
        if game.phase() == ScenePhase::RoundComplete {
            break;
        }
    }
    assert_eq!(game.phase(), ScenePhase::RoundComplete);
    assert_eq!(offered.len(), 3);
    assert_eq!(game.run().current_round(), 2);
    assert_eq!(game.run().round_score_goal(), 700);

    let bodies = game.backend().bodies.len();
    let applied = game.choose_upgrade(2);
    assert_eq!(applied, Some(GameEvent::UpgradeApplied { id: offered[2].clone() }));
    assert_eq!(game.phase(), ScenePhase::Playing);
    assert_eq!(game.backend().bodies.len(), bodies);
    assert_eq!(game.body_view().state, BodyState::Idle);
    assert_eq!(game.run().round_score(), 0);
    assert_eq!(game.run().total_score(), 500);
}

#[test]
fn test_climb_hazard_platform_ground() {
    let mut game = new_game(GameMode::Climb);
    launch(&mut game, Vec2::new(0.0, 300.0));
    assert_eq!(game.snapshot().hearts, 2);

    // Hazard: consumed, scored and removed from the world
    let hazard = first_handle(&game, |k| matches!(k, ObstacleKind::Hazard(_)));
    let events = touch(&mut game, hazard);
    assert!(events.contains(&GameEvent::HazardDefeated { points: 100 }));
    let hud = game.snapshot();
    assert_eq!(hud.score, 100);
    assert_eq!(hud.super_meter, 15);
    assert_eq!(game.scene().tally.enemies_defeated, 1);
    assert!(game.backend().position(hazard).is_none());
    assert!(game.scene().obstacles.iter().all(|o| o.handle != hazard));

    // Platform from above while falling
    let (platform, top) = game
        .scene()
        .obstacles
        .iter()
        .find_map(|o| o.platform_top().map(|top| (o.handle, top)))
        .unwrap();
    let body = game.scene().body_handle;
    game.backend_mut().set_position(body, Vec2::new(300.0, top - 40.0));
    game.backend_mut().set_velocity(body, Vec2::new(10.0, 4.0));
    let events = touch(&mut game, platform);
    assert!(events.contains(&GameEvent::PlatformBounce));
    assert_eq!(game.backend().velocity(body), Some(Vec2::new(8.0, -25.0)));

    // Same platform from below: pass through untouched
    game.backend_mut().set_position(body, Vec2::new(300.0, top + 60.0));
    game.backend_mut().set_velocity(body, Vec2::new(0.0, -10.0));
    let events = touch(&mut game, platform);
    assert!(events.is_empty());
    assert_eq!(game.backend().velocity(body), Some(Vec2::new(0.0, -10.0)));

    // Ground: back to the launcher with hearts left
    let ground = first_handle(&game, |k| matches!(k, ObstacleKind::Ground));
    let events = touch(&mut game, ground);
    assert!(events.contains(&GameEvent::Landed));
    assert_eq!(game.phase(), ScenePhase::Playing);
    assert_eq!(game.body_view().pos, game.scene().launcher);
    assert!(game.snapshot().distance > 0);
}

#[test]
fn test_climb_out_of_hearts() {
    let mut game = new_game(GameMode::Climb);
    let ground = first_handle(&game, |k| matches!(k, ObstacleKind::Ground));
    for _ in 0..3 {
        launch(&mut game, Vec2::new(0.0, 300.0));
        touch(&mut game, ground);
    }
    assert!(game.is_over());
    assert_eq!(game.snapshot().hearts, 0);

    // No more launches once out of hearts
    let at = game.body_view().pos;
    game.tick(&TickInput::down(at));
    assert_eq!(game.body_view().state, BodyState::Idle);
}

#[test]
fn test_deduplicated_contacts() {
    let mut settings = Settings::with_seed(5);
    settings.dedupe_contacts = true;
    let mut game = Game::new(ScriptedBackend::default(), settings, GameMode::Climb);
    launch(&mut game, Vec2::new(0.0, 300.0));

    let (platform, top) = game
        .scene()
        .obstacles
        .iter()
        .find_map(|o| o.platform_top().map(|top| (o.handle, top)))
        .unwrap();
    let body = game.scene().body_handle;
    game.backend_mut().set_position(body, Vec2::new(300.0, top - 40.0));
    game.backend_mut().set_velocity(body, Vec2::new(10.0, 4.0));
    let pair = ContactPair::new(body, platform);
    game.backend_mut().queue(vec![pair, pair]);
    let events = game.tick(&TickInput::default());
    let bounces = events.iter().filter(|e| **e == GameEvent::PlatformBounce).count();
    assert_eq!(bounces, 1);
}
