//! Run orchestration across rounds
//!
//! `Game` owns the backend, the run, the seeded RNG and the active scene.
//! Pinball rounds end in an upgrade offer; picking one rebuilds the table
//! for the next round.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::backend::PhysicsBackend;
use super::progression::{Character, HudSnapshot, RunProgression};
use super::scene::{BodyView, GameMode, Scene, ScenePhase};
use super::tick::{GameEvent, TickInput, tick};
use super::trajectory::AimPreview;
use super::upgrades::{Upgrade, UpgradeCatalog};
use crate::consts::UPGRADE_OFFER_COUNT;
use crate::highscores::RunRecord;
use crate::settings::Settings;

pub struct Game<B: PhysicsBackend> {
    backend: B,
    settings: Settings,
    run: RunProgression,
    rng: Pcg32,
    catalog: UpgradeCatalog,
    mode: GameMode,
    scene: Scene,
    offers: Vec<&'static Upgrade>,
}

impl<B: PhysicsBackend> Game<B> {
    pub fn new(mut backend: B, settings: Settings, mode: GameMode) -> Self {
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let scene = Scene::new(mode, &mut backend, &settings, &mut rng);
        log::info!("New {} game (seed {})", mode.as_str(), settings.seed);
        Self {
            backend,
            settings,
            run: RunProgression::new(),
            rng,
            catalog: UpgradeCatalog::default(),
            mode,
            scene,
            offers: Vec::new(),
        }
    }

    /// Advance one fixed step. A completed round draws the upgrade offer.
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = tick(&mut self.scene, &mut self.run, &mut self.backend, &mut self.rng, input);
        let round_done = events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundComplete { .. }));
        if round_done {
            self.offers = self.catalog.random(
                UPGRADE_OFFER_COUNT,
                self.run.active_upgrade_ids(),
                &mut self.rng,
            );
            let ids = self.offers.iter().map(|u| u.id.to_string()).collect();
            events.push(GameEvent::UpgradesOffered { ids });
            if self.offers.is_empty() {
                log::info!("Catalog exhausted; continuing without an offer");
                self.next_round();
            }
        }
        events
    }

    /// Take offer `index` and start the next round
    pub fn choose_upgrade(&mut self, index: usize) -> Option<GameEvent> {
        if self.scene.phase != ScenePhase::RoundComplete {
            return None;
        }
        let upgrade = *self.offers.get(index)?;
        self.run.apply_upgrade(upgrade.id, &upgrade.effects);
        self.next_round();
        Some(GameEvent::UpgradeApplied {
            id: upgrade.id.to_string(),
        })
    }

    /// Apply a catalog upgrade by id outside the offer flow
    pub fn apply_upgrade_by_id(&mut self, id: &str) -> bool {
        match self.catalog.get(id) {
            Some(upgrade) => {
                self.run.apply_upgrade(upgrade.id, &upgrade.effects);
                true
            }
            None => {
                log::warn!("Unknown upgrade id {id:?}");
                false
            }
        }
    }

    /// Decline the offer and start the next round
    pub fn skip_upgrade(&mut self) {
        if self.scene.phase == ScenePhase::RoundComplete {
            self.next_round();
        }
    }

    fn next_round(&mut self) {
        self.rebuild_scene();
        log::info!("Round {} begins", self.run.current_round());
    }

    fn rebuild_scene(&mut self) {
        self.scene.teardown(&mut self.backend);
        self.scene = Scene::new(self.mode, &mut self.backend, &self.settings, &mut self.rng);
        self.offers.clear();
    }

    /// Fresh run, optionally switching mode
    pub fn new_run(&mut self, character: &Character, mode: GameMode) {
        self.run.new_run(character);
        self.mode = mode;
        self.rebuild_scene();
    }

    pub fn is_over(&self) -> bool {
        self.scene.phase == ScenePhase::RunOver
    }

    pub fn phase(&self) -> ScenePhase {
        self.scene.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn offers(&self) -> &[&'static Upgrade] {
        &self.offers
    }

    pub fn run(&self) -> &RunProgression {
        &self.run
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snapshot(&self) -> HudSnapshot {
        self.scene.hud(&self.run)
    }

    pub fn body_view(&self) -> BodyView {
        self.scene.body_view(&self.run)
    }

    pub fn aim_preview(&self) -> Option<AimPreview> {
        self.scene.aim_preview(&self.run)
    }

    /// Leaderboard entry for the current run
    pub fn record(&self, timestamp: u64) -> RunRecord {
        RunRecord {
            score: self.snapshot().score,
            rounds_cleared: self.run.current_round().saturating_sub(1),
            mode: self.mode,
            character: self.run.character_id().to_string(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::backend::HeadlessWorld;
    use glam::Vec2;

    fn game(mode: GameMode) -> Game<HeadlessWorld> {
        Game::new(HeadlessWorld::default(), Settings::default(), mode)
    }

    fn finish_round(game: &mut Game<HeadlessWorld>) -> Vec<GameEvent> {
        game.run.add_score(10_000);
        game.tick(&TickInput::default())
    }

    #[test]
    fn test_round_complete_offers_three() {
        let mut game = game(GameMode::Pinball);
        let events = finish_round(&mut game);
        assert_eq!(game.phase(), ScenePhase::RoundComplete);
        assert_eq!(game.offers().len(), 3);
        assert!(events.iter().any(|e| matches!(e, GameEvent::UpgradesOffered { ids } if ids.len() == 3)));
    }

    #[test]
    fn test_choose_upgrade_starts_next_round() {
        let mut game = game(GameMode::Pinball);
        finish_round(&mut game);
        let chosen = game.offers()[1].id;
        let bodies = game.backend().body_count();

        let event = game.choose_upgrade(1);
        assert_eq!(event, Some(GameEvent::UpgradeApplied { id: chosen.to_string() }));
        assert_eq!(game.run().active_upgrade_ids(), [chosen]);
        assert_eq!(game.phase(), ScenePhase::Playing);
        assert!(game.offers().is_empty());
        assert_eq!(game.run().current_round(), 2);
        // Old table removed, new one built
        assert_eq!(game.backend().body_count(), bodies);

        // Next offer never repeats an owned upgrade
        finish_round(&mut game);
        assert!(game.offers().iter().all(|u| u.id != chosen));
    }

    #[test]
    fn test_choose_outside_offer_is_noop() {
        let mut game = game(GameMode::Pinball);
        assert_eq!(game.choose_upgrade(0), None);
        finish_round(&mut game);
        assert_eq!(game.choose_upgrade(7), None);
        assert_eq!(game.phase(), ScenePhase::RoundComplete);
    }

    #[test]
    fn test_exhausted_catalog_skips_offer() {
        let mut game = game(GameMode::Pinball);
        for upgrade in UpgradeCatalog::default().entries() {
            assert!(game.apply_upgrade_by_id(upgrade.id));
        }
        finish_round(&mut game);
        assert!(game.offers().is_empty());
        assert_eq!(game.phase(), ScenePhase::Playing);
    }

    #[test]
    fn test_unknown_upgrade_id() {
        let mut game = game(GameMode::Pinball);
        assert!(!game.apply_upgrade_by_id("nine_lives"));
        assert!(game.run().active_upgrade_ids().is_empty());
    }

    #[test]
    fn test_new_run_resets_and_switches_mode() {
        let mut game = game(GameMode::Pinball);
        finish_round(&mut game);
        game.choose_upgrade(0);
        let midnight = Character::by_id("midnight").unwrap();
        game.new_run(midnight, GameMode::Climb);
        assert_eq!(game.mode(), GameMode::Climb);
        assert_eq!(game.phase(), ScenePhase::Playing);
        assert_eq!(game.run().current_round(), 1);
        assert!(game.run().active_upgrade_ids().is_empty());
        assert_eq!(game.body_view().color, 0x222222);
        assert!(game.scene().spawner.is_some());
    }

    #[test]
    fn test_record() {
        let mut game = game(GameMode::Pinball);
        finish_round(&mut game);
        let record = game.record(1234);
        assert_eq!(record.score, 10_000);
        assert_eq!(record.rounds_cleared, 1);
        assert_eq!(record.mode, GameMode::Pinball);
        assert_eq!(record.character, "fluffy");
    }

    #[test]
    fn test_aim_preview_only_while_charging() {
        let mut game = game(GameMode::Pinball);
        assert!(game.aim_preview().is_none());
        let at = game.body_view().pos;
        game.tick(&TickInput::down(at));
        game.tick(&TickInput::moved(at + Vec2::new(0.0, 200.0)));
        let aim = game.aim_preview().unwrap();
        assert!(!aim.path.is_empty());
    }

    #[test]
    fn test_same_seed_replays() {
        let script = |game: &mut Game<HeadlessWorld>| {
            let at = game.body_view().pos;
            game.tick(&TickInput::down(at));
            game.tick(&TickInput::moved(at + Vec2::new(-60.0, 500.0)));
            game.tick(&TickInput::up(at + Vec2::new(-60.0, 500.0)));
            for _ in 0..400 {
                game.tick(&TickInput::default());
            }
            (game.snapshot(), game.body_view().pos)
        };
        let mut a = game(GameMode::Climb);
        let mut b = game(GameMode::Climb);
        assert_eq!(script(&mut a), script(&mut b));
    }
}
