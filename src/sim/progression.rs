//! Run progression: rounds, hearts, score and upgrade multipliers
//!
//! One `RunProgression` exists per run. The game owns it and hands it by
//! reference to whatever drives the simulation, so every scene in a run
//! sees the same state. `new_run` resets it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::upgrades::UpgradeEffects;
use crate::consts::*;

/// Selectable cat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    /// Tint (0xRRGGBB)
    pub color: u32,
}

pub static CHARACTERS: [Character; 3] = [
    Character {
        id: "fluffy",
        name: "Fluffy",
        color: 0xffa500,
    },
    Character {
        id: "bandit",
        name: "Bandit",
        color: 0x9932cc,
    },
    Character {
        id: "midnight",
        name: "Midnight",
        color: 0x222222,
    },
];

impl Character {
    pub fn by_id(id: &str) -> Option<&'static Character> {
        CHARACTERS.iter().find(|c| c.id == id)
    }
}

impl Default for Character {
    fn default() -> Self {
        CHARACTERS[0]
    }
}

/// HUD snapshot pushed to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub hearts: u32,
    pub max_hearts: u32,
    pub score: u64,
    pub super_meter: u32,
    pub max_super_meter: u32,
    /// Round score in pinball, height reached in climb
    pub distance: u64,
}

/// Whether a drain cost a heart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartOutcome {
    Saved,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgression {
    current_round: u32,
    hearts: u32,
    max_hearts: u32,
    total_score: u64,
    round_score: u64,

    launch_power_multiplier: f32,
    flipper_speed_multiplier: f32,
    bumper_score_multiplier: f32,
    /// Not clamped; anything >= 1 always saves
    drain_save_chance: f32,
    combo_bonus: u32,

    /// Acquisition order
    active_upgrade_ids: Vec<String>,

    character_id: String,
    character_color: u32,
}

impl Default for RunProgression {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgression {
    pub fn new() -> Self {
        Self::with_character(&Character::default())
    }

    pub fn with_character(character: &Character) -> Self {
        Self {
            current_round: 1,
            hearts: STARTING_HEARTS,
            max_hearts: STARTING_HEARTS,
            total_score: 0,
            round_score: 0,
            launch_power_multiplier: 1.0,
            flipper_speed_multiplier: 1.0,
            bumper_score_multiplier: 1.0,
            drain_save_chance: 0.0,
            combo_bonus: 0,
            active_upgrade_ids: Vec::new(),
            character_id: character.id.to_string(),
            character_color: character.color,
        }
    }

    /// Reset everything for a fresh run
    pub fn new_run(&mut self, character: &Character) {
        *self = Self::with_character(character);
        log::info!("New run as {}", character.name);
    }

    /// Add points scaled by the bumper multiplier (floored). Returns points applied.
    pub fn add_score(&mut self, points: u32) -> u64 {
        let adjusted = (points as f64 * self.bumper_score_multiplier as f64).floor().max(0.0) as u64;
        self.round_score += adjusted;
        self.total_score += adjusted;
        adjusted
    }

    /// Score needed to clear the current round
    pub fn round_score_goal(&self) -> u64 {
        BASE_ROUND_GOAL + (self.current_round as u64 - 1) * ROUND_GOAL_STEP
    }

    pub fn round_goal_reached(&self) -> bool {
        self.round_score >= self.round_score_goal()
    }

    /// Drain penalty; may be negated by `drain_save_chance`
    pub fn lose_heart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> HeartOutcome {
        if rng.random::<f32>() < self.drain_save_chance {
            return HeartOutcome::Saved;
        }
        self.hearts = self.hearts.saturating_sub(1);
        HeartOutcome::Lost
    }

    pub fn add_heart(&mut self, amount: u32) {
        self.hearts = self.hearts.saturating_add(amount).min(self.max_hearts);
    }

    pub fn is_game_over(&self) -> bool {
        self.hearts == 0
    }

    /// Next round: zero round score and heal one heart
    pub fn advance_round(&mut self) {
        self.current_round += 1;
        self.round_score = 0;
        self.add_heart(1);
        log::info!(
            "Round {} (goal {}), hearts {}/{}",
            self.current_round,
            self.round_score_goal(),
            self.hearts,
            self.max_hearts
        );
    }

    /// Record an upgrade and fold its effects into the run
    pub fn apply_upgrade(&mut self, id: &str, effects: &UpgradeEffects) {
        self.active_upgrade_ids.push(id.to_string());

        if let Some(extra) = effects.max_hearts {
            self.max_hearts += extra;
            self.hearts = self.max_hearts;
        }
        if let Some(m) = effects.launch_power_multiplier {
            self.launch_power_multiplier *= m;
        }
        if let Some(m) = effects.flipper_speed_multiplier {
            self.flipper_speed_multiplier *= m;
        }
        if let Some(m) = effects.bumper_score_multiplier {
            self.bumper_score_multiplier *= m;
        }
        if let Some(chance) = effects.drain_save_chance {
            self.drain_save_chance += chance;
        }
        if let Some(bonus) = effects.combo_bonus {
            self.combo_bonus += bonus;
        }
        log::debug!("Applied upgrade {id}: {effects:?}");
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn max_hearts(&self) -> u32 {
        self.max_hearts
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn round_score(&self) -> u64 {
        self.round_score
    }

    pub fn launch_power_multiplier(&self) -> f32 {
        self.launch_power_multiplier
    }

    pub fn flipper_speed_multiplier(&self) -> f32 {
        self.flipper_speed_multiplier
    }

    pub fn bumper_score_multiplier(&self) -> f32 {
        self.bumper_score_multiplier
    }

    pub fn drain_save_chance(&self) -> f32 {
        self.drain_save_chance
    }

    pub fn combo_bonus(&self) -> u32 {
        self.combo_bonus
    }

    pub fn active_upgrade_ids(&self) -> &[String] {
        &self.active_upgrade_ids
    }

    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    pub fn character_color(&self) -> u32 {
        self.character_color
    }

    /// Pinball HUD: total score, round score as "distance"
    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            hearts: self.hearts,
            max_hearts: self.max_hearts,
            score: self.total_score,
            super_meter: 0,
            max_super_meter: MAX_SUPER_METER,
            distance: self.round_score,
        }
    }
}
