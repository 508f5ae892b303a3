//! Contact resolution
//!
//! The engine reports contact-start pairs; we map the non-body side to an
//! obstacle through the registry and apply that obstacle's rule to the
//! launch body, the scene tally, and the run. Pairs are handled in the
//! order reported. Each pair is independent unless `dedupe` is set.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::backend::{BodyHandle, ContactPair};
use super::body::LaunchBody;
use super::obstacle::{ObstacleKind, ObstacleRegistry};
use super::progression::{HeartOutcome, RunProgression};
use super::scene::{GameMode, SceneTally};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactTuning {
    pub hazard_score: u32,
    pub hazard_bounce: f32,
    pub super_meter_gain: u32,
    pub bumper_score: u32,
    pub bumper_bounce: f32,
    pub bumper_cooldown_ticks: u32,
    /// How far above a platform's top the body's lower edge may be and still land
    pub platform_tolerance: f32,
}

impl Default for ContactTuning {
    fn default() -> Self {
        Self {
            hazard_score: HAZARD_SCORE,
            hazard_bounce: HAZARD_BOUNCE,
            super_meter_gain: SUPER_METER_PER_HAZARD,
            bumper_score: BUMPER_SCORE,
            bumper_bounce: BUMPER_BOUNCE,
            bumper_cooldown_ticks: BUMPER_COOLDOWN_TICKS,
            platform_tolerance: PLATFORM_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrainOutcome {
    /// Save chance rolled in our favor; body back at the launcher
    Saved,
    /// Heart spent; body back at the launcher
    HeartLost,
    /// Last heart spent
    RunOver,
}

/// What a single contact did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactOutcome {
    /// Not our body, unknown handle, or already-consumed obstacle
    Ignored,
    HazardDefeated { points: u32 },
    Landed,
    PlatformBounce,
    /// One-way platform touched from the wrong side
    PassThrough,
    BumperHit { points: u64, streak: u32 },
    BumperCooling,
    Drained(DrainOutcome),
    /// Physical-only contacts (flippers, walls)
    Physical,
}

/// Everything a contact may touch, borrowed for one step
pub struct ContactScope<'a, R: Rng + ?Sized> {
    pub mode: GameMode,
    pub body: &'a mut LaunchBody,
    pub body_handle: BodyHandle,
    pub obstacles: &'a mut ObstacleRegistry,
    pub run: &'a mut RunProgression,
    pub tally: &'a mut SceneTally,
    /// Where the body is reset after a drain
    pub launcher: Vec2,
    pub rng: &'a mut R,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionResolver {
    pub tuning: ContactTuning,
    /// Drop repeat reports of the same body pair within one step
    pub dedupe: bool,
}

impl CollisionResolver {
    pub fn new(tuning: ContactTuning, dedupe: bool) -> Self {
        Self { tuning, dedupe }
    }

    /// Resolve a step's contacts in engine order
    pub fn resolve_all<R: Rng + ?Sized>(
        &self,
        contacts: &[ContactPair],
        scope: &mut ContactScope<'_, R>,
    ) -> Vec<ContactOutcome> {
        let mut seen = HashSet::new();
        contacts
            .iter()
            .filter(|pair| !self.dedupe || seen.insert(pair.key()))
            .map(|pair| self.resolve(pair, scope))
            .collect()
    }

    pub fn resolve<R: Rng + ?Sized>(
        &self,
        contact: &ContactPair,
        scope: &mut ContactScope<'_, R>,
    ) -> ContactOutcome {
        let Some(other) = contact.other(scope.body_handle) else {
            return ContactOutcome::Ignored;
        };
        let Some(id) = scope.obstacles.lookup(other) else {
            return ContactOutcome::Ignored;
        };
        let Some(obstacle) = scope.obstacles.get_mut(id) else {
            return ContactOutcome::Ignored;
        };
        let platform_top = obstacle.platform_top();

        let outcome = match &mut obstacle.kind {
            ObstacleKind::Hazard(hazard) => {
                if hazard.destroyed {
                    return ContactOutcome::Ignored;
                }
                hazard.destroyed = true;
                let tally = &mut *scope.tally;
                tally.enemies_defeated += 1;
                tally.score += self.tuning.hazard_score as u64;
                tally.super_meter =
                    (tally.super_meter + self.tuning.super_meter_gain).min(tally.max_super_meter);
                scope.body.add_bounce(self.tuning.hazard_bounce);
                ContactOutcome::HazardDefeated {
                    points: self.tuning.hazard_score,
                }
            }
            ObstacleKind::Ground => {
                scope.body.land();
                ContactOutcome::Landed
            }
            ObstacleKind::Platform(_) => {
                let top = platform_top.unwrap_or(f32::INFINITY);
                let falling = scope.body.velocity().y > 0.0;
                let bottom = scope.body.position().y + scope.body.radius();
                if falling && bottom <= top + self.tuning.platform_tolerance {
                    scope.body.platform_bounce();
                    ContactOutcome::PlatformBounce
                } else {
                    ContactOutcome::PassThrough
                }
            }
            ObstacleKind::Bumper(bumper) => {
                let Some(base) = bumper.on_hit(self.tuning.bumper_score, self.tuning.bumper_cooldown_ticks)
                else {
                    return ContactOutcome::BumperCooling;
                };
                let (points, streak) = self.score_bumper(base, scope);
                scope.body.add_bounce(self.tuning.bumper_bounce);
                ContactOutcome::BumperHit { points, streak }
            }
            ObstacleKind::Drain(_) => match scope.mode {
                GameMode::Pinball if !scope.run.is_game_over() => {
                    ContactOutcome::Drained(self.drain(scope))
                }
                _ => ContactOutcome::Ignored,
            },
            ObstacleKind::Flipper(_) | ObstacleKind::Wall => ContactOutcome::Physical,
        };

        log::debug!("contact {:?} -> {:?}", other, outcome);
        outcome
    }

    /// Bumper points: through the run's multiplier in pinball, raw in climb.
    /// Consecutive hits in one flight add the run's combo bonus.
    fn score_bumper<R: Rng + ?Sized>(&self, base: u32, scope: &mut ContactScope<'_, R>) -> (u64, u32) {
        scope.tally.bumper_streak += 1;
        let streak = scope.tally.bumper_streak;
        let points = match scope.mode {
            GameMode::Pinball => {
                let mut points = scope.run.add_score(base);
                let bonus = scope.run.combo_bonus();
                if streak > 1 && bonus > 0 {
                    points += scope.run.add_score(bonus);
                }
                points
            }
            GameMode::Climb => {
                scope.tally.score += base as u64;
                base as u64
            }
        };
        (points, streak)
    }

    fn drain<R: Rng + ?Sized>(&self, scope: &mut ContactScope<'_, R>) -> DrainOutcome {
        scope.tally.bumper_streak = 0;
        match scope.run.lose_heart(scope.rng) {
            HeartOutcome::Saved => {
                log::info!("Drain saved");
                scope.body.reset_to_start(scope.launcher);
                DrainOutcome::Saved
            }
            HeartOutcome::Lost if scope.run.is_game_over() => {
                log::info!("Last heart lost");
                DrainOutcome::RunOver
            }
            HeartOutcome::Lost => {
                scope.body.reset_to_start(scope.launcher);
                DrainOutcome::HeartLost
            }
        }
    }
}
