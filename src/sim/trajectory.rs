//! Slingshot aiming: pull vector -> launch velocity, plus the aim preview
//!
//! The same math feeds the preview and the real launch, so what the player
//! sees is what they get (modulo the real engine's gravity, which the
//! preview deliberately ignores).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullTuning {
    /// Full-power pull as a fraction of screen height
    pub max_pull_fraction: f32,
    pub speed_y: f32,
    pub speed_x: f32,
    /// Downward pull required to commit a launch
    pub min_pull: f32,
    pub preview_gravity: f32,
    pub preview_steps: u32,
    /// Stop sampling once the arc falls this far below the start
    pub preview_cutoff: f32,
}

impl Default for PullTuning {
    fn default() -> Self {
        Self {
            max_pull_fraction: MAX_PULL_FRACTION,
            speed_y: LAUNCH_SPEED_Y,
            speed_x: LAUNCH_SPEED_X,
            min_pull: MIN_PULL,
            preview_gravity: PREVIEW_GRAVITY,
            preview_steps: PREVIEW_STEPS,
            preview_cutoff: PREVIEW_CUTOFF,
        }
    }
}

/// Everything a renderer needs to draw the aim overlay
#[derive(Debug, Clone, Default, Serialize)]
pub struct AimPreview {
    /// Sampled parabola, one point per preview step
    pub path: Vec<Vec2>,
    /// Where the drag handle is drawn (body + pull)
    pub indicator: Vec2,
    pub indicator_radius: f32,
    /// Straight-line position after 20 steps, once power passes 10%
    pub peak_marker: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPlanner {
    pub tuning: PullTuning,
    pub screen_height: f32,
}

impl TrajectoryPlanner {
    pub fn new(tuning: PullTuning, screen_height: f32) -> Self {
        Self {
            tuning,
            screen_height,
        }
    }

    #[inline]
    pub fn max_pull(&self) -> f32 {
        self.screen_height * self.tuning.max_pull_fraction
    }

    /// Pull normalized by `max_pull`; Y clamped to [0, 1], X left unclamped
    pub fn normalized(&self, pull: Vec2) -> Vec2 {
        let max_pull = self.max_pull();
        Vec2::new(pull.x / max_pull, (pull.y / max_pull).clamp(0.0, 1.0))
    }

    /// Charge shown while dragging
    pub fn charge_amount(&self, pull: Vec2) -> f32 {
        self.normalized(pull).y
    }

    /// Launch velocity for a pull: opposite to the drag direction
    pub fn launch_velocity(&self, pull: Vec2, power_multiplier: f32) -> Vec2 {
        let norm = self.normalized(pull);
        let magnitude = Vec2::new(
            norm.x * self.tuning.speed_x * power_multiplier,
            norm.y * self.tuning.speed_y * power_multiplier,
        );
        -magnitude
    }

    /// A release commits only past the minimum downward pull
    #[inline]
    pub fn commits(&self, pull: Vec2) -> bool {
        pull.y > self.tuning.min_pull
    }

    /// Velocity to launch with, or `None` if the release should cancel the charge
    pub fn plan(&self, pull: Vec2, power_multiplier: f32) -> Option<Vec2> {
        self.commits(pull)
            .then(|| self.launch_velocity(pull, power_multiplier))
    }

    /// Fixed-step ballistic samples from `start` with the given initial velocity
    pub fn sample_path(&self, start: Vec2, velocity: Vec2) -> Vec<Vec2> {
        let half_g = 0.5 * self.tuning.preview_gravity;
        (0..self.tuning.preview_steps)
            .map(|t| {
                let t = t as f32;
                Vec2::new(
                    start.x + velocity.x * t,
                    start.y + velocity.y * t + half_g * t * t,
                )
            })
            .take_while(|p| p.y <= start.y + self.tuning.preview_cutoff)
            .collect()
    }

    /// Aim overlay for the current drag. Empty path while not pulling down.
    pub fn preview(&self, start: Vec2, pull: Vec2, power_multiplier: f32) -> AimPreview {
        if pull.y <= 0.0 {
            return AimPreview::default();
        }
        let velocity = self.launch_velocity(pull, power_multiplier);
        let norm_y = self.normalized(pull).y;
        // Power is shown as a whole percentage; the marker appears above 10%
        let peak_marker = ((norm_y * 100.0).round() > 10.0).then(|| start + velocity * 20.0);
        AimPreview {
            path: self.sample_path(start, velocity),
            indicator: start + pull,
            indicator_radius: 15.0 + norm_y * 30.0,
            peak_marker,
        }
    }
}

impl Default for TrajectoryPlanner {
    fn default() -> Self {
        Self::new(PullTuning::default(), GAME_HEIGHT)
    }
}
