//! The launchable body (the cat)
//!
//! A small state machine: Idle -> Charging -> Flying -> Landing -> Idle.
//! Velocity is force-set only by the transitions here; between them the
//! physics backend integrates freely and reports back through [`LaunchBody::sync`].
//! Every mutator is a no-op outside its valid state, so contact dispatch
//! never has to pre-check.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the launch body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyState {
    /// Resting at the launcher, frozen (static) in the physics world
    #[default]
    Idle,
    /// Slingshot being pulled back
    Charging,
    /// Free flight, integrated by the physics backend
    Flying,
    /// Touched the ground; the scene resets it on its next update
    Landing,
}

/// Velocity constants for scripted bounces and steering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTuning {
    pub radius: f32,
    pub min_boost: f32,
    pub bounce_x_damping: f32,
    pub platform_bounce_speed: f32,
    pub platform_x_damping: f32,
    pub max_steer_speed: f32,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            radius: BODY_RADIUS,
            min_boost: MIN_BOOST,
            bounce_x_damping: BOUNCE_X_DAMPING,
            platform_bounce_speed: PLATFORM_BOUNCE_SPEED,
            platform_x_damping: PLATFORM_X_DAMPING,
            max_steer_speed: MAX_STEER_SPEED,
        }
    }
}

/// The single player-controlled actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchBody {
    pos: Vec2,
    vel: Vec2,
    state: BodyState,
    /// Pull strength, only meaningful while charging
    charge: f32,
    /// Frozen in place (static body) until launched
    frozen: bool,
    tuning: BodyTuning,
    /// Set whenever position/velocity/frozen were force-set and the backend
    /// has not been told yet
    #[serde(skip)]
    pending_write: bool,
}

impl LaunchBody {
    pub fn new(pos: Vec2, tuning: BodyTuning) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            state: BodyState::Idle,
            charge: 0.0,
            frozen: true,
            tuning,
            pending_write: true,
        }
    }

    #[inline]
    pub fn state(&self) -> BodyState {
        self.state
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    #[inline]
    pub fn charge(&self) -> f32 {
        self.charge
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.tuning.radius
    }

    /// True while the body should be a static (non-integrated) physics body
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Accept the backend's integrated position/velocity for this step
    pub fn sync(&mut self, pos: Vec2, vel: Vec2) {
        if self.frozen {
            return;
        }
        self.pos = pos;
        self.vel = vel;
    }

    /// Take the pending force-set flag (true if the backend must be updated)
    pub fn take_pending_write(&mut self) -> bool {
        std::mem::take(&mut self.pending_write)
    }

    pub fn start_charging(&mut self) {
        if self.state != BodyState::Idle {
            return;
        }
        self.state = BodyState::Charging;
        self.charge = 0.0;
    }

    /// Update pull strength, clamped to [0, 1]
    pub fn set_charge_amount(&mut self, amount: f32) {
        if self.state != BodyState::Charging {
            return;
        }
        self.charge = if amount.is_nan() {
            0.0
        } else {
            amount.clamp(0.0, 1.0)
        };
    }

    pub fn cancel_charge(&mut self) {
        if self.state != BodyState::Charging {
            return;
        }
        self.state = BodyState::Idle;
        self.charge = 0.0;
    }

    /// Release the slingshot with the given velocity
    pub fn launch(&mut self, velocity: Vec2) {
        if self.state != BodyState::Charging {
            return;
        }
        self.state = BodyState::Flying;
        self.charge = 0.0;
        self.frozen = false;
        self.force_velocity(velocity);
    }

    /// Mark the flight as over; the owning scene performs the reset
    pub fn land(&mut self) {
        if self.state != BodyState::Flying {
            return;
        }
        self.state = BodyState::Landing;
    }

    /// Freeze the body at `pos`, ready for the next launch. Valid from any state.
    pub fn reset_to_start(&mut self, pos: Vec2) {
        self.state = BodyState::Idle;
        self.charge = 0.0;
        self.frozen = true;
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.pending_write = true;
    }

    /// Strong upward kick scaled by current vertical speed
    pub fn add_bounce(&mut self, multiplier: f32) {
        if self.state != BodyState::Flying {
            return;
        }
        let boost_y = (self.vel.y.abs() * multiplier).max(self.tuning.min_boost);
        self.force_velocity(Vec2::new(self.vel.x * self.tuning.bounce_x_damping, -boost_y));
    }

    /// Fixed upward kick off a one-way platform (up is forward in this game)
    pub fn platform_bounce(&mut self) {
        if self.state != BodyState::Flying {
            return;
        }
        self.force_velocity(Vec2::new(
            self.vel.x * self.tuning.platform_x_damping,
            -self.tuning.platform_bounce_speed,
        ));
    }

    /// Nudge horizontal speed, capped so steering can't run away
    pub fn steer(&mut self, force_x: f32) {
        if self.state != BodyState::Flying {
            return;
        }
        let max = self.tuning.max_steer_speed;
        let vx = (self.vel.x + force_x).clamp(-max, max);
        self.force_velocity(Vec2::new(vx, self.vel.y));
    }

    fn force_velocity(&mut self, vel: Vec2) {
        self.vel = vel;
        self.pending_write = true;
    }

    /// Sprite scale derived from state: squash while charging, stretch while rising
    pub fn view_scale(&self) -> Vec2 {
        match self.state {
            BodyState::Charging => Vec2::new(1.0 + self.charge * 0.2, 1.0 - self.charge * 0.3),
            BodyState::Flying if self.vel.y < 0.0 => {
                let stretch = (self.vel.length() / 20.0).min(0.3);
                Vec2::new(1.0 - stretch * 0.3, 1.0 + stretch)
            }
            _ => Vec2::ONE,
        }
    }
}
