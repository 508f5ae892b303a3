//! Flipper angular control
//!
//! The physics backend owns the flipper's actual angle; each step we read it
//! back, drive angular velocity toward the active or rest angle, then clamp
//! so solver overshoot can never spin a flipper past its range.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which side of the table a flipper sits on (angles are mirrored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipperTuning {
    /// Rest angle magnitude (radians); active angle is its mirror
    pub swing_angle: f32,
    pub angular_speed: f32,
    /// Fraction of `angular_speed` used when drifting back to rest
    pub return_factor: f32,
    /// Stop driving once this close to the target
    pub arrival: f32,
    /// Allowed overshoot before snapping back into range
    pub clamp_margin: f32,
}

impl Default for FlipperTuning {
    fn default() -> Self {
        Self {
            swing_angle: FLIPPER_ANGLE,
            angular_speed: FLIPPER_ANGULAR_SPEED,
            return_factor: FLIPPER_RETURN_FACTOR,
            arrival: FLIPPER_ARRIVAL,
            clamp_margin: FLIPPER_CLAMP_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flipper {
    pub side: FlipperSide,
    pub rest_angle: f32,
    pub active_angle: f32,
    pub activated: bool,
    /// Last angle known to the backend
    pub angle: f32,
    pub angular_velocity: f32,
}

impl Flipper {
    pub fn new(side: FlipperSide, tuning: &FlipperTuning) -> Self {
        // Rest points slightly down, active slightly up (y grows downward)
        let rest_angle = match side {
            FlipperSide::Left => tuning.swing_angle,
            FlipperSide::Right => -tuning.swing_angle,
        };
        Self {
            side,
            rest_angle,
            active_angle: -rest_angle,
            activated: false,
            angle: rest_angle,
            angular_velocity: 0.0,
        }
    }

    pub fn activate(&mut self) {
        self.activated = true;
    }

    pub fn deactivate(&mut self) {
        self.activated = false;
    }

    /// (min, max) of the legal swing range
    pub fn bounds(&self) -> (f32, f32) {
        (
            self.rest_angle.min(self.active_angle),
            self.rest_angle.max(self.active_angle),
        )
    }

    /// One control step. `speed_multiplier` comes from run upgrades.
    pub fn update(&mut self, speed_multiplier: f32, tuning: &FlipperTuning) {
        let (target, speed) = if self.activated {
            (self.active_angle, tuning.angular_speed * speed_multiplier)
        } else {
            (
                self.rest_angle,
                tuning.angular_speed * speed_multiplier * tuning.return_factor,
            )
        };

        let diff = target - self.angle;
        if diff.abs() > tuning.arrival {
            self.angular_velocity = diff.signum() * speed;
        } else {
            self.angular_velocity = 0.0;
        }

        let (lo, hi) = self.bounds();
        if self.angle < lo - tuning.clamp_margin {
            self.angle = lo;
            self.angular_velocity = 0.0;
        } else if self.angle > hi + tuning.clamp_margin {
            self.angle = hi;
            self.angular_velocity = 0.0;
        }
    }
}
