//! Rock thrower.
//!
//! On tiers with rocks enabled a rock is thrown every few seconds at a random
//! block from the upper half of the stack. Rocks ignore gravity and fly in a
//! straight line; each one is despawned after a fixed lifetime whether it hit
//! anything or not.

use monkey_physics::BodyId;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Countdown;
use crate::config::Tuning;

/// A live rock and its remaining lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rock {
    pub body: BodyId,
    pub lifetime: Countdown,
}

/// Spawn position and velocity for a new rock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RockLaunch {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// Aim a rock from a random side of the screen at `target`.
pub fn aim_rock<R: Rng>(target: (f64, f64), tuning: &Tuning, rng: &mut R) -> RockLaunch {
    let from_left = rng.gen_bool(0.5);
    let margin = tuning.rock_radius * 2.0;
    let x = if from_left {
        -margin
    } else {
        tuning.world_width + margin
    };
    let y = target.1 - 40.0;

    let (dx, dy) = (target.0 - x, target.1 - y);
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    RockLaunch {
        x,
        y,
        vx: dx / len * tuning.rock_speed,
        vy: dy / len * tuning.rock_speed * tuning.rock_vertical_damping,
    }
}

/// Throw timer plus the set of rocks in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockThrower {
    interval_ms: f64,
    lifetime_ms: f64,
    timer: Countdown,
    rocks: Vec<Rock>,
}

impl RockThrower {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            interval_ms: tuning.rock_interval_ms,
            lifetime_ms: tuning.rock_lifetime_ms,
            timer: Countdown::new(tuning.rock_interval_ms),
            rocks: Vec::new(),
        }
    }

    /// Advance the throw timer. Returns `true` on every interval boundary;
    /// the caller decides whether conditions allow a throw.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if self.timer.advance(dt_ms) {
            self.timer = Countdown::new(self.interval_ms);
            return true;
        }
        false
    }

    pub fn track(&mut self, body: BodyId) {
        self.rocks.push(Rock {
            body,
            lifetime: Countdown::new(self.lifetime_ms),
        });
    }

    /// Age every rock; return the ones whose lifetime just ran out.
    pub fn expire(&mut self, dt_ms: f64) -> Vec<BodyId> {
        let mut expired = Vec::new();
        self.rocks.retain_mut(|rock| {
            if rock.lifetime.advance(dt_ms) {
                expired.push(rock.body);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Stop tracking a rock. Returns `false` if it was not tracked.
    pub fn remove(&mut self, body: BodyId) -> bool {
        let before = self.rocks.len();
        self.rocks.retain(|r| r.body != body);
        self.rocks.len() != before
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.rocks.iter().any(|r| r.body == body)
    }

    pub fn rocks(&self) -> &[Rock] {
        &self.rocks
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.rocks.iter().map(|r| r.body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
