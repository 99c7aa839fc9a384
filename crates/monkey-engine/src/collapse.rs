//! Tower stability state machine.
//!
//! ```text
//!   Stable --wobble--> Wobbling --500 ms--> Stable
//!     |                   |
//!     +------fall---------+--> Falling --collapse scroll done--> GameOver
//! ```
//!
//! `Falling` and `GameOver` are terminal for gameplay: no wobble, no new
//! drops, no hazards. Entering `Falling` is idempotent and so is reaching
//! `GameOver`, which is what guarantees the game-over event fires once.
//!
//! The machine itself only tracks state. The impulse helpers below compute
//! the randomized kicks the session applies to stack members.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Countdown;
use crate::config::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TowerState {
    Stable,
    Wobbling { recover: Countdown },
    Falling,
    GameOver,
}

impl TowerState {
    /// `Falling` or `GameOver`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TowerState::Falling | TowerState::GameOver)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TowerState::Stable => "stable",
            TowerState::Wobbling { .. } => "wobbling",
            TowerState::Falling => "falling",
            TowerState::GameOver => "game_over",
        }
    }
}

/// Owns the [`TowerState`] and enforces its transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerMachine {
    state: TowerState,
}

impl Default for TowerMachine {
    fn default() -> Self {
        Self {
            state: TowerState::Stable,
        }
    }
}

impl TowerMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TowerState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Enter `Wobbling`. Only from `Stable` with at least two placed blocks.
    pub fn begin_wobble(&mut self, stack_len: usize, recover_ms: f64) -> bool {
        if self.state != TowerState::Stable || stack_len < 2 {
            return false;
        }
        self.state = TowerState::Wobbling {
            recover: Countdown::new(recover_ms),
        };
        true
    }

    /// Enter `Falling`. Returns `false` if already falling or over.
    pub fn begin_fall(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = TowerState::Falling;
        true
    }

    /// Advance the wobble timer. Returns `true` on the tick the tower
    /// recovers back to `Stable`.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if let TowerState::Wobbling { recover } = &mut self.state {
            if recover.advance(dt_ms) {
                self.state = TowerState::Stable;
                return true;
            }
        }
        false
    }

    /// `Falling -> GameOver`. Returns `true` exactly once.
    pub fn finish(&mut self) -> bool {
        if self.state != TowerState::Falling {
            return false;
        }
        self.state = TowerState::GameOver;
        true
    }

    /// Jump straight to `GameOver` from any live state.
    pub fn abandon(&mut self) -> bool {
        if self.state == TowerState::GameOver {
            return false;
        }
        self.state = TowerState::GameOver;
        true
    }
}

// ---------------------------------------------------------------------------
// Impulses
// ---------------------------------------------------------------------------

/// A kick to apply to one stack member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kick {
    /// Linear impulse (already multiplied by mass).
    pub impulse: (f64, f64),
    /// Angular velocity to set, if any.
    pub spin: Option<f64>,
}

fn random_sign<R: Rng>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

/// Gentle sideways shove plus a slight lift, stronger higher up the stack.
pub fn wobble_kick<R: Rng>(index: usize, mass: f64, tuning: &Tuning, rng: &mut R) -> Kick {
    let strength = tuning.wobble_base + tuning.wobble_per_index * index as f64;
    let dvx = random_sign(rng) * rng.gen_range(0.5..=1.0) * strength;
    Kick {
        impulse: (dvx * mass, -tuning.wobble_lift * mass),
        spin: None,
    }
}

/// Collapse shove with a random spin. `multiplier` is `1.0` for an ordinary
/// fall and `push_multiplier` for the boss push.
pub fn fall_kick<R: Rng>(
    index: usize,
    mass: f64,
    multiplier: f64,
    tuning: &Tuning,
    rng: &mut R,
) -> Kick {
    let strength = (tuning.fall_base + tuning.fall_per_index * index as f64) * multiplier;
    let dvx = random_sign(rng) * rng.gen_range(0.5..=1.0) * strength;
    let spin = rng.gen_range(-tuning.fall_max_spin..=tuning.fall_max_spin);
    Kick {
        impulse: (dvx * mass, 0.0),
        spin: Some(spin),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
