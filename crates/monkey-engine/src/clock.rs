//! Fixed-timestep virtual clock and countdown timers.
//!
//! Every delayed behaviour in the game (settle delay, wobble recovery, boss
//! warning, shield expiry, rock lifetimes, ...) is a [`Countdown`] owned by
//! the state machine that needs it and advanced by the session tick. Nothing
//! reads wall-clock time, so a test can drive minutes of gameplay in a loop
//! and get the same result every run.
//!
//! ```
//! use monkey_engine::clock::{Countdown, TickConfig, VirtualClock};
//!
//! let mut clock = VirtualClock::new(TickConfig::default());
//! let mut timer = Countdown::new(100.0);
//! let mut fired = 0;
//! for _ in 0..10 {
//!     clock.advance();
//!     if timer.advance(clock.tick_ms()) {
//!         fired += 1;
//!     }
//! }
//! assert_eq!(fired, 1);
//! assert_eq!(clock.tick_count(), 10);
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// VirtualClock
// ---------------------------------------------------------------------------

/// Tick counter plus derived simulation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualClock {
    tick_counter: u64,
    fixed_dt: f64,
}

impl VirtualClock {
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
        }
    }

    pub fn advance(&mut self) {
        self.tick_counter += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Milliseconds per tick.
    pub fn tick_ms(&self) -> f64 {
        self.fixed_dt * 1000.0
    }

    /// Simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid drift from repeated
    /// addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A one-shot timer measured in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining_ms: f64,
    finished: bool,
}

impl Countdown {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            remaining_ms: duration_ms.max(0.0),
            finished: false,
        }
    }

    /// Advance by `dt_ms`. Returns `true` exactly once, on the call that
    /// crosses zero.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if self.finished {
            return false;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= 1e-9 {
            self.remaining_ms = 0.0;
            self.finished = true;
            return true;
        }
        false
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
