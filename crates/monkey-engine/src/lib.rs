//! Monkey Engine -- gameplay core for a block-stacking arcade game.
//!
//! The player drops blocks swinging from a rope onto a growing tower. This
//! crate is the per-frame state machine that sits between the host (input,
//! rendering, audio) and the rigid-body simulation in [`monkey_physics`]:
//! rope swing, placement rules, world scrolling, tower collapse, hazards, the
//! boss, shield and power-up timers, scoring and score records.
//!
//! Everything runs on a fixed-timestep virtual clock and a seeded PRNG, so a
//! session is reproducible: the same seed and the same inputs on the same
//! ticks give the same [`GameSession::state_hash`](session::GameSession::state_hash).
//!
//! # Quick Start
//!
//! ```
//! use monkey_engine::prelude::*;
//!
//! let options = SessionOptions::for_level(Level::from_query("?level=2").unwrap()).with_seed(7);
//! let mut session = GameSession::with_memory_store(options);
//!
//! for tick in 0..600 {
//!     if tick % 60 == 30 {
//!         session.request_drop();
//!     }
//!     for event in session.tick() {
//!         if let GameEvent::GameOver { score } = event {
//!             println!("game over with {score} points");
//!         }
//!     }
//! }
//! assert_eq!(session.tick_count(), 600);
//! ```

#![deny(unsafe_code)]

pub mod abilities;
pub mod boss;
pub mod camera;
pub mod clock;
pub mod collapse;
pub mod config;
pub mod events;
pub mod hazards;
pub mod placement;
pub mod records;
pub mod session;
pub mod snapshot;
pub mod swing;

/// Re-export the physics adapter for convenience.
pub use monkey_physics;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors at the crate's fallible boundaries: level selection, config
/// loading and score persistence. Gameplay failures are state transitions,
/// never errors.
#[derive(Debug, thiserror::Error)]
pub enum TowerError {
    /// The `level` parameter is not a number.
    #[error("invalid level '{0}', expected 1, 2 or 3")]
    InvalidLevel(String),

    /// The level number is outside 1-3.
    #[error("level {0} out of range, expected 1, 2 or 3")]
    LevelOutOfRange(u32),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::abilities::{PowerUp, Shield, ShieldDenied};
    pub use crate::boss::{Boss, BossPhase};
    pub use crate::camera::{CameraController, ScrollKind};
    pub use crate::clock::{Countdown, TickConfig, VirtualClock};
    pub use crate::collapse::TowerState;
    pub use crate::config::{Level, LevelConfig, ShieldGate, Tuning};
    pub use crate::events::GameEvent;
    pub use crate::placement::{evaluate_placement, Placement, Rejection, Stack};
    pub use crate::records::{JsonFileStore, MemoryStore, RecordStore, ScoreBoard, ScoreRecord};
    pub use crate::session::{GameSession, SessionOptions};
    pub use crate::snapshot::FrameSnapshot;
    pub use crate::swing::{HangingBlock, SwingState};
    pub use crate::TowerError;

    pub use monkey_physics::{BodyId, BodyRole, Bounds};
}
