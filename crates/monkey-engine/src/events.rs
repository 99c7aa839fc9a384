//! Outbound notifications for the presentation layer.
//!
//! The core never plays sounds or spawns particles itself. Each tick returns
//! the events that happened during it, in the order they happened, and the
//! host maps them to audio, particles and UI.

use monkey_physics::BodyId;
use serde::{Deserialize, Serialize};

use crate::placement::Rejection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new block is hanging from the rope.
    BlockSpawned { body: BodyId },
    /// The player released the current block.
    BlockDropped { body: BodyId },
    /// A drop landed. `x`/`y` is where to burst particles.
    BlockPlaced { body: BodyId, x: f64, y: f64, stack_len: usize },
    /// A drop missed.
    PlacementRejected { body: BodyId, reason: Rejection },
    ScoreChanged { score: u32 },
    /// The running score passed the high score loaded at session start.
    RecordBeaten { score: u32, previous: u32 },
    /// The mascot should climb to this position.
    MascotMoved { x: f64, y: f64 },
    ScrollStarted { amount: f64 },
    CollapseScrollStarted { amount: f64 },
    WobbleStarted,
    WobbleRecovered,
    /// Collapse began; play the failure sound.
    FailSound,
    GameOver { score: u32 },
    RockThrown { body: BodyId, target: BodyId },
    RockHit { rock: BodyId, block: BodyId },
    /// Shield absorbed a rock.
    RockDeflected { rock: BodyId },
    ShieldActivated,
    ShieldExpired,
    PowerUpSpawned { x: f64, y: f64 },
    PowerUpCollected,
    SlowMotionEnded,
    BossAppeared,
    BossArrived,
    BossPushed,
}
