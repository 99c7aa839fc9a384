//! Per-frame render snapshot and the determinism hash.
//!
//! [`FrameSnapshot`] is everything a renderer needs to draw one frame: every
//! body with its role and extents, the rope segment, the boss, the orb, the
//! mascot and the HUD numbers. It is plain serde data, so a host in another
//! process (or a browser through JSON) can consume it directly.
//!
//! The same data doubles as the determinism fingerprint. [`hash_frame`]
//! feeds its JSON form plus the tick counter through BLAKE3; two sessions
//! with the same seed and the same inputs produce identical digests.

use monkey_physics::{BodyId, BodyRole, Shape};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub role: BodyRole,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub shape: Shape,
    pub is_static: bool,
}

/// Straight segment from the anchor to the hanging block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RopeSnapshot {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub x: f64,
    pub y: f64,
    pub facing: f64,
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub score: u32,
    pub high_score: u32,
    pub tower_state: String,
    pub scroll_offset: f64,
    /// Sorted by id.
    pub bodies: Vec<BodySnapshot>,
    pub rope: Option<RopeSnapshot>,
    pub boss: Option<BossSnapshot>,
    pub orb: Option<(f64, f64)>,
    pub mascot: (f64, f64),
    pub shield_active: bool,
    pub shield_charges: u32,
    pub slow_motion: bool,
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest (64 lowercase hex chars) of a frame and tick counter.
pub fn hash_frame(frame: &FrameSnapshot, tick_counter: u64) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        frame: &'a FrameSnapshot,
        tick_counter: u64,
    }

    let mut hasher = blake3::Hasher::new();
    let state = HashableState {
        frame,
        tick_counter,
    };
    if let Err(e) = serde_json::to_writer(&mut hasher, &state) {
        tracing::warn!(error = %e, tick_counter, "frame could not be serialized for hashing");
    }
    hasher.finalize().to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
