//! Placement decision and the placed stack.
//!
//! [`evaluate_placement`] is a pure function over body bounds: given the
//! dropped block, the current top of the stack and the ground's centre line it
//! decides whether the drop lands. No randomness and no physics queries happen
//! here, so the same transforms always yield the same verdict.
//!
//! ```
//! use monkey_engine::config::Tuning;
//! use monkey_engine::placement::{evaluate_placement, Placement, Rejection};
//! use monkey_physics::Bounds;
//!
//! let tuning = Tuning::default();
//! let top = Bounds::centered(100.0, 600.0, 25.0, 25.0);
//! let aligned = Bounds::centered(105.0, 550.0, 25.0, 25.0);
//! let off = Bounds::centered(200.0, 550.0, 25.0, 25.0);
//!
//! assert_eq!(evaluate_placement(&aligned, Some(&top), 710.0, &tuning), Placement::Accepted);
//! assert_eq!(
//!     evaluate_placement(&off, Some(&top), 710.0, &tuning),
//!     Placement::Rejected(Rejection::Misaligned)
//! );
//! ```

use monkey_physics::{BodyId, Bounds};
use serde::{Deserialize, Serialize};

use crate::config::Tuning;

// ---------------------------------------------------------------------------
// Placement decision
// ---------------------------------------------------------------------------

/// Why a drop did not land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// The block reached the ground band.
    HitGround,
    /// Horizontal overlap below the minimum ratio.
    Misaligned,
    /// Centres too far apart vertically.
    TooFar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Accepted,
    Rejected(Rejection),
}

impl Placement {
    pub fn is_accepted(self) -> bool {
        matches!(self, Placement::Accepted)
    }
}

/// Decide whether `dropped` lands on `top`.
///
/// `top` is `None` for an empty stack, in which case the drop always lands.
/// Otherwise a centre at or below `ground_y - ground_contact_margin` is a
/// ground hit regardless of overlap; then the overlap ratio and the vertical
/// gap are checked in that order.
pub fn evaluate_placement(
    dropped: &Bounds,
    top: Option<&Bounds>,
    ground_y: f64,
    tuning: &Tuning,
) -> Placement {
    let Some(top) = top else {
        return Placement::Accepted;
    };

    let dropped_y = (dropped.min_y + dropped.max_y) / 2.0;
    if dropped_y >= ground_y - tuning.ground_contact_margin {
        return Placement::Rejected(Rejection::HitGround);
    }

    let overlap = dropped.horizontal_overlap(top);
    if overlap < tuning.min_overlap_ratio * dropped.width() {
        return Placement::Rejected(Rejection::Misaligned);
    }

    let top_y = (top.min_y + top.max_y) / 2.0;
    if (dropped_y - top_y).abs() >= tuning.max_vertical_gap {
        return Placement::Rejected(Rejection::TooFar);
    }

    Placement::Accepted
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// A placed block and the angle it was frozen at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub body: BodyId,
    pub frozen_angle: f64,
}

/// Placed blocks, bottom to top. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, body: BodyId, frozen_angle: f64) {
        self.entries.push(StackEntry { body, frozen_angle });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn base(&self) -> Option<&StackEntry> {
        self.entries.first()
    }

    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&StackEntry> {
        self.entries.get(index)
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.entries.iter().any(|e| e.body == body)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackEntry> {
        self.entries.iter()
    }

    /// Body ids bottom to top.
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.entries.iter().map(|e| e.body)
    }

    /// Entries in the upper half of the stack (at least the top one).
    pub fn upper_half(&self) -> &[StackEntry] {
        let start = self.entries.len() / 2;
        &self.entries[start..]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
