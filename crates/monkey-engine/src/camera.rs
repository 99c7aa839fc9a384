//! Camera / world scroll controller.
//!
//! The camera never moves; the world does. A scroll is an animation that
//! translates the ground, the stack, the current block and live rocks by a
//! small step every tick. Only one animation may occupy the slot at a time:
//!
//! - a **forward** scroll (camera follow or the periodic step) is rejected
//!   while the slot is busy;
//! - a **collapse** scroll preempts a running forward scroll, so the
//!   game-over that waits on it always fires.
//!
//! The controller only does the bookkeeping. [`CameraController::step`]
//! returns the delta for the current tick and the session applies it to the
//! bodies.

use monkey_physics::BodyId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollKind {
    /// Moves the world down (`+y`), revealing sky above the tower.
    Forward,
    /// Moves everything but the ground up (`-y`) so the falling tower stays in
    /// view.
    Collapse,
}

/// An in-flight scroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollAnimation {
    pub kind: ScrollKind,
    /// Unsigned distance of the whole scroll.
    pub total: f64,
    /// Distance per tick; the last step takes the remainder.
    pub per_step: f64,
    /// Distance covered so far.
    pub moved: f64,
    /// Ticks until the scroll finishes.
    pub steps_left: u32,
    /// Placed block the mascot stays aligned to while this scroll runs.
    pub snap: Option<BodyId>,
}

/// One tick of scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollStep {
    pub kind: ScrollKind,
    /// Unsigned distance for this tick.
    pub delta: f64,
    /// `true` on the final step; the slot is already free.
    pub finished: bool,
    pub snap: Option<BodyId>,
}

impl ScrollStep {
    /// Vertical translation to apply to scrolled bodies.
    pub fn dy(&self) -> f64 {
        match self.kind {
            ScrollKind::Forward => self.delta,
            ScrollKind::Collapse => -self.delta,
        }
    }
}

/// Number of ticks a scroll of `duration_ms` takes.
pub fn scroll_steps(duration_ms: f64, tick_ms: f64) -> u32 {
    if tick_ms <= 0.0 || !duration_ms.is_finite() {
        return 1;
    }
    // Tolerate tick lengths that are not exactly representable.
    ((duration_ms / tick_ms - 1e-9).ceil() as u32).max(1)
}

// ---------------------------------------------------------------------------
// CameraController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraController {
    /// Cumulative world offset (forward positive).
    offset: f64,
    active: Option<ScrollAnimation>,
    follow_enabled: bool,
    /// Cleared when a follow scroll fires; re-armed once the top block is
    /// back below the threshold.
    follow_armed: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            follow_armed: true,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ScrollAnimation> {
        self.active.as_ref()
    }

    pub fn snap_anchor(&self) -> Option<BodyId> {
        self.active.as_ref().and_then(|a| a.snap)
    }

    pub fn follow_enabled(&self) -> bool {
        self.follow_enabled
    }

    /// Start a forward scroll. Returns `false` (and does nothing) while any
    /// animation is running.
    pub fn scroll_world(
        &mut self,
        amount: f64,
        duration_ms: f64,
        tick_ms: f64,
        snap: Option<BodyId>,
    ) -> bool {
        if self.active.is_some() {
            tracing::debug!(amount, "scroll rejected, slot busy");
            return false;
        }
        self.active = Some(Self::animation(
            ScrollKind::Forward,
            amount,
            duration_ms,
            tick_ms,
            snap,
        ));
        true
    }

    /// Start the collapse scroll, replacing any forward scroll in flight.
    ///
    /// Returns `false` if a collapse scroll is already running.
    pub fn collapse_scroll(&mut self, amount: f64, duration_ms: f64, tick_ms: f64) -> bool {
        if let Some(active) = &self.active {
            if active.kind == ScrollKind::Collapse {
                return false;
            }
            tracing::debug!(moved = active.moved, "collapse preempts forward scroll");
        }
        self.active = Some(Self::animation(
            ScrollKind::Collapse,
            amount,
            duration_ms,
            tick_ms,
            None,
        ));
        true
    }

    fn animation(
        kind: ScrollKind,
        amount: f64,
        duration_ms: f64,
        tick_ms: f64,
        snap: Option<BodyId>,
    ) -> ScrollAnimation {
        let steps = scroll_steps(duration_ms, tick_ms);
        let total = amount.max(0.0);
        ScrollAnimation {
            kind,
            total,
            per_step: total / steps as f64,
            moved: 0.0,
            steps_left: steps,
            snap,
        }
    }

    /// Advance the active animation by one tick.
    pub fn step(&mut self) -> Option<ScrollStep> {
        let anim = self.active.as_mut()?;
        anim.steps_left = anim.steps_left.saturating_sub(1);
        let finished = anim.steps_left == 0;
        // The last step takes the exact remainder.
        let delta = if finished {
            anim.total - anim.moved
        } else {
            anim.per_step.min(anim.total - anim.moved)
        };
        anim.moved += delta;

        let step = ScrollStep {
            kind: anim.kind,
            delta,
            finished,
            snap: anim.snap,
        };
        self.offset += step.dy();
        if finished {
            self.active = None;
        }
        Some(step)
    }

    /// Enable follow once the stack is tall enough. Never disables.
    pub fn update_follow(&mut self, stack_len: usize, follow_after_blocks: usize) {
        if !self.follow_enabled && stack_len >= follow_after_blocks {
            self.follow_enabled = true;
            tracing::debug!(stack_len, "camera follow enabled");
        }
    }

    /// Whether a follow scroll should start this tick.
    ///
    /// Fires once per crossing of `threshold_y`: after firing it stays quiet
    /// until the top block is seen at or below the threshold again.
    pub fn check_follow(&mut self, top_y: Option<f64>, threshold_y: f64) -> bool {
        let Some(top_y) = top_y else {
            return false;
        };
        if top_y >= threshold_y {
            self.follow_armed = true;
            return false;
        }
        if !self.follow_enabled || !self.follow_armed || self.is_busy() {
            return false;
        }
        self.follow_armed = false;
        true
    }
}

/// Amount of the periodic scroll after `stack_len` placed blocks, if this
/// placement lands on a period boundary.
pub fn periodic_scroll_amount(stack_len: usize, every: usize, base: f64, growth: f64) -> Option<f64> {
    if every == 0 || stack_len == 0 || stack_len % every != 0 {
        return None;
    }
    let period = (stack_len / every - 1) as f64;
    Some(base + period * growth)
}

/// Collapse scroll distance: bring the lowest block down to the ground band,
/// never less than `min`.
pub fn collapse_amount(ground_y: f64, lowest_y: Option<f64>, margin: f64, min: f64) -> f64 {
    let needed = lowest_y.map_or(0.0, |y| (ground_y - y - margin).max(0.0));
    needed.max(min)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
