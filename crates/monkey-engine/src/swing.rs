//! Hanging-block controller.
//!
//! The current block hangs from a rigid rope under the anchor and swings back
//! and forth. The swing is kinematic: each tick the angle advances by the
//! current speed, the block is placed directly at
//! `anchor + (sin(angle), cos(angle)) * rope_length`, and its velocity is
//! zeroed so gravity never accumulates. Dropping the block destroys the rope,
//! after which [`HangingBlock::update`] does nothing.

use monkey_physics::{BodyDesc, BodyId, PhysicsWorld, RopeId};
use serde::{Deserialize, Serialize};

use crate::config::{LevelConfig, Tuning};

/// Pure angle/direction state of the pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingState {
    pub angle: f64,
    /// `1.0` or `-1.0`.
    pub direction: f64,
    pub bound: f64,
}

impl SwingState {
    pub fn new(start_angle: f64, bound: f64) -> Self {
        Self {
            angle: start_angle.clamp(-bound, bound),
            direction: 1.0,
            bound,
        }
    }

    /// Advance by one tick at `speed` radians per tick.
    ///
    /// The angle is clamped to `[-bound, bound]` and the direction flips on
    /// reaching either end.
    pub fn advance(&mut self, speed: f64) {
        self.angle = (self.angle + self.direction * speed).clamp(-self.bound, self.bound);
        if self.angle >= self.bound {
            self.direction = -1.0;
        } else if self.angle <= -self.bound {
            self.direction = 1.0;
        }
    }

    /// Offset of the block centre from the anchor for a rope of `length`.
    pub fn offset(&self, length: f64) -> (f64, f64) {
        (self.angle.sin() * length, self.angle.cos() * length)
    }
}

/// The single block currently swinging (or falling after release).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangingBlock {
    pub body: BodyId,
    /// `None` once dropped.
    pub rope: Option<RopeId>,
    pub rope_length: f64,
    pub swing: SwingState,
    /// Spin while swinging (late-game escalation).
    pub spins: bool,
}

impl HangingBlock {
    /// Create the body, tie it to `anchor`, and pose it at the start angle.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        physics: &mut PhysicsWorld,
        anchor: BodyId,
        anchor_pos: (f64, f64),
        tuning: &Tuning,
        level: &LevelConfig,
        stack_size: usize,
        score: u32,
        scroll_offset: f64,
    ) -> Self {
        let rope_length = level.rope.length_at(score);
        let half = tuning.block_half_size;
        let body = physics.spawn(&BodyDesc::block(
            anchor_pos.0 + tuning.spawn_offset_x,
            rope_length + tuning.spawn_offset_y + scroll_offset,
            half,
            half,
        ));
        let rope = physics.attach_rope(anchor, body, rope_length);

        let swing = SwingState::new(tuning.start_angle, tuning.swing_bound);
        let (dx, dy) = swing.offset(rope_length);
        physics.set_position(body, anchor_pos.0 + dx, anchor_pos.1 + dy);

        let spins = stack_size >= tuning.spin_after_blocks;
        tracing::debug!(%body, rope_length, spins, "spawned hanging block");

        Self {
            body,
            rope,
            rope_length,
            swing,
            spins,
        }
    }

    pub fn is_hanging(&self) -> bool {
        self.rope.is_some()
    }

    /// One swing tick. No-op once the rope is gone.
    pub fn update(
        &mut self,
        physics: &mut PhysicsWorld,
        anchor_pos: (f64, f64),
        speed: f64,
        spin_angvel: f64,
    ) {
        if self.rope.is_none() {
            return;
        }
        self.swing.advance(speed);
        let (dx, dy) = self.swing.offset(self.rope_length);
        physics.set_position(self.body, anchor_pos.0 + dx, anchor_pos.1 + dy);
        physics.set_linvel(self.body, 0.0, 0.0);
        let angvel = if self.spins {
            spin_angvel * self.swing.direction
        } else {
            0.0
        };
        physics.set_angvel(self.body, angvel);
    }

    /// Cut the rope. Keeps only the vertical component of velocity.
    ///
    /// Returns `false` if the block was already released.
    pub fn release(&mut self, physics: &mut PhysicsWorld) -> bool {
        let Some(rope) = self.rope.take() else {
            return false;
        };
        physics.detach_rope(rope);
        if let Some((_, vy)) = physics.velocity(self.body) {
            physics.set_linvel(self.body, 0.0, vy);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Level;

    #[test]
    fn swing_flips_at_bound() {
        let mut swing = SwingState::new(0.5, 0.8);
        let mut flipped = false;
        for _ in 0..100 {
            swing.advance(0.01);
            if swing.direction < 0.0 {
                flipped = true;
                break;
            }
        }
        assert!(flipped);
        assert!((swing.angle - 0.8).abs() < 1e-12);
    }

    #[test]
    fn swing_never_leaves_bound_with_large_steps() {
        let mut swing = SwingState::new(0.5, 0.8);
        for _ in 0..1000 {
            swing.advance(0.37);
            assert!(swing.angle.abs() <= 0.8);
        }
    }

    #[test]
    fn offset_points_below_anchor() {
        let swing = SwingState::new(0.0, 0.8);
        let (dx, dy) = swing.offset(120.0);
        assert!(dx.abs() < 1e-12);
        assert!((dy - 120.0).abs() < 1e-12);
    }

    fn world_with_anchor(tuning: &Tuning) -> (PhysicsWorld, BodyId) {
        let mut physics = PhysicsWorld::new(0.0, tuning.gravity);
        let (ax, ay) = tuning.anchor();
        let anchor = physics.spawn(&BodyDesc::anchor(ax, ay));
        (physics, anchor)
    }

    #[test]
    fn spawn_poses_block_on_start_angle() {
        let tuning = Tuning::default();
        let level = LevelConfig::for_level(Level::One);
        let (mut physics, anchor) = world_with_anchor(&tuning);
        let anchor_pos = tuning.anchor();

        let block =
            HangingBlock::spawn(&mut physics, anchor, anchor_pos, &tuning, &level, 0, 0, 0.0);
        assert!(block.is_hanging());
        assert!(!block.spins);
        assert_eq!(physics.rope_count(), 1);

        let t = physics.transform(block.body).unwrap();
        let expected_x = anchor_pos.0 + 0.5_f64.sin() * 120.0;
        let expected_y = anchor_pos.1 + 0.5_f64.cos() * 120.0;
        assert!((t.x - expected_x).abs() < 1e-3);
        assert!((t.y - expected_y).abs() < 1e-3);
    }

    #[test]
    fn rope_shortens_with_score_on_harder_tiers() {
        let tuning = Tuning::default();
        let level = LevelConfig::for_level(Level::Two);
        let (mut physics, anchor) = world_with_anchor(&tuning);
        let block = HangingBlock::spawn(
            &mut physics,
            anchor,
            tuning.anchor(),
            &tuning,
            &level,
            0,
            15,
            0.0,
        );
        assert_eq!(block.rope_length, 90.0);
    }

    #[test]
    fn spin_starts_after_threshold() {
        let tuning = Tuning::default();
        let level = LevelConfig::default();
        let (mut physics, anchor) = world_with_anchor(&tuning);
        let mut block = HangingBlock::spawn(
            &mut physics,
            anchor,
            tuning.anchor(),
            &tuning,
            &level,
            tuning.spin_after_blocks,
            0,
            0.0,
        );
        assert!(block.spins);
        block.update(&mut physics, tuning.anchor(), 0.008, tuning.spin_angvel);
        let angvel = physics.angular_velocity(block.body).unwrap();
        assert!((angvel - tuning.spin_angvel).abs() < 1e-3);
    }

    #[test]
    fn update_is_kinematic_and_zeroes_velocity() {
        let tuning = Tuning::default();
        let level = LevelConfig::default();
        let (mut physics, anchor) = world_with_anchor(&tuning);
        let mut block =
            HangingBlock::spawn(&mut physics, anchor, tuning.anchor(), &tuning, &level, 0, 0, 0.0);
        physics.set_linvel(block.body, 500.0, 500.0);
        block.update(&mut physics, tuning.anchor(), 0.008, tuning.spin_angvel);
        assert_eq!(physics.velocity(block.body), Some((0.0, 0.0)));
        assert!((block.swing.angle - 0.508).abs() < 1e-12);
    }

    #[test]
    fn released_block_ignores_updates() {
        let tuning = Tuning::default();
        let level = LevelConfig::default();
        let (mut physics, anchor) = world_with_anchor(&tuning);
        let mut block =
            HangingBlock::spawn(&mut physics, anchor, tuning.anchor(), &tuning, &level, 0, 0, 0.0);
        assert!(block.release(&mut physics));
        assert!(!block.release(&mut physics));
        assert_eq!(physics.rope_count(), 0);

        let angle = block.swing.angle;
        block.update(&mut physics, tuning.anchor(), 0.008, tuning.spin_angvel);
        assert_eq!(block.swing.angle, angle);
    }
}
