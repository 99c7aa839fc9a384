//! Boss antagonist.
//!
//! Once the tower is tall enough on the top tier, the boss walks in from the
//! left edge along the ground toward the base block, shakes the tower for a
//! moment, then shoves it over. It is purely scripted; the boss has no
//! physics body.

use serde::{Deserialize, Serialize};

use crate::clock::Countdown;
use crate::config::Tuning;

/// Half-height of the boss sprite, used to stand it on the ground.
const BOSS_HALF_HEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    Approach,
    Warn { timer: Countdown },
    Push,
    Done,
}

/// What the session must do in response to a boss update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossCue {
    /// Reached the base; warning started.
    Arrived,
    /// Shake the tower this tick.
    Shake,
    /// Shove every block and bring the tower down.
    Push,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    /// Centre, in screen pixels. `y` follows forward scrolls.
    pub x: f64,
    pub y: f64,
    /// `1.0` facing right, `-1.0` facing left.
    pub facing: f64,
    pub phase: BossPhase,
}

impl Boss {
    /// Spawn off-screen left, standing on the ground whose centre is `ground_y`.
    pub fn spawn(ground_y: f64, tuning: &Tuning) -> Self {
        Self {
            x: -2.0 * BOSS_HALF_HEIGHT,
            y: ground_y - tuning.ground_half_height - BOSS_HALF_HEIGHT,
            facing: 1.0,
            phase: BossPhase::Approach,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            BossPhase::Approach => "approach",
            BossPhase::Warn { .. } => "warn",
            BossPhase::Push => "push",
            BossPhase::Done => "done",
        }
    }

    pub fn translate(&mut self, dy: f64) {
        self.y += dy;
    }

    /// Advance one tick toward `target_x` (the base block's x).
    pub fn update(&mut self, dt_ms: f64, target_x: Option<f64>, tuning: &Tuning) -> Option<BossCue> {
        match &mut self.phase {
            BossPhase::Approach => {
                let target_x = target_x?;
                let dx = target_x - self.x;
                if dx.abs() <= tuning.boss_tolerance {
                    self.phase = BossPhase::Warn {
                        timer: Countdown::new(tuning.boss_warn_ms),
                    };
                    tracing::info!(x = self.x, "boss reached the tower");
                    return Some(BossCue::Arrived);
                }
                self.facing = dx.signum();
                let stride = (tuning.boss_speed * dt_ms / 1000.0).min(dx.abs());
                self.x += self.facing * stride;
                None
            }
            BossPhase::Warn { timer } => {
                if timer.advance(dt_ms) {
                    self.phase = BossPhase::Push;
                }
                Some(BossCue::Shake)
            }
            BossPhase::Push => {
                self.phase = BossPhase::Done;
                Some(BossCue::Push)
            }
            BossPhase::Done => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TICK_MS: f64 = 1000.0 / 60.0;

    #[test]
    fn spawns_off_screen_on_the_ground() {
        let tuning = Tuning::default();
        let boss = Boss::spawn(710.0, &tuning);
        assert!(boss.x < 0.0);
        assert_eq!(boss.y, 670.0);
        assert_eq!(boss.phase_name(), "approach");
    }

    #[test]
    fn walks_at_constant_speed() {
        let tuning = Tuning::default();
        let mut boss = Boss::spawn(710.0, &tuning);
        let start = boss.x;
        for _ in 0..60 {
            assert_eq!(boss.update(TICK_MS, Some(240.0), &tuning), None);
        }
        assert!((boss.x - start - tuning.boss_speed).abs() < 1e-9);
        assert_eq!(boss.facing, 1.0);
    }

    #[test]
    fn full_sequence_pushes_once() {
        let tuning = Tuning::default();
        let mut boss = Boss::spawn(710.0, &tuning);
        let mut cues = Vec::new();
        for _ in 0..(60 * 10) {
            if let Some(cue) = boss.update(TICK_MS, Some(240.0), &tuning) {
                cues.push(cue);
            }
        }
        assert_eq!(boss.phase, BossPhase::Done);
        assert_eq!(cues.first(), Some(&BossCue::Arrived));
        assert_eq!(cues.last(), Some(&BossCue::Push));
        assert_eq!(cues.iter().filter(|c| **c == BossCue::Push).count(), 1);
        // 500 ms of shaking at 60 Hz.
        assert_eq!(cues.iter().filter(|c| **c == BossCue::Shake).count(), 30);
        assert!((boss.x - 240.0).abs() <= tuning.boss_tolerance);
    }

    #[test]
    fn waits_without_a_target() {
        let tuning = Tuning::default();
        let mut boss = Boss::spawn(710.0, &tuning);
        let start = boss.x;
        assert_eq!(boss.update(TICK_MS, None, &tuning), None);
        assert_eq!(boss.x, start);
    }

    #[test]
    fn turns_around_when_past_the_target() {
        let tuning = Tuning::default();
        let mut boss = Boss::spawn(710.0, &tuning);
        boss.x = 400.0;
        boss.update(TICK_MS, Some(240.0), &tuning);
        assert_eq!(boss.facing, -1.0);
        assert!(boss.x < 400.0);
    }
}
