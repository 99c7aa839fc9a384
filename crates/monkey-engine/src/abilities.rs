//! Player abilities: the shield and the slow-motion power-up.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Countdown;
use crate::config::{ShieldGate, Tuning};

// ---------------------------------------------------------------------------
// Shield
// ---------------------------------------------------------------------------

/// Why [`Shield::activate`] refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldDenied {
    Unavailable,
    AlreadyActive,
    NotCharged { have: u32, need: u32 },
    CoolingDown,
}

/// While active, rocks bounce off harmlessly and never start a wobble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    gate: ShieldGate,
    duration_ms: f64,
    charges: u32,
    active: Option<Countdown>,
    cooldown: Option<Countdown>,
}

impl Shield {
    pub fn new(gate: ShieldGate, duration_ms: f64) -> Self {
        Self {
            gate,
            duration_ms,
            charges: 0,
            active: None,
            cooldown: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn remaining_ms(&self) -> f64 {
        self.active.map_or(0.0, |t| t.remaining_ms())
    }

    pub fn cooldown_remaining_ms(&self) -> f64 {
        self.cooldown.map_or(0.0, |t| t.remaining_ms())
    }

    /// Charge-gated shields earn one charge per placed block.
    pub fn on_block_placed(&mut self) {
        if let ShieldGate::Charge { required } = self.gate {
            self.charges = (self.charges + 1).min(required);
        }
    }

    pub fn can_activate(&self) -> Result<(), ShieldDenied> {
        if self.active.is_some() {
            return Err(ShieldDenied::AlreadyActive);
        }
        match self.gate {
            ShieldGate::Disabled => Err(ShieldDenied::Unavailable),
            ShieldGate::Charge { required } if self.charges < required => {
                Err(ShieldDenied::NotCharged {
                    have: self.charges,
                    need: required,
                })
            }
            ShieldGate::Cooldown { .. } if self.cooldown.is_some() => Err(ShieldDenied::CoolingDown),
            _ => Ok(()),
        }
    }

    /// Raise the shield, spending charges or starting the cooldown.
    pub fn activate(&mut self) -> Result<(), ShieldDenied> {
        self.can_activate()?;
        match self.gate {
            ShieldGate::Charge { required } => self.charges -= required,
            ShieldGate::Cooldown { cooldown_ms } => self.cooldown = Some(Countdown::new(cooldown_ms)),
            ShieldGate::Disabled => {}
        }
        self.active = Some(Countdown::new(self.duration_ms));
        Ok(())
    }

    /// Advance timers. Returns `true` on the tick the shield drops.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if let Some(cooldown) = &mut self.cooldown {
            if cooldown.advance(dt_ms) {
                self.cooldown = None;
            }
        }
        if let Some(active) = &mut self.active {
            if active.advance(dt_ms) {
                self.active = None;
                return true;
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Slow-motion power-up
// ---------------------------------------------------------------------------

/// What happened to the power-up this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerUpChange {
    Spawned { x: f64, y: f64 },
    Collected,
    Expired,
}

/// Orb spawner plus the slow-motion effect it grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    spawn_timer: Countdown,
    orb: Option<(f64, f64)>,
    slow_motion: Option<Countdown>,
}

impl PowerUp {
    pub fn new<R: Rng>(tuning: &Tuning, rng: &mut R) -> Self {
        Self {
            spawn_timer: Countdown::new(Self::next_delay(tuning, rng)),
            orb: None,
            slow_motion: None,
        }
    }

    fn next_delay<R: Rng>(tuning: &Tuning, rng: &mut R) -> f64 {
        if tuning.power_up_max_delay_ms > tuning.power_up_min_delay_ms {
            rng.gen_range(tuning.power_up_min_delay_ms..tuning.power_up_max_delay_ms)
        } else {
            tuning.power_up_min_delay_ms
        }
    }

    pub fn orb(&self) -> Option<(f64, f64)> {
        self.orb
    }

    pub fn slow_motion_active(&self) -> bool {
        self.slow_motion.is_some()
    }

    /// Multiplier applied to the swing speed.
    pub fn speed_factor(&self, tuning: &Tuning) -> f64 {
        if self.slow_motion.is_some() {
            tuning.slow_motion_factor
        } else {
            1.0
        }
    }

    /// Run the spawn timer. A new orb appears only when none is showing.
    pub fn advance_spawn<R: Rng>(
        &mut self,
        dt_ms: f64,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Option<PowerUpChange> {
        if !self.spawn_timer.advance(dt_ms) {
            return None;
        }
        self.spawn_timer = Countdown::new(Self::next_delay(tuning, rng));
        if self.orb.is_some() {
            return None;
        }
        let margin = 50.0;
        let x = rng.gen_range(margin..(tuning.world_width - margin).max(margin + 1.0));
        let y = rng.gen_range(margin..tuning.world_height / 2.0 + margin);
        self.orb = Some((x, y));
        Some(PowerUpChange::Spawned { x, y })
    }

    /// Collect the orb if `block` is within the pickup radius.
    pub fn try_collect(&mut self, block: (f64, f64), tuning: &Tuning) -> Option<PowerUpChange> {
        let (ox, oy) = self.orb?;
        let (dx, dy) = (block.0 - ox, block.1 - oy);
        if (dx * dx + dy * dy).sqrt() >= tuning.power_up_radius {
            return None;
        }
        self.orb = None;
        self.slow_motion = Some(Countdown::new(tuning.slow_motion_ms));
        Some(PowerUpChange::Collected)
    }

    /// Run the slow-motion timer.
    pub fn advance_effect(&mut self, dt_ms: f64) -> Option<PowerUpChange> {
        let timer = self.slow_motion.as_mut()?;
        if timer.advance(dt_ms) {
            self.slow_motion = None;
            return Some(PowerUpChange::Expired);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const TICK_MS: f64 = 1000.0 / 60.0;

    #[test]
    fn disabled_shield_never_activates() {
        let mut shield = Shield::new(ShieldGate::Disabled, 5000.0);
        shield.on_block_placed();
        assert_eq!(shield.activate(), Err(ShieldDenied::Unavailable));
    }

    #[test]
    fn charge_gate_needs_five_blocks() {
        let mut shield = Shield::new(ShieldGate::Charge { required: 5 }, 5000.0);
        for _ in 0..4 {
            shield.on_block_placed();
        }
        assert_eq!(
            shield.activate(),
            Err(ShieldDenied::NotCharged { have: 4, need: 5 })
        );
        shield.on_block_placed();
        shield.on_block_placed();
        assert_eq!(shield.charges(), 5, "charges are capped");
        assert_eq!(shield.activate(), Ok(()));
        assert!(shield.is_active());
        assert_eq!(shield.charges(), 0);
        assert_eq!(shield.activate(), Err(ShieldDenied::AlreadyActive));
    }

    #[test]
    fn shield_lasts_five_seconds() {
        let mut shield = Shield::new(ShieldGate::Cooldown { cooldown_ms: 15_000.0 }, 5000.0);
        shield.activate().unwrap();
        let dropped_at = (1..=400).find(|_| shield.advance(TICK_MS));
        assert_eq!(dropped_at, Some(300));
        assert!(!shield.is_active());
    }

    #[test]
    fn cooldown_gate_blocks_reuse() {
        let mut shield = Shield::new(ShieldGate::Cooldown { cooldown_ms: 15_000.0 }, 5000.0);
        shield.activate().unwrap();
        for _ in 0..600 {
            shield.advance(TICK_MS);
        }
        // 10 s in: shield is down but still cooling.
        assert!(!shield.is_active());
        assert_eq!(shield.activate(), Err(ShieldDenied::CoolingDown));
        for _ in 0..300 {
            shield.advance(TICK_MS);
        }
        assert_eq!(shield.activate(), Ok(()));
    }

    #[test]
    fn orb_spawns_within_window_and_bounds() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut power = PowerUp::new(&tuning, &mut rng);
        let mut spawned_at = None;
        for tick in 1..=(60 * 21) {
            if let Some(PowerUpChange::Spawned { x, y }) =
                power.advance_spawn(TICK_MS, &tuning, &mut rng)
            {
                spawned_at = Some(tick);
                assert!((50.0..430.0).contains(&x));
                assert!((50.0..410.0).contains(&y));
                break;
            }
        }
        let tick = spawned_at.expect("orb should appear within 20 s");
        assert!(tick >= 600);
        assert!(power.orb().is_some());
    }

    #[test]
    fn only_one_orb_at_a_time() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut power = PowerUp::new(&tuning, &mut rng);
        let spawns = (0..(60 * 60))
            .filter_map(|_| power.advance_spawn(TICK_MS, &tuning, &mut rng))
            .count();
        assert_eq!(spawns, 1);
    }

    #[test]
    fn collecting_halves_speed_then_expires() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut power = PowerUp::new(&tuning, &mut rng);
        power.orb = Some((200.0, 200.0));

        assert_eq!(power.try_collect((300.0, 200.0), &tuning), None);
        assert_eq!(
            power.try_collect((230.0, 220.0), &tuning),
            Some(PowerUpChange::Collected)
        );
        assert!(power.orb().is_none());
        assert_eq!(power.speed_factor(&tuning), 0.5);

        let expired_at = (1..=400).find(|_| power.advance_effect(TICK_MS).is_some());
        assert_eq!(expired_at, Some(300));
        assert_eq!(power.speed_factor(&tuning), 1.0);
    }
}
