//! Level parameterization and gameplay tuning.
//!
//! One engine serves every difficulty tier. A [`LevelConfig`] enumerates what
//! a tier turns on (rocks, boss, shield gating) and how it scales (swing speed
//! and rope length curves). [`Tuning`] holds the numbers shared by all tiers:
//! world geometry, thresholds, durations and impulse strengths.
//!
//! The level itself comes from the host page's query string:
//!
//! ```
//! use monkey_engine::config::{Level, LevelConfig};
//!
//! let level = Level::from_query("?level=3").unwrap();
//! assert_eq!(level, Level::Three);
//! assert!(LevelConfig::for_level(level).boss_enabled);
//! ```

use serde::{Deserialize, Serialize};

use crate::TowerError;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Difficulty tier selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    One,
    Two,
    Three,
}

impl Level {
    /// Parse a level number (1-3).
    pub fn from_number(n: u32) -> Result<Self, TowerError> {
        match n {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            other => Err(TowerError::LevelOutOfRange(other)),
        }
    }

    /// Read the `level` parameter from a URL query string.
    ///
    /// Accepts the string with or without the leading `?`. A missing `level`
    /// parameter selects level 1; a present but malformed one is an error.
    pub fn from_query(query: &str) -> Result<Self, TowerError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let value = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "level")
            .map(|(_, value)| value);

        match value {
            None => Ok(Level::default()),
            Some(raw) => {
                let n = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| TowerError::InvalidLevel(raw.to_owned()))?;
                Self::from_number(n)
            }
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Discrete swing-speed scaling: `base * (1 + floor(score / tier_size) * tier_step)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingCurve {
    /// Radians advanced per tick at score 0.
    pub base_speed: f64,
    /// Multiplier increment per tier.
    pub tier_step: f64,
    /// Points per tier.
    pub tier_size: u32,
}

impl SwingCurve {
    pub fn speed_at(&self, score: u32) -> f64 {
        let tier = score / self.tier_size.max(1);
        self.base_speed * (1.0 + tier as f64 * self.tier_step)
    }
}

/// Rope length shrinking with score: `max(min_length, base - score * shrink)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RopeCurve {
    pub base_length: f64,
    pub shrink_per_point: f64,
    pub min_length: f64,
}

impl RopeCurve {
    pub fn length_at(&self, score: u32) -> f64 {
        (self.base_length - score as f64 * self.shrink_per_point).max(self.min_length)
    }
}

/// How the player earns the right to raise the shield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShieldGate {
    /// No shield on this tier.
    Disabled,
    /// One charge per placed block; `required` charges are spent per use.
    Charge { required: u32 },
    /// Usable again `cooldown_ms` after each activation.
    Cooldown { cooldown_ms: f64 },
}

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// Feature switches and difficulty curves for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: Level,
    pub rocks_enabled: bool,
    pub boss_enabled: bool,
    /// Placed blocks required before the boss walks in.
    pub boss_after_blocks: usize,
    pub shield: ShieldGate,
    pub power_up_enabled: bool,
    pub swing: SwingCurve,
    pub rope: RopeCurve,
}

impl LevelConfig {
    /// Built-in configuration for a tier.
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::One => Self {
                level,
                rocks_enabled: false,
                boss_enabled: false,
                boss_after_blocks: 0,
                shield: ShieldGate::Disabled,
                power_up_enabled: true,
                swing: SwingCurve {
                    base_speed: 0.008,
                    tier_step: 0.3,
                    tier_size: 10,
                },
                rope: RopeCurve {
                    base_length: 120.0,
                    shrink_per_point: 0.0,
                    min_length: 60.0,
                },
            },
            Level::Two => Self {
                level,
                rocks_enabled: true,
                boss_enabled: false,
                boss_after_blocks: 0,
                shield: ShieldGate::Charge { required: 5 },
                power_up_enabled: true,
                swing: SwingCurve {
                    base_speed: 0.009,
                    tier_step: 0.35,
                    tier_size: 10,
                },
                rope: RopeCurve {
                    base_length: 120.0,
                    shrink_per_point: 2.0,
                    min_length: 60.0,
                },
            },
            Level::Three => Self {
                level,
                rocks_enabled: true,
                boss_enabled: true,
                boss_after_blocks: 20,
                shield: ShieldGate::Cooldown {
                    cooldown_ms: 15_000.0,
                },
                power_up_enabled: true,
                swing: SwingCurve {
                    base_speed: 0.01,
                    tier_step: 0.4,
                    tier_size: 10,
                },
                rope: RopeCurve {
                    base_length: 120.0,
                    shrink_per_point: 3.0,
                    min_length: 60.0,
                },
            },
        }
    }

    /// Load a custom tier from JSON.
    pub fn from_json(json: &str) -> Result<Self, TowerError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::for_level(Level::One)
    }
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Numbers shared by every tier. Distances in pixels, times in milliseconds,
/// velocities in pixels per second.
///
/// The defaults hang together: a block released under the anchor reaches the
/// ground within one settle delay, and the camera keeps the top of the tower
/// inside that reach below the rope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    // World geometry.
    pub world_width: f64,
    /// Screen height; the ground slab sits at the bottom edge.
    pub world_height: f64,
    /// Downward acceleration in pixels per second squared.
    pub gravity: f64,
    /// Physics length unit, so contact tolerances scale with the blocks.
    pub pixels_per_meter: f64,
    pub ground_half_height: f64,
    /// Rope anchor height below the top edge.
    pub anchor_y: f64,
    /// Blocks are squares of twice this size.
    pub block_half_size: f64,

    // Hanging block.
    /// Horizontal offset of a fresh block from the anchor before it is posed
    /// on the start angle.
    pub spawn_offset_x: f64,
    /// Added to the rope length for the fresh block's initial height.
    pub spawn_offset_y: f64,
    /// Swing angle a fresh block starts at, in radians.
    pub start_angle: f64,
    /// The swing turns around at `±swing_bound` radians.
    pub swing_bound: f64,
    /// Stack size from which the hanging block also spins.
    pub spin_after_blocks: usize,
    /// Spin rate in radians per second.
    pub spin_angvel: f64,

    // Placement.
    /// Delay between a release and its placement verdict.
    pub settle_delay_ms: f64,
    /// Least horizontal overlap with the top block, as a share of the block
    /// width.
    pub min_overlap_ratio: f64,
    /// Largest accepted distance between the centres of the dropped and top
    /// blocks.
    pub max_vertical_gap: f64,
    /// A centre closer than this to the ground's centre counts as touching it.
    pub ground_contact_margin: f64,

    // Camera.
    /// Stack size that enables camera follow.
    pub follow_after_blocks: usize,
    /// Follow scrolls once the top block's centre rises above this line.
    pub follow_threshold_y: f64,
    pub follow_amount: f64,
    /// Duration of every forward scroll.
    pub scroll_duration_ms: f64,
    /// A periodic scroll runs on every `periodic_every`-th placement.
    pub periodic_every: usize,
    /// First periodic scroll distance; each later one adds `periodic_growth`.
    pub periodic_amount: f64,
    pub periodic_growth: f64,
    pub collapse_scroll_ms: f64,
    /// Shortest collapse scroll.
    pub collapse_scroll_min: f64,
    /// The collapse scroll brings the lowest block to this far above the
    /// ground's centre.
    pub collapse_ground_margin: f64,

    // Wobble / fall.
    /// How long a wobbling tower stays loose before it refreezes.
    pub wobble_recover_ms: f64,
    /// Sideways wobble speed for the base; each block above adds
    /// `wobble_per_index`.
    pub wobble_base: f64,
    pub wobble_per_index: f64,
    /// Upward speed added to every wobbling block.
    pub wobble_lift: f64,
    /// Sideways collapse speed for the base; each block above adds
    /// `fall_per_index`.
    pub fall_base: f64,
    pub fall_per_index: f64,
    /// Collapse spin is drawn from `±fall_max_spin` radians per second.
    pub fall_max_spin: f64,
    /// Collapse strength multiplier for the boss push.
    pub push_multiplier: f64,
    /// Rotation away from the placed angle, in radians, that topples the
    /// tower.
    pub tilt_limit: f64,

    // Rocks.
    pub rock_interval_ms: f64,
    /// Rocks only fly at stacks at least this tall.
    pub rock_min_stack: usize,
    pub rock_lifetime_ms: f64,
    pub rock_speed: f64,
    /// Share of the aimed vertical velocity a rock keeps.
    pub rock_vertical_damping: f64,
    pub rock_radius: f64,

    // Boss.
    pub boss_speed: f64,
    /// The boss stops this close to the base.
    pub boss_tolerance: f64,
    /// Shaking time between arrival and the push.
    pub boss_warn_ms: f64,

    // Abilities.
    pub shield_duration_ms: f64,
    /// The orb appears at a random time in this window.
    pub power_up_min_delay_ms: f64,
    pub power_up_max_delay_ms: f64,
    /// Pickup distance between the hanging block and the orb.
    pub power_up_radius: f64,
    pub slow_motion_ms: f64,
    /// Swing speed multiplier while slow motion runs.
    pub slow_motion_factor: f64,

    // Records.
    /// Length of the score board.
    pub max_records: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_width: 480.0,
            world_height: 500.0,
            gravity: 3000.0,
            pixels_per_meter: 100.0,
            ground_half_height: 10.0,
            anchor_y: 10.0,
            block_half_size: 25.0,

            spawn_offset_x: 100.0,
            spawn_offset_y: 50.0,
            start_angle: 0.5,
            swing_bound: 0.8,
            spin_after_blocks: 15,
            spin_angvel: 4.8,

            settle_delay_ms: 600.0,
            min_overlap_ratio: 0.4,
            max_vertical_gap: 60.0,
            ground_contact_margin: 40.0,

            follow_after_blocks: 6,
            follow_threshold_y: 240.0,
            follow_amount: 150.0,
            scroll_duration_ms: 400.0,
            periodic_every: 6,
            periodic_amount: 100.0,
            periodic_growth: 10.0,
            collapse_scroll_ms: 700.0,
            collapse_scroll_min: 100.0,
            collapse_ground_margin: 40.0,

            wobble_recover_ms: 500.0,
            wobble_base: 20.0,
            wobble_per_index: 4.0,
            wobble_lift: 15.0,
            fall_base: 120.0,
            fall_per_index: 18.0,
            fall_max_spin: 3.0,
            push_multiplier: 3.0,
            tilt_limit: 0.9,

            rock_interval_ms: 3000.0,
            rock_min_stack: 3,
            rock_lifetime_ms: 4000.0,
            rock_speed: 320.0,
            rock_vertical_damping: 0.3,
            rock_radius: 12.0,

            boss_speed: 90.0,
            boss_tolerance: 5.0,
            boss_warn_ms: 500.0,

            shield_duration_ms: 5000.0,
            power_up_min_delay_ms: 10_000.0,
            power_up_max_delay_ms: 20_000.0,
            power_up_radius: 50.0,
            slow_motion_ms: 5000.0,
            slow_motion_factor: 0.5,

            max_records: 5,
        }
    }
}

impl Tuning {
    /// Canonical rope anchor position.
    pub fn anchor(&self) -> (f64, f64) {
        (self.world_width / 2.0, self.anchor_y)
    }

    /// Ground centre at zero scroll offset.
    pub fn ground_origin(&self) -> (f64, f64) {
        (
            self.world_width / 2.0,
            self.world_height - self.ground_half_height,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
