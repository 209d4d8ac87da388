//! Match configuration.
//!
//! Every tunable of a match lives here so a room can be created from a RON
//! file. All fields have defaults; a config file only lists what it changes.
//!
//! # Example RON
//!
//! ```ron
//! MatchConfig(
//!     starting_mana: 5.0,
//!     max_mana: 20.0,
//!     timer_policy: CarryOver,
//!     seed: 7,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::components::SideId;
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, option_fixed_decimal, Fixed, Vec2Fixed};

/// How periodic timers (attack, spawn, production) behave when they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimerPolicy {
    /// Fire at most once per tick and reset the accumulator to zero.
    ///
    /// Under a large `dt` (scheduler stall) repeats are lost.
    #[default]
    ResetOnFire,
    /// Subtract the period on each firing; a large `dt` fires several times.
    CarryOver,
}

/// Geometry of the battlefield.
///
/// P1 defends the low-`y` edge and attacks toward `height`; P2 mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLayout {
    /// Field width (x extent).
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Field height (y extent).
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Distance of each base from its own baseline.
    #[serde(with = "fixed_decimal")]
    pub base_inset: Fixed,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            width: Fixed::from_num(18),
            height: Fixed::from_num(32),
            base_inset: Fixed::from_num(3),
        }
    }
}

impl FieldLayout {
    /// Horizontal center of the field.
    #[must_use]
    pub fn center_x(&self) -> Fixed {
        self.width / Fixed::from_num(2)
    }

    /// The midline (bridge row) separating the two halves.
    #[must_use]
    pub fn midline(&self) -> Fixed {
        self.height / Fixed::from_num(2)
    }

    /// Fixed location of a side's base.
    #[must_use]
    pub fn base_position(&self, side: SideId) -> Vec2Fixed {
        match side {
            SideId::P1 => Vec2Fixed::new(self.center_x(), self.base_inset),
            SideId::P2 => Vec2Fixed::new(self.center_x(), self.height - self.base_inset),
        }
    }

    /// Point a side's idle units march toward: the opposing base, which sits
    /// on the midline column near the opposite edge.
    #[must_use]
    pub fn march_goal(&self, side: SideId) -> Vec2Fixed {
        self.base_position(side.opponent())
    }

    /// Sign of "forward" along `y` for a side: `+1` for P1, `-1` for P2.
    #[must_use]
    pub fn forward(&self, side: SideId) -> Fixed {
        match side {
            SideId::P1 => Fixed::ONE,
            SideId::P2 => -Fixed::ONE,
        }
    }

    /// Clamp a point into the field.
    #[must_use]
    pub fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed {
        self.clamp_with_margin(point, Fixed::ZERO)
    }

    /// Clamp a point into the field shrunk by `margin` on every edge.
    #[must_use]
    pub fn clamp_with_margin(&self, point: Vec2Fixed, margin: Fixed) -> Vec2Fixed {
        let min = Vec2Fixed::new(margin, margin);
        let max = Vec2Fixed::new(self.width - margin, self.height - margin);
        point.clamp(min, max)
    }

    /// Whether a point lies in `side`'s half, extended past the midline by `margin`.
    #[must_use]
    pub fn in_half_of(&self, side: SideId, point: Vec2Fixed, margin: Fixed) -> bool {
        match side {
            SideId::P1 => point.y <= self.midline() + margin,
            SideId::P2 => point.y >= self.midline() - margin,
        }
    }
}

/// Tunables for a single match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Field geometry.
    pub field: FieldLayout,
    /// Mana each side starts with.
    #[serde(with = "fixed_decimal")]
    pub starting_mana: Fixed,
    /// Mana cap.
    #[serde(with = "fixed_decimal")]
    pub max_mana: Fixed,
    /// Passive mana regeneration per second.
    #[serde(with = "fixed_decimal")]
    pub mana_regen_per_second: Fixed,
    /// Starting hit points of each base.
    pub base_hp: u32,
    /// Number of cards in hand (the next card is held separately).
    pub hand_size: usize,
    /// Maximum per-axis random offset applied to deployed and spawned units.
    #[serde(with = "fixed_decimal")]
    pub deploy_jitter: Fixed,
    /// Attack/spawn/production timer behavior.
    pub timer_policy: TimerPolicy,
    /// Optional match duration; on expiry the side with more base hp wins.
    #[serde(with = "option_fixed_decimal")]
    pub time_limit: Option<Fixed>,
    /// Seed for the match RNG (hand cycling and jitter).
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            field: FieldLayout::default(),
            starting_mana: Fixed::from_num(5),
            max_mana: Fixed::from_num(10),
            mana_regen_per_second: Fixed::from_num(0.5),
            base_hp: 2400,
            hand_size: 4,
            deploy_jitter: Fixed::from_num(0.3),
            timer_policy: TimerPolicy::ResetOnFire,
            time_limit: None,
            seed: 0,
        }
    }
}

impl MatchConfig {
    /// Parse a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Same config with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
