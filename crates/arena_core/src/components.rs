//! Runtime match state: sides, unit instances and their transient timers.
//!
//! A [`UnitInstance`] holds only what changes during a match. Static stats
//! live in the [`CardCatalog`](crate::data::CardCatalog) and are looked up by
//! `card_id` whenever they are needed.

use serde::{Deserialize, Serialize};

use crate::config::TimerPolicy;
use crate::data::{CardDefinition, StatusEffect};
use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for unit instances within one match.
pub type UnitId = u64;

/// Card identifier as written in the catalog.
pub type CardId = String;

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SideId {
    /// First joiner, defends the low-`y` edge.
    P1,
    /// Second joiner, defends the high-`y` edge.
    P2,
}

impl SideId {
    /// Both sides in processing order.
    pub const ALL: [SideId; 2] = [SideId::P1, SideId::P2];

    /// Index into per-side arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }
}

/// What a unit is currently attacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Target {
    /// Nothing in range; the unit keeps marching.
    #[default]
    None,
    /// An opposing unit instance.
    Unit(UnitId),
    /// The opposing base.
    Tower,
}

impl Target {
    /// Whether the unit has something to attack.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Accumulator for a periodic effect (attack cadence, spawning, production).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CadenceTimer {
    elapsed: Fixed,
}

impl CadenceTimer {
    /// Create a timer with nothing accumulated.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elapsed: Fixed::ZERO,
        }
    }

    /// Time accumulated since the last firing.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Advance by `dt` and return how many times the timer fired.
    ///
    /// A non-positive `period` never fires.
    pub fn advance(&mut self, dt: Fixed, period: Fixed, policy: TimerPolicy) -> u32 {
        if period <= Fixed::ZERO {
            return 0;
        }
        self.elapsed += dt;
        if self.elapsed < period {
            return 0;
        }
        match policy {
            TimerPolicy::ResetOnFire => {
                self.elapsed = Fixed::ZERO;
                1
            }
            TimerPolicy::CarryOver => {
                let fires = self.elapsed.saturating_div(period).to_num::<i64>().max(1);
                self.elapsed = self
                    .elapsed
                    .saturating_sub(period.saturating_mul(Fixed::saturating_from_num(fires)))
                    .max(Fixed::ZERO);
                u32::try_from(fires).unwrap_or(u32::MAX)
            }
        }
    }
}

/// Active slow effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlowState {
    /// Multiplier applied to speed and attack timer (0..1).
    pub factor: Fixed,
    /// Match time at which the slow ends.
    pub until: Fixed,
}

/// Active burn effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BurnState {
    /// Damage dealt per second of burning.
    pub damage_per_second: u32,
    /// Match time at which the burn ends.
    pub until: Fixed,
    /// Fractional damage not yet applied.
    pub carry: Fixed,
}

/// Transient status effects on a unit, with expiry timestamps in match time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusEffects {
    /// Stunned until this match time.
    pub stunned_until: Option<Fixed>,
    /// Active slow.
    pub slow: Option<SlowState>,
    /// Active burn.
    pub burn: Option<BurnState>,
    /// Remaining shield points (absorbed before hp).
    pub shield: u32,
    /// Distance marched since the last hit (charge units only).
    pub charge_distance: Fixed,
    /// Whether the next hit is a charge hit.
    pub charged: bool,
}

impl StatusEffects {
    /// Whether the unit is stunned at match time `now`.
    #[must_use]
    pub fn is_stunned(&self, now: Fixed) -> bool {
        self.stunned_until.is_some_and(|until| now < until)
    }

    /// Speed and attack-rate multiplier from an active slow.
    #[must_use]
    pub fn slow_factor(&self, now: Fixed) -> Fixed {
        match self.slow {
            Some(slow) if now < slow.until => slow.factor,
            _ => Fixed::ONE,
        }
    }

    /// Apply an on-hit effect at match time `now`.
    ///
    /// Re-applying an effect extends it; it never shortens an existing one.
    pub fn apply(&mut self, effect: &StatusEffect, now: Fixed) {
        match *effect {
            StatusEffect::Stun { duration } => {
                let until = now + duration;
                self.stunned_until = Some(self.stunned_until.map_or(until, |u| u.max(until)));
                self.charged = false;
                self.charge_distance = Fixed::ZERO;
            }
            StatusEffect::Slow { factor, duration } => {
                let until = now + duration;
                self.slow = Some(SlowState {
                    factor,
                    until: self.slow.map_or(until, |s| s.until.max(until)),
                });
            }
            StatusEffect::Burn {
                damage_per_second,
                duration,
            } => {
                let until = now + duration;
                let carry = self.burn.map_or(Fixed::ZERO, |b| b.carry);
                self.burn = Some(BurnState {
                    damage_per_second,
                    until: self.burn.map_or(until, |b| b.until.max(until)),
                    carry,
                });
            }
        }
    }

    /// Drop effects that have expired at match time `now`.
    pub fn expire(&mut self, now: Fixed) {
        if self.stunned_until.is_some_and(|until| now >= until) {
            self.stunned_until = None;
        }
        if self.slow.is_some_and(|slow| now >= slow.until) {
            self.slow = None;
        }
        if self.burn.is_some_and(|burn| now >= burn.until) {
            self.burn = None;
        }
    }
}

/// A live unit or building on the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitInstance {
    /// Unique id within the match.
    pub id: UnitId,
    /// Catalog entry this instance was created from.
    pub card_id: CardId,
    /// Owning side.
    pub side: SideId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Current hit points.
    pub hp: u32,
    /// Hit points at creation.
    pub max_hp: u32,
    /// Current attack target.
    pub target: Target,
    /// Time toward the next attack.
    pub attack_timer: CadenceTimer,
    /// Time toward the next spawn batch.
    pub spawn_timer: CadenceTimer,
    /// Time toward the next mana credit.
    pub production_timer: CadenceTimer,
    /// Remaining lifetime for decaying buildings.
    pub lifetime_remaining: Option<Fixed>,
    /// Transient status effects.
    pub status: StatusEffects,
}

impl UnitInstance {
    /// Create a fresh instance of `card` at `position`.
    #[must_use]
    pub fn new(id: UnitId, card: &CardDefinition, side: SideId, position: Vec2Fixed) -> Self {
        Self {
            id,
            card_id: card.id.clone(),
            side,
            position,
            hp: card.hp,
            max_hp: card.hp,
            target: Target::None,
            attack_timer: CadenceTimer::new(),
            spawn_timer: CadenceTimer::new(),
            production_timer: CadenceTimer::new(),
            lifetime_remaining: card.lifetime,
            status: StatusEffects {
                shield: card.shield,
                ..StatusEffects::default()
            },
        }
    }

    /// Whether the instance is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply damage, draining the shield first.
    ///
    /// Returns the hp actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let absorbed = amount.min(self.status.shield);
        self.status.shield -= absorbed;
        let lost = (amount - absorbed).min(self.hp);
        self.hp -= lost;
        lost
    }
}
