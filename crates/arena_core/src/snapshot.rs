//! Outbound match views.
//!
//! A [`MatchSnapshot`] is everything a remote player (or the decision agent)
//! is allowed to see. Targets and raw timers stay inside the simulation.

use serde::{Deserialize, Serialize};

use crate::components::{CardId, SideId, StatusEffects, UnitId, UnitInstance};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::side::Side;

/// Terminal signal, emitted exactly once per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOverEvent {
    /// Winning side, `None` for a draw.
    pub winner: Option<SideId>,
}

/// Visible status of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Cannot move or attack.
    pub stunned: bool,
    /// Moving and attacking slower.
    pub slowed: bool,
    /// Taking damage over time.
    pub burning: bool,
    /// Has shield points left.
    pub shielded: bool,
    /// Next hit is a charge hit.
    pub charged: bool,
}

impl StatusFlags {
    /// Flags for `status` at match time `now`.
    #[must_use]
    pub fn from_status(status: &StatusEffects, now: Fixed) -> Self {
        Self {
            stunned: status.is_stunned(now),
            slowed: status.slow_factor(now) < Fixed::ONE,
            burning: status.burn.is_some_and(|burn| now < burn.until),
            shielded: status.shield > 0,
            charged: status.charged,
        }
    }
}

/// Public view of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Catalog entry.
    pub card_id: CardId,
    /// Owner.
    pub side: SideId,
    /// Position.
    pub position: Vec2Fixed,
    /// Current hit points.
    pub hp: u32,
    /// Hit points at creation.
    pub max_hp: u32,
    /// Visible status effects.
    pub status: StatusFlags,
}

impl UnitView {
    /// View of a live unit at match time `now`.
    #[must_use]
    pub fn from_instance(unit: &UnitInstance, now: Fixed) -> Self {
        Self {
            id: unit.id,
            card_id: unit.card_id.clone(),
            side: unit.side,
            position: unit.position,
            hp: unit.hp,
            max_hp: unit.max_hp,
            status: StatusFlags::from_status(&unit.status, now),
        }
    }
}

/// Public view of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideView {
    /// Which side.
    pub side: SideId,
    /// Whether a player holds the seat.
    pub joined: bool,
    /// Current mana.
    #[serde(with = "fixed_serde")]
    pub mana: Fixed,
    /// Base hit points.
    pub base_hp: u32,
    /// Playable cards.
    pub hand: Vec<CardId>,
    /// Card cycling in next.
    pub next_card: Option<CardId>,
}

impl SideView {
    /// View of `side`.
    #[must_use]
    pub fn from_side(side: &Side) -> Self {
        Self {
            side: side.id,
            joined: side.joined,
            mana: side.mana,
            base_hp: side.base_hp,
            hand: side.hand.clone(),
            next_card: side.next_card.clone(),
        }
    }
}

/// Everything visible about a match after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Ticks simulated so far.
    pub tick: u64,
    /// Simulated seconds so far.
    #[serde(with = "fixed_serde")]
    pub elapsed: Fixed,
    /// Both sides, indexed by [`SideId::index`].
    pub sides: [SideView; 2],
    /// All units, P1's first, each side in creation order.
    pub units: Vec<UnitView>,
    /// Whether the match has ended.
    pub game_over: bool,
    /// Winner once the match has ended (`None` on a draw).
    pub winner: Option<SideId>,
}

impl MatchSnapshot {
    /// View of one side.
    #[must_use]
    pub fn side(&self, side: SideId) -> &SideView {
        &self.sides[side.index()]
    }

    /// Units owned by `side`.
    pub fn units_of(&self, side: SideId) -> impl Iterator<Item = &UnitView> {
        self.units.iter().filter(move |u| u.side == side)
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitView> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to encode snapshot: {e}")))
    }

    /// Decode from the wire.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to decode snapshot: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::SlowState;

    #[test]
    fn test_status_flags_reflect_time() {
        let status = StatusEffects {
            stunned_until: Some(Fixed::from_num(2)),
            slow: Some(SlowState {
                factor: Fixed::from_num(0.5),
                until: Fixed::from_num(1),
            }),
            shield: 10,
            ..StatusEffects::default()
        };

        let early = StatusFlags::from_status(&status, Fixed::from_num(0.5));
        assert!(early.stunned && early.slowed && early.shielded);
        assert!(!early.burning && !early.charged);

        let later = StatusFlags::from_status(&status, Fixed::from_num(1.5));
        assert!(later.stunned);
        assert!(!later.slowed);
    }

    #[test]
    fn test_snapshot_bytes_preserve_fixed_bits() {
        let mut p1 = Side::new(SideId::P1, 2400, Fixed::from_num(1) / Fixed::from_num(3));
        p1.joined = true;
        p1.hand = vec!["knight".to_string()];
        let snapshot = MatchSnapshot {
            tick: 3,
            elapsed: Fixed::from_num(0.15),
            sides: [
                SideView::from_side(&p1),
                SideView::from_side(&Side::new(SideId::P2, 2400, Fixed::ZERO)),
            ],
            units: Vec::new(),
            game_over: false,
            winner: None,
        };

        let decoded = MatchSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.side(SideId::P1).mana.to_bits(), p1.mana.to_bits());
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(matches!(
            MatchSnapshot::from_bytes(&[1, 2, 3]),
            Err(GameError::Serialization(_))
        ));
    }
}
