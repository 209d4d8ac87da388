//! Threat assessment: which enemy units are pushing into our half, and
//! what kind of answer each one calls for.

use crate::components::SideId;
use crate::config::FieldLayout;
use crate::data::{CardCatalog, CardDefinition, CardType, MELEE_AIR_REACH};
use crate::math::Fixed;
use crate::snapshot::{MatchSnapshot, UnitView};

/// How far past the midline an enemy still counts as a threat.
pub const BRIDGE_MARGIN: i32 = 2;

/// Hit points from which a unit counts as a tank.
pub const TANK_HP: u32 = 1200;

/// Hit points at or below which a unit dies to splash.
pub const FRAGILE_HP: u32 = 300;

/// Instance count from which a card counts as a swarm.
pub const SWARM_SIZE: u32 = 3;

/// An enemy unit inside our half.
#[derive(Debug, Clone, Copy)]
pub struct Threat<'a> {
    /// Visible state of the unit.
    pub unit: &'a UnitView,
    /// Its card.
    pub card: &'a CardDefinition,
    /// Distance to our base.
    pub distance: Fixed,
}

/// Counter category for a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatClass {
    /// Swarms and fragile units.
    SplashVulnerable,
    /// Air units.
    Flying,
    /// High hit-point units.
    Tank,
    /// Everything else.
    Generic,
}

impl ThreatClass {
    /// Classify a card, checking categories in priority order.
    #[must_use]
    pub fn of(card: &CardDefinition) -> Self {
        if card.instance_count >= SWARM_SIZE || card.hp <= FRAGILE_HP {
            Self::SplashVulnerable
        } else if card.is_flying() {
            Self::Flying
        } else if is_tank(card) {
            Self::Tank
        } else {
            Self::Generic
        }
    }
}

/// Whether a card is a tank by hit points.
#[must_use]
pub fn is_tank(card: &CardDefinition) -> bool {
    card.hp >= TANK_HP
}

/// Whether a threat can be pulled away with a cheap decoy.
///
/// Only melee ground units that chase anything and are not tanks.
#[must_use]
pub fn is_kiteable(card: &CardDefinition) -> bool {
    card.card_type == CardType::Ground
        && card.range < Fixed::from_num(MELEE_AIR_REACH)
        && !card.favors_buildings()
        && !is_tank(card)
}

/// Whether a threat is best answered with a defensive building.
#[must_use]
pub fn wants_building(card: &CardDefinition) -> bool {
    card.favors_buildings() || is_tank(card) || card.is_flying()
}

/// Enemy units inside `side`'s half plus the bridge margin, nearest to our
/// base first.
#[must_use]
pub fn assess_threats<'a>(
    snapshot: &'a MatchSnapshot,
    side: SideId,
    field: &FieldLayout,
    catalog: &'a CardCatalog,
) -> Vec<Threat<'a>> {
    let base = field.base_position(side);
    let margin = Fixed::from_num(BRIDGE_MARGIN);

    let mut threats: Vec<Threat<'a>> = snapshot
        .units_of(side.opponent())
        .filter(|unit| field.in_half_of(side, unit.position, margin))
        .filter_map(|unit| {
            let card = catalog.get(&unit.card_id)?;
            Some(Threat {
                unit,
                card,
                distance: unit.position.distance(base),
            })
        })
        .collect();

    threats.sort_by_key(|threat| threat.distance);
    threats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::math::Vec2Fixed;
    use crate::side::Side;
    use crate::snapshot::{SideView, StatusFlags};

    fn view(id: u64, card_id: &str, side: SideId, x: i32, y: i32) -> UnitView {
        UnitView {
            id,
            card_id: card_id.to_string(),
            side,
            position: Vec2Fixed::from_ints(x, y),
            hp: 100,
            max_hp: 100,
            status: StatusFlags::default(),
        }
    }

    fn snapshot(units: Vec<UnitView>) -> MatchSnapshot {
        let config = MatchConfig::default();
        MatchSnapshot {
            tick: 0,
            elapsed: Fixed::ZERO,
            sides: [
                SideView::from_side(&Side::new(SideId::P1, config.base_hp, config.starting_mana)),
                SideView::from_side(&Side::new(SideId::P2, config.base_hp, config.starting_mana)),
            ],
            units,
            game_over: false,
            winner: None,
        }
    }

    #[test]
    fn test_classification_order() {
        let catalog = CardCatalog::builtin().unwrap();
        let class = |id: &str| ThreatClass::of(catalog.get(id).unwrap());

        assert_eq!(class("goblins"), ThreatClass::SplashVulnerable);
        assert_eq!(class("minions"), ThreatClass::SplashVulnerable);
        assert_eq!(class("archers"), ThreatClass::SplashVulnerable);
        assert_eq!(class("baby_dragon"), ThreatClass::Flying);
        assert_eq!(class("giant"), ThreatClass::Tank);
        assert_eq!(class("knight"), ThreatClass::Generic);
    }

    #[test]
    fn test_kite_and_building_triggers() {
        let catalog = CardCatalog::builtin().unwrap();
        let card = |id: &str| catalog.get(id).unwrap();

        assert!(is_kiteable(card("knight")));
        assert!(!is_kiteable(card("prince")));
        assert!(!is_kiteable(card("giant")));
        assert!(!is_kiteable(card("musketeer")));

        assert!(wants_building(card("giant")));
        assert!(wants_building(card("prince")));
        assert!(wants_building(card("minions")));
        assert!(!wants_building(card("knight")));
    }

    #[test]
    fn test_threats_in_half_sorted_by_distance() {
        let catalog = CardCatalog::builtin().unwrap();
        let field = FieldLayout::default();
        let snap = snapshot(vec![
            view(1, "knight", SideId::P2, 9, 12),
            view(2, "goblins", SideId::P2, 9, 6),
            view(3, "giant", SideId::P2, 9, 17),
            view(4, "archers", SideId::P2, 9, 19),
            view(5, "knight", SideId::P1, 9, 5),
        ]);

        let threats = assess_threats(&snap, SideId::P1, &field, &catalog);
        let ids: Vec<u64> = threats.iter().map(|t| t.unit.id).collect();
        // y=19 is beyond midline 16 + margin 2; own units never count.
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
