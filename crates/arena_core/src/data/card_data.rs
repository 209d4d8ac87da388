//! Card definitions for data-driven units, buildings and spells.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, option_fixed_decimal, Fixed};

/// Broad card category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    /// Walks along the ground.
    Ground,
    /// Flies; only air-capable attackers can hit it.
    Flying,
    /// Stationary structure.
    Building,
    /// Instant area effect, never becomes a unit.
    Spell,
}

/// Target restriction for units that only attack one kind of thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCategory {
    /// Ground troops.
    Ground,
    /// Flying troops.
    Flying,
    /// Buildings (including the opposing base).
    Building,
}

impl TargetCategory {
    /// Whether a card type belongs to this category.
    #[must_use]
    pub fn matches(self, card_type: CardType) -> bool {
        matches!(
            (self, card_type),
            (Self::Ground, CardType::Ground)
                | (Self::Flying, CardType::Flying)
                | (Self::Building, CardType::Building)
        )
    }
}

/// Periodic unit spawning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerSpec {
    /// Card id of the spawned unit.
    pub unit_id: String,
    /// Seconds between spawn batches.
    #[serde(with = "fixed_decimal")]
    pub interval: Fixed,
    /// Units per batch.
    pub count: u32,
    /// Fire one batch immediately when the spawner is created.
    #[serde(default)]
    pub on_deploy: bool,
}

/// Periodic mana production (economy buildings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaProduction {
    /// Mana credited per cycle.
    #[serde(with = "fixed_decimal")]
    pub amount: Fixed,
    /// Seconds per cycle.
    #[serde(with = "fixed_decimal")]
    pub interval: Fixed,
}

/// On-hit status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Target cannot move or attack.
    Stun {
        /// Seconds stunned.
        #[serde(with = "fixed_decimal")]
        duration: Fixed,
    },
    /// Target moves and attacks slower.
    Slow {
        /// Speed and attack-rate multiplier (0..1).
        #[serde(with = "fixed_decimal")]
        factor: Fixed,
        /// Seconds slowed.
        #[serde(with = "fixed_decimal")]
        duration: Fixed,
    },
    /// Target takes damage over time.
    Burn {
        /// Damage per second.
        damage_per_second: u32,
        /// Seconds burning.
        #[serde(with = "fixed_decimal")]
        duration: Fixed,
    },
}

/// Charge behavior: after marching far enough, the next hit is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSpec {
    /// Distance to march before the charge is ready.
    #[serde(with = "fixed_decimal")]
    pub distance: Fixed,
    /// Damage multiplier on the charged hit.
    #[serde(with = "fixed_decimal")]
    pub damage_multiplier: Fixed,
    /// Speed multiplier while charged.
    #[serde(with = "fixed_decimal")]
    pub speed_multiplier: Fixed,
}

/// Projectile visual reported in attack events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Arrows and bolts.
    Arrow,
    /// Bullets.
    Bullet,
    /// Fire blobs.
    Fireball,
    /// Frost shards.
    Ice,
    /// Lightning arcs.
    Lightning,
}

/// Immutable static stats for one card.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "wizard",
///     name: "Wizard",
///     card_type: Ground,
///     cost: 5,
///     hp: 600,
///     damage: 230,
///     speed: 1.0,
///     range: 5.5,
///     attack_cadence: 1.4,
///     splash_radius: Some(1.5),
///     hits_tower: true,
///     projectile: Some(Fireball),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub card_type: CardType,
    /// Mana cost.
    pub cost: u32,
    /// Hit points per instance (0 for spells).
    #[serde(default)]
    pub hp: u32,
    /// Damage per attack (0 for passive buildings).
    #[serde(default)]
    pub damage: u32,
    /// Movement speed in tiles per second.
    #[serde(default, with = "fixed_decimal")]
    pub speed: Fixed,
    /// Attack range in tiles.
    #[serde(default, with = "fixed_decimal")]
    pub range: Fixed,
    /// Seconds between attacks.
    #[serde(default, with = "fixed_decimal")]
    pub attack_cadence: Fixed,

    /// Area of effect around the impact point.
    #[serde(default, with = "option_fixed_decimal")]
    pub splash_radius: Option<Fixed>,
    /// Instances created per deploy.
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
    /// Only attack this category; no fallback.
    #[serde(default)]
    pub favorite_target: Option<TargetCategory>,
    /// Periodic spawning.
    #[serde(default)]
    pub spawner: Option<SpawnerSpec>,
    /// Seconds before a building decays away.
    #[serde(default, with = "option_fixed_decimal")]
    pub lifetime: Option<Fixed>,
    /// Periodic mana production.
    #[serde(default)]
    pub mana_production: Option<ManaProduction>,
    /// Effect applied to every unit hit.
    #[serde(default)]
    pub effect: Option<StatusEffect>,
    /// Shield points absorbed before hp.
    #[serde(default)]
    pub shield: u32,
    /// Charge behavior.
    #[serde(default)]
    pub charge: Option<ChargeSpec>,
    /// Projectile visual.
    #[serde(default)]
    pub projectile: Option<ProjectileKind>,
    /// Dies on its first attack, splashing around itself.
    #[serde(default)]
    pub self_destruct: bool,
    /// Splash also damages the opposing base when it lies in the radius.
    #[serde(default)]
    pub hits_tower: bool,
    /// Whether this card can attack flying units at all.
    #[serde(default = "default_can_target_air")]
    pub can_target_air: bool,
    /// Cap on live instances per side.
    #[serde(default)]
    pub max_instances: Option<u32>,
}

const fn default_instance_count() -> u32 {
    1
}

const fn default_can_target_air() -> bool {
    true
}

/// Ground units below this range are melee and cannot reach flyers.
pub const MELEE_AIR_REACH: i32 = 2;

impl CardDefinition {
    /// Whether this card resolves as a spell.
    #[must_use]
    pub fn is_spell(&self) -> bool {
        self.card_type == CardType::Spell
    }

    /// Whether this card is a building.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.card_type == CardType::Building
    }

    /// Whether this card flies.
    #[must_use]
    pub fn is_flying(&self) -> bool {
        self.card_type == CardType::Flying
    }

    /// Whether instances of this card take part in targeting and combat.
    #[must_use]
    pub fn is_combatant(&self) -> bool {
        !self.is_spell() && self.damage > 0
    }

    /// Whether instances of this card march.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        matches!(self.card_type, CardType::Ground | CardType::Flying) && self.speed > Fixed::ZERO
    }

    /// Whether this card can attack flying units.
    #[must_use]
    pub fn reaches_air(&self) -> bool {
        if !self.can_target_air {
            return false;
        }
        !(self.card_type == CardType::Ground && self.range < Fixed::from_num(MELEE_AIR_REACH))
    }

    /// Whether this card may target the opposing base.
    ///
    /// Units that favor a non-building category never attack the base.
    #[must_use]
    pub fn may_target_tower(&self) -> bool {
        matches!(self.favorite_target, None | Some(TargetCategory::Building))
    }

    /// Whether the card favors buildings.
    #[must_use]
    pub fn favors_buildings(&self) -> bool {
        self.favorite_target == Some(TargetCategory::Building)
    }

    /// Radius used when this card splashes (spell, splash or self-destruct).
    #[must_use]
    pub fn effective_splash_radius(&self) -> Option<Fixed> {
        match self.splash_radius {
            Some(radius) => Some(radius),
            None if self.self_destruct => Some(self.range),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_card() -> CardDefinition {
        CardDefinition {
            id: "test_unit".to_string(),
            name: "Test Unit".to_string(),
            card_type: CardType::Ground,
            cost: 3,
            hp: 500,
            damage: 100,
            speed: Fixed::from_num(1),
            range: Fixed::from_num(1),
            attack_cadence: Fixed::from_num(1),
            splash_radius: None,
            instance_count: 1,
            favorite_target: None,
            spawner: None,
            lifetime: None,
            mana_production: None,
            effect: None,
            shield: 0,
            charge: None,
            projectile: None,
            self_destruct: false,
            hits_tower: false,
            can_target_air: true,
            max_instances: None,
        }
    }

    #[test]
    fn test_melee_ground_cannot_reach_air() {
        let mut card = create_test_card();
        assert!(!card.reaches_air());

        card.range = Fixed::from_num(2);
        assert!(card.reaches_air());

        card.can_target_air = false;
        assert!(!card.reaches_air());
    }

    #[test]
    fn test_short_range_flyer_reaches_air() {
        let mut card = create_test_card();
        card.card_type = CardType::Flying;
        assert!(card.reaches_air());
    }

    #[test]
    fn test_tower_eligibility_by_favorite() {
        let mut card = create_test_card();
        assert!(card.may_target_tower());

        card.favorite_target = Some(TargetCategory::Building);
        assert!(card.may_target_tower());

        card.favorite_target = Some(TargetCategory::Flying);
        assert!(!card.may_target_tower());
    }

    #[test]
    fn test_passive_building_is_not_combatant() {
        let mut card = create_test_card();
        card.card_type = CardType::Building;
        card.damage = 0;
        assert!(!card.is_combatant());
        assert!(!card.is_mobile());
    }

    #[test]
    fn test_self_destruct_splash_falls_back_to_range() {
        let mut card = create_test_card();
        card.self_destruct = true;
        assert_eq!(card.effective_splash_radius(), Some(Fixed::from_num(1)));

        card.splash_radius = Some(Fixed::from_num(2));
        assert_eq!(card.effective_splash_radius(), Some(Fixed::from_num(2)));
    }

    #[test]
    fn test_card_from_ron_with_defaults() {
        let card: CardDefinition = ron::from_str(
            r#"(
                id: "zap",
                name: "Zap",
                card_type: Spell,
                cost: 2,
                damage: 160,
                splash_radius: Some(2.5),
                hits_tower: true,
                effect: Some(Stun(duration: 0.5)),
            )"#,
        )
        .unwrap();

        assert!(card.is_spell());
        assert_eq!(card.instance_count, 1);
        assert!(card.can_target_air);
        assert_eq!(card.splash_radius, Some(Fixed::from_num(2.5)));
        assert_eq!(
            card.effect,
            Some(StatusEffect::Stun {
                duration: Fixed::from_num(0.5)
            })
        );
    }
}
