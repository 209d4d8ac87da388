//! Targeting and attack resolution.
//!
//! Every tick, each combatant that is not stunned:
//! - Picks the nearest eligible opposing unit in range, falling back to the
//!   opposing base when its favorite target allows it
//! - Advances its attack timer while it has a target
//! - Resolves each firing as a self-destruct, a splash or a direct hit
//!
//! Units are processed P1 first, then P2, each in creation order, so the
//! outcome of a tick is fully determined by the state going into it.

use serde::{Deserialize, Serialize};

use crate::components::{SideId, Target, UnitId, UnitInstance};
use crate::config::{FieldLayout, TimerPolicy};
use crate::data::{CardCatalog, CardDefinition, ProjectileKind, StatusEffect};
use crate::math::{Fixed, Vec2Fixed};
use crate::side::Side;

/// One attack that landed this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Attacking side.
    pub side: SideId,
    /// What was aimed at.
    pub target: Target,
    /// Impact point.
    pub impact: Vec2Fixed,
    /// Damage per unit hit (after charge).
    pub damage: u32,
    /// Whether the attack splashed.
    pub splash: bool,
    /// Projectile visual, if any.
    pub projectile: Option<ProjectileKind>,
}

/// A single damage application: what it deals and what it carries.
#[derive(Debug, Clone, Copy)]
pub struct Strike<'a> {
    /// Damage to every unit hit.
    pub damage: u32,
    /// Effect applied to every unit hit.
    pub effect: Option<&'a StatusEffect>,
    /// Whether a splash may also damage the opposing base.
    pub hits_tower: bool,
}

impl<'a> Strike<'a> {
    /// The strike a card delivers with `damage`.
    #[must_use]
    pub fn from_card(card: &'a CardDefinition, damage: u32) -> Self {
        Self {
            damage,
            effect: card.effect.as_ref(),
            hits_tower: card.hits_tower,
        }
    }
}

/// Result of one splash application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplashOutcome {
    /// Units that took the hit, in the defender's unit order.
    pub units_hit: Vec<UnitId>,
    /// Whether the base took the hit.
    pub base_hit: bool,
}

/// Whether `attacker` may ever aim at `target`.
///
/// Melee ground units and units that cannot target air skip flyers. A
/// favorite target restricts the candidates to that category only.
#[must_use]
pub fn can_target(attacker: &CardDefinition, target: &CardDefinition) -> bool {
    if target.is_flying() && !attacker.reaches_air() {
        return false;
    }
    match attacker.favorite_target {
        Some(category) => category.matches(target.card_type),
        None => true,
    }
}

/// Choose what `attacker` at `position` should attack.
///
/// The nearest eligible unit in range wins; ties go to the first one in
/// `enemies` order. With no unit in range the enemy base is tested, unless
/// the attacker favors a non-building category.
#[must_use]
pub fn select_target(
    attacker: &CardDefinition,
    position: Vec2Fixed,
    enemies: &[UnitInstance],
    enemy_base: Vec2Fixed,
    catalog: &CardCatalog,
) -> Target {
    let range_sq = attacker.range * attacker.range;
    let mut best: Option<(UnitId, Fixed)> = None;

    for enemy in enemies {
        if !enemy.is_alive() {
            continue;
        }
        let Some(enemy_card) = catalog.get(&enemy.card_id) else {
            continue;
        };
        if !can_target(attacker, enemy_card) {
            continue;
        }
        let dist_sq = position.distance_squared(enemy.position);
        if dist_sq > range_sq {
            continue;
        }
        if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
            best = Some((enemy.id, dist_sq));
        }
    }

    if let Some((id, _)) = best {
        return Target::Unit(id);
    }

    if attacker.may_target_tower() && position.distance_squared(enemy_base) <= range_sq {
        return Target::Tower;
    }

    Target::None
}

/// Damage every enemy unit within `radius` of `center` (inclusive).
///
/// The base is damaged only when the strike is tower-capable and the base
/// lies within the radius. Flying and ground units are both hit.
pub fn apply_splash(
    defender: &mut Side,
    defender_base: Vec2Fixed,
    center: Vec2Fixed,
    radius: Fixed,
    strike: &Strike<'_>,
    now: Fixed,
) -> SplashOutcome {
    let mut outcome = SplashOutcome::default();

    for unit in defender.units.iter_mut().filter(|u| u.is_alive()) {
        if unit.position.within(center, radius) {
            hit_unit(unit, strike, now);
            outcome.units_hit.push(unit.id);
        }
    }

    if strike.hits_tower && defender_base.within(center, radius) {
        defender.damage_base(strike.damage);
        outcome.base_hit = true;
    }

    outcome
}

/// Land a single hit on `target`. Returns whether anything was hit.
pub fn apply_direct(defender: &mut Side, target: Target, strike: &Strike<'_>, now: Fixed) -> bool {
    match target {
        Target::None => false,
        Target::Tower => {
            defender.damage_base(strike.damage);
            true
        }
        Target::Unit(id) => match defender.unit_mut(id) {
            Some(unit) if unit.is_alive() => {
                hit_unit(unit, strike, now);
                true
            }
            _ => false,
        },
    }
}

fn hit_unit(unit: &mut UnitInstance, strike: &Strike<'_>, now: Fixed) {
    unit.take_damage(strike.damage);
    if let Some(effect) = strike.effect {
        unit.status.apply(effect, now);
    }
}

/// Per-tick inputs shared by every attacker.
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    /// Card lookups.
    pub catalog: &'a CardCatalog,
    /// Field geometry (base positions).
    pub field: &'a FieldLayout,
    /// Tick length in seconds.
    pub dt: Fixed,
    /// Match time at the start of this tick.
    pub now: Fixed,
    /// Attack timer behavior.
    pub policy: TimerPolicy,
}

/// Run targeting and attacks for both sides.
pub fn run_combat(sides: &mut [Side; 2], ctx: &CombatContext<'_>) -> Vec<AttackEvent> {
    let mut events = Vec::new();
    for side in SideId::ALL {
        let (attackers, defenders) = split_sides(sides, side);
        for index in 0..attackers.units.len() {
            resolve_attacker(attackers, index, defenders, ctx, &mut events);
        }
    }
    events
}

/// Borrow `side` mutably alongside its opponent.
pub fn split_sides(sides: &mut [Side; 2], side: SideId) -> (&mut Side, &mut Side) {
    let (first, second) = sides.split_at_mut(1);
    match side {
        SideId::P1 => (&mut first[0], &mut second[0]),
        SideId::P2 => (&mut second[0], &mut first[0]),
    }
}

fn resolve_attacker(
    attackers: &mut Side,
    index: usize,
    defenders: &mut Side,
    ctx: &CombatContext<'_>,
    events: &mut Vec<AttackEvent>,
) {
    let unit = &attackers.units[index];
    if !unit.is_alive() || unit.status.is_stunned(ctx.now) {
        return;
    }
    let Some(card) = ctx.catalog.get(&unit.card_id) else {
        return;
    };
    if !card.is_combatant() {
        return;
    }

    let defender_base = ctx.field.base_position(defenders.id);
    let target = select_target(card, unit.position, &defenders.units, defender_base, ctx.catalog);

    let unit = &mut attackers.units[index];
    unit.target = target;
    if !target.is_active() {
        return;
    }

    let scaled_dt = ctx.dt * unit.status.slow_factor(ctx.now);
    let fires = unit
        .attack_timer
        .advance(scaled_dt, card.attack_cadence, ctx.policy);

    for _ in 0..fires {
        let unit = &mut attackers.units[index];
        if !unit.is_alive() || !target_alive(defenders, target) {
            break;
        }

        let damage = charged_damage(unit, card);
        let attacker_id = unit.id;
        let strike = Strike::from_card(card, damage);

        let (impact, splash) = if card.self_destruct {
            let center = unit.position;
            unit.hp = 0;
            let radius = card.effective_splash_radius().unwrap_or(card.range);
            apply_splash(defenders, defender_base, center, radius, &strike, ctx.now);
            (center, true)
        } else if let Some(radius) = card.splash_radius {
            let center = target_position(defenders, target, defender_base);
            apply_splash(defenders, defender_base, center, radius, &strike, ctx.now);
            (center, true)
        } else {
            let impact = target_position(defenders, target, defender_base);
            apply_direct(defenders, target, &strike, ctx.now);
            (impact, false)
        };

        events.push(AttackEvent {
            attacker: attacker_id,
            side: attackers.id,
            target,
            impact,
            damage,
            splash,
            projectile: card.projectile,
        });
    }
}

/// Damage for the next hit, consuming a ready charge.
fn charged_damage(unit: &mut UnitInstance, card: &CardDefinition) -> u32 {
    match card.charge {
        Some(charge) if unit.status.charged => {
            unit.status.charged = false;
            unit.status.charge_distance = Fixed::ZERO;
            Fixed::saturating_from_num(card.damage)
                .saturating_mul(charge.damage_multiplier)
                .saturating_to_num::<u32>()
        }
        _ => card.damage,
    }
}

fn target_alive(defenders: &Side, target: Target) -> bool {
    match target {
        Target::None => false,
        Target::Tower => !defenders.base_destroyed(),
        Target::Unit(id) => defenders.unit(id).is_some_and(UnitInstance::is_alive),
    }
}

fn target_position(defenders: &Side, target: Target, defender_base: Vec2Fixed) -> Vec2Fixed {
    match target {
        Target::Unit(id) => defenders
            .unit(id)
            .map_or(defender_base, |unit| unit.position),
        Target::Tower | Target::None => defender_base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CardType, ChargeSpec, TargetCategory};

    fn card(id: &str, card_type: CardType, range: f64) -> CardDefinition {
        CardDefinition {
            id: id.to_string(),
            name: id.to_string(),
            card_type,
            cost: 3,
            hp: 500,
            damage: 100,
            speed: Fixed::ONE,
            range: Fixed::from_num(range),
            attack_cadence: Fixed::ONE,
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

    fn catalog() -> CardCatalog {
        let mut giant = card("giant", CardType::Ground, 1.0);
        giant.favorite_target = Some(TargetCategory::Building);
        let mut sniper = card("sniper", CardType::Ground, 6.0);
        sniper.can_target_air = false;
        CardCatalog::new(vec![
            card("melee", CardType::Ground, 1.0),
            card("archer", CardType::Ground, 5.0),
            card("bat", CardType::Flying, 1.0),
            card("hut", CardType::Building, 0.0),
            giant,
            sniper,
        ])
        .unwrap()
    }

    fn unit_at(catalog: &CardCatalog, id: UnitId, card_id: &str, x: i32, y: i32) -> UnitInstance {
        UnitInstance::new(
            id,
            catalog.get(card_id).unwrap(),
            SideId::P2,
            Vec2Fixed::from_ints(x, y),
        )
    }

    #[test]
    fn test_melee_ground_skips_flyers() {
        let catalog = catalog();
        let melee = catalog.get("melee").unwrap();
        let archer = catalog.get("archer").unwrap();
        let sniper = catalog.get("sniper").unwrap();
        let bat = catalog.get("bat").unwrap();

        assert!(!can_target(melee, bat));
        assert!(can_target(archer, bat));
        assert!(!can_target(sniper, bat));
    }

    #[test]
    fn test_nearest_in_range_wins_with_stable_ties() {
        let catalog = catalog();
        let archer = catalog.get("archer").unwrap();
        let enemies = vec![
            unit_at(&catalog, 10, "melee", 3, 0),
            unit_at(&catalog, 11, "melee", 0, 3),
            unit_at(&catalog, 12, "melee", 0, 2),
            unit_at(&catalog, 13, "melee", 0, 9),
        ];
        let far_base = Vec2Fixed::from_ints(50, 50);

        let target = select_target(archer, Vec2Fixed::ZERO, &enemies, far_base, &catalog);
        assert_eq!(target, Target::Unit(12));

        // Equal distances: first in order wins.
        let tied = vec![
            unit_at(&catalog, 20, "melee", 3, 0),
            unit_at(&catalog, 21, "melee", 0, 3),
        ];
        let target = select_target(archer, Vec2Fixed::ZERO, &tied, far_base, &catalog);
        assert_eq!(target, Target::Unit(20));
    }

    #[test]
    fn test_dead_units_are_not_candidates() {
        let catalog = catalog();
        let archer = catalog.get("archer").unwrap();
        let mut enemies = vec![unit_at(&catalog, 1, "melee", 1, 0)];
        enemies[0].hp = 0;

        let target = select_target(
            archer,
            Vec2Fixed::ZERO,
            &enemies,
            Vec2Fixed::from_ints(50, 50),
            &catalog,
        );
        assert_eq!(target, Target::None);
    }

    #[test]
    fn test_favorite_target_has_no_fallback() {
        let catalog = catalog();
        let giant = catalog.get("giant").unwrap();
        let enemies = vec![
            unit_at(&catalog, 1, "melee", 0, 1),
            unit_at(&catalog, 2, "hut", 0, 1),
        ];
        let far_base = Vec2Fixed::from_ints(50, 50);

        let target = select_target(giant, Vec2Fixed::ZERO, &enemies, far_base, &catalog);
        assert_eq!(target, Target::Unit(2));

        let only_troops = vec![unit_at(&catalog, 1, "melee", 0, 1)];
        let target = select_target(giant, Vec2Fixed::ZERO, &only_troops, far_base, &catalog);
        assert_eq!(target, Target::None);
    }

    #[test]
    fn test_tower_fallback_in_range() {
        let catalog = catalog();
        let melee = catalog.get("melee").unwrap();
        let base = Vec2Fixed::from_ints(0, 1);

        assert_eq!(
            select_target(melee, Vec2Fixed::ZERO, &[], base, &catalog),
            Target::Tower
        );
        assert_eq!(
            select_target(melee, Vec2Fixed::ZERO, &[], Vec2Fixed::from_ints(0, 2), &catalog),
            Target::None
        );
    }

    #[test]
    fn test_splash_radius_is_inclusive_and_tower_gated() {
        let catalog = catalog();
        let mut defender = Side::new(SideId::P2, 1000, Fixed::ZERO);
        defender.units = vec![
            unit_at(&catalog, 1, "melee", 2, 0),
            unit_at(&catalog, 2, "bat", 0, 2),
            unit_at(&catalog, 3, "melee", 3, 0),
        ];
        let base = Vec2Fixed::from_ints(-2, 0);
        let radius = Fixed::from_num(2);

        let strike = Strike {
            damage: 50,
            effect: None,
            hits_tower: false,
        };
        let outcome = apply_splash(&mut defender, base, Vec2Fixed::ZERO, radius, &strike, Fixed::ZERO);
        assert_eq!(outcome.units_hit, vec![1, 2]);
        assert!(!outcome.base_hit);
        assert_eq!(defender.base_hp, 1000);
        assert_eq!(defender.units[2].hp, 500);

        let strike = Strike {
            hits_tower: true,
            ..strike
        };
        let outcome = apply_splash(&mut defender, base, Vec2Fixed::ZERO, radius, &strike, Fixed::ZERO);
        assert!(outcome.base_hit);
        assert_eq!(defender.base_hp, 950);
    }

    #[test]
    fn test_splash_applies_effect_to_each_hit() {
        let catalog = catalog();
        let mut defender = Side::new(SideId::P2, 1000, Fixed::ZERO);
        defender.units = vec![
            unit_at(&catalog, 1, "melee", 0, 0),
            unit_at(&catalog, 2, "melee", 1, 0),
        ];
        let stun = StatusEffect::Stun {
            duration: Fixed::ONE,
        };
        let strike = Strike {
            damage: 10,
            effect: Some(&stun),
            hits_tower: false,
        };
        apply_splash(
            &mut defender,
            Vec2Fixed::from_ints(20, 20),
            Vec2Fixed::ZERO,
            Fixed::from_num(2),
            &strike,
            Fixed::ZERO,
        );
        assert!(defender.units.iter().all(|u| u.status.is_stunned(Fixed::from_num(0.5))));
    }

    #[test]
    fn test_direct_hit_on_tower_and_unit() {
        let catalog = catalog();
        let mut defender = Side::new(SideId::P2, 300, Fixed::ZERO);
        defender.units = vec![unit_at(&catalog, 5, "melee", 0, 0)];
        let strike = Strike {
            damage: 120,
            effect: None,
            hits_tower: false,
        };

        assert!(apply_direct(&mut defender, Target::Tower, &strike, Fixed::ZERO));
        assert_eq!(defender.base_hp, 180);

        assert!(apply_direct(&mut defender, Target::Unit(5), &strike, Fixed::ZERO));
        assert_eq!(defender.units[0].hp, 380);

        assert!(!apply_direct(&mut defender, Target::Unit(99), &strike, Fixed::ZERO));
    }

    #[test]
    fn test_split_sides_pairs_opponents() {
        let mut sides = [
            Side::new(SideId::P1, 1, Fixed::ZERO),
            Side::new(SideId::P2, 2, Fixed::ZERO),
        ];
        let (own, other) = split_sides(&mut sides, SideId::P2);
        assert_eq!(own.id, SideId::P2);
        assert_eq!(other.id, SideId::P1);
    }

    #[test]
    fn test_charged_damage_saturates() {
        let mut brute = card("brute", CardType::Ground, 1.0);
        brute.damage = u32::MAX;
        brute.charge = Some(ChargeSpec {
            distance: Fixed::ONE,
            damage_multiplier: Fixed::from_num(2),
            speed_multiplier: Fixed::from_num(2),
        });
        let mut unit = UnitInstance::new(1, &brute, SideId::P1, Vec2Fixed::ZERO);
        unit.status.charged = true;
        unit.status.charge_distance = Fixed::from_num(3);

        let damage = charged_damage(&mut unit, &brute);
        assert_eq!(damage, Fixed::MAX.saturating_to_num::<u32>());
        assert!(!unit.status.charged);
        assert_eq!(unit.status.charge_distance, Fixed::ZERO);
        assert_eq!(charged_damage(&mut unit, &brute), u32::MAX);
    }
}
