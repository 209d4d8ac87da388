//! Per-tick lifecycle: status effects, building decay, spawners and mana
//! production.
//!
//! Nothing here allocates unit ids or touches the match RNG. Spawner firings
//! come back as [`SpawnRequest`]s and the match turns them into units.

use serde::{Deserialize, Serialize};

use crate::components::{CardId, SideId, UnitInstance};
use crate::config::TimerPolicy;
use crate::data::CardCatalog;
use crate::math::{Fixed, Vec2Fixed};
use crate::side::Side;

/// A spawner fired; `count` units of `card_id` should appear at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Owning side of the new units.
    pub side: SideId,
    /// Card to instantiate.
    pub card_id: CardId,
    /// Spawner location (before jitter).
    pub position: Vec2Fixed,
    /// Number of units.
    pub count: u32,
}

/// Per-tick inputs for the lifecycle pass.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext<'a> {
    /// Card lookups.
    pub catalog: &'a CardCatalog,
    /// Tick length in seconds.
    pub dt: Fixed,
    /// Match time at the start of this tick.
    pub now: Fixed,
    /// Spawn and production timer behavior.
    pub policy: TimerPolicy,
    /// Mana cap for production credits.
    pub max_mana: Fixed,
}

/// What the lifecycle pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// Spawner firings to realize.
    pub spawns: Vec<SpawnRequest>,
    /// Mana credited per side this tick.
    pub mana_produced: [Fixed; 2],
}

/// Run the lifecycle pass over both sides.
pub fn run_lifecycle(sides: &mut [Side; 2], ctx: &LifecycleContext<'_>) -> LifecycleOutcome {
    let mut outcome = LifecycleOutcome::default();

    for side in sides.iter_mut() {
        let mut credit = Fixed::ZERO;
        for unit in side.units.iter_mut().filter(|u| u.is_alive()) {
            tick_status(unit, ctx.dt, ctx.now);
            decay(unit, ctx);
            if !unit.is_alive() {
                continue;
            }
            if let Some(request) = tick_spawner(unit, ctx) {
                outcome.spawns.push(request);
            }
            credit += tick_production(unit, ctx);
        }

        if credit > Fixed::ZERO {
            side.credit_mana(credit, ctx.max_mana);
            outcome.mana_produced[side.id.index()] = credit;
        }
    }

    outcome
}

/// Burn damage for this tick, then drop anything that has run out.
///
/// Burn deals `damage_per_second` over the part of the tick it is active
/// and carries the fractional remainder to the next tick.
pub fn tick_status(unit: &mut UnitInstance, dt: Fixed, now: Fixed) {
    let end = now + dt;
    if let Some(mut burn) = unit.status.burn {
        let active = burn.until.min(end) - now;
        if active > Fixed::ZERO {
            let owed = Fixed::saturating_from_num(burn.damage_per_second)
                .saturating_mul(active)
                .saturating_add(burn.carry);
            let whole = owed.floor();
            burn.carry = owed - whole;
            unit.status.burn = Some(burn);
            unit.take_damage(whole.saturating_to_num::<u32>());
        }
    }
    unit.status.expire(end);
}

/// Linear decay for units with a finite lifetime.
///
/// Combat damage that already pushed hp below the decay curve is kept.
fn decay(unit: &mut UnitInstance, ctx: &LifecycleContext<'_>) {
    let Some(remaining) = unit.lifetime_remaining else {
        return;
    };
    let Some(lifetime) = ctx
        .catalog
        .get(&unit.card_id)
        .and_then(|card| card.lifetime)
    else {
        return;
    };

    let remaining = remaining - ctx.dt;
    if remaining <= Fixed::ZERO {
        unit.lifetime_remaining = Some(Fixed::ZERO);
        unit.hp = 0;
        return;
    }
    unit.lifetime_remaining = Some(remaining);

    let fraction = (remaining / lifetime).min(Fixed::ONE);
    let projected = Fixed::saturating_from_num(unit.max_hp)
        .saturating_mul(fraction)
        .saturating_to_num::<u32>();
    unit.hp = unit.hp.min(projected);
}

fn tick_spawner(unit: &mut UnitInstance, ctx: &LifecycleContext<'_>) -> Option<SpawnRequest> {
    let spawner = ctx.catalog.get(&unit.card_id)?.spawner.as_ref()?;
    let fires = unit
        .spawn_timer
        .advance(ctx.dt, spawner.interval, ctx.policy);
    if fires == 0 {
        return None;
    }
    Some(SpawnRequest {
        side: unit.side,
        card_id: spawner.unit_id.clone(),
        position: unit.position,
        count: spawner.count.saturating_mul(fires),
    })
}

fn tick_production(unit: &mut UnitInstance, ctx: &LifecycleContext<'_>) -> Fixed {
    let Some(production) = ctx
        .catalog
        .get(&unit.card_id)
        .and_then(|card| card.mana_production)
    else {
        return Fixed::ZERO;
    };
    let fires = unit
        .production_timer
        .advance(ctx.dt, production.interval, ctx.policy);
    production.amount.saturating_mul(Fixed::saturating_from_num(fires))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BurnState;
    use crate::data::{CardDefinition, CardType, ManaProduction, SpawnerSpec};

    fn building(id: &str) -> CardDefinition {
        CardDefinition {
            id: id.to_string(),
            name: id.to_string(),
            card_type: CardType::Building,
            cost: 3,
            hp: 1000,
            damage: 0,
            speed: Fixed::ZERO,
            range: Fixed::ZERO,
            attack_cadence: Fixed::ZERO,
            splash_radius: None,
            instance_count: 1,
            favorite_target: None,
            spawner: None,
            lifetime: Some(Fixed::from_num(10)),
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
        let mut hut = building("hut");
        hut.spawner = Some(SpawnerSpec {
            unit_id: "imp".to_string(),
            interval: Fixed::from_num(2),
            count: 2,
            on_deploy: false,
        });
        let mut pump = building("pump");
        pump.mana_production = Some(ManaProduction {
            amount: Fixed::ONE,
            interval: Fixed::from_num(4),
        });
        let mut imp = building("imp");
        imp.card_type = CardType::Ground;
        imp.lifetime = None;
        CardCatalog::new(vec![building("wall"), hut, pump, imp]).unwrap()
    }

    fn ctx(catalog: &CardCatalog, dt: f64, now: f64) -> LifecycleContext<'_> {
        LifecycleContext {
            catalog,
            dt: Fixed::from_num(dt),
            now: Fixed::from_num(now),
            policy: TimerPolicy::ResetOnFire,
            max_mana: Fixed::from_num(10),
        }
    }

    fn side_with(catalog: &CardCatalog, card_id: &str) -> [Side; 2] {
        let mut p1 = Side::new(SideId::P1, 100, Fixed::ZERO);
        p1.units.push(UnitInstance::new(
            1,
            catalog.get(card_id).unwrap(),
            SideId::P1,
            Vec2Fixed::from_ints(4, 4),
        ));
        [p1, Side::new(SideId::P2, 100, Fixed::ZERO)]
    }

    #[test]
    fn test_decay_is_linear() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "wall");

        run_lifecycle(&mut sides, &ctx(&catalog, 2.5, 0.0));
        assert_eq!(sides[0].units[0].hp, 750);

        run_lifecycle(&mut sides, &ctx(&catalog, 5.0, 2.5));
        assert_eq!(sides[0].units[0].hp, 250);
    }

    #[test]
    fn test_decay_keeps_lower_combat_hp() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "wall");
        sides[0].units[0].hp = 100;

        run_lifecycle(&mut sides, &ctx(&catalog, 1.0, 0.0));
        assert_eq!(sides[0].units[0].hp, 100);
    }

    #[test]
    fn test_decay_reaches_zero_at_lifetime() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "wall");

        for step in 0..10 {
            run_lifecycle(&mut sides, &ctx(&catalog, 1.0, f64::from(step)));
        }
        assert_eq!(sides[0].units[0].hp, 0);
        assert_eq!(sides[0].units[0].lifetime_remaining, Some(Fixed::ZERO));
    }

    #[test]
    fn test_spawner_fires_on_interval() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "hut");

        let outcome = run_lifecycle(&mut sides, &ctx(&catalog, 1.5, 0.0));
        assert!(outcome.spawns.is_empty());

        let outcome = run_lifecycle(&mut sides, &ctx(&catalog, 0.5, 1.5));
        assert_eq!(outcome.spawns.len(), 1);
        assert_eq!(outcome.spawns[0].card_id, "imp");
        assert_eq!(outcome.spawns[0].count, 2);
        assert_eq!(outcome.spawns[0].position, Vec2Fixed::from_ints(4, 4));
    }

    #[test]
    fn test_production_credits_owner_clamped() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "pump");
        sides[0].mana = Fixed::from_num(9.5);

        let outcome = run_lifecycle(&mut sides, &ctx(&catalog, 4.0, 0.0));
        assert_eq!(outcome.mana_produced[0], Fixed::ONE);
        assert_eq!(sides[0].mana, Fixed::from_num(10));
        assert_eq!(sides[1].mana, Fixed::ZERO);
    }

    #[test]
    fn test_burn_carries_fractions() {
        let catalog = catalog();
        let mut unit = UnitInstance::new(
            1,
            catalog.get("imp").unwrap(),
            SideId::P1,
            Vec2Fixed::ZERO,
        );
        unit.status.burn = Some(BurnState {
            damage_per_second: 10,
            until: Fixed::from_num(1),
            carry: Fixed::ZERO,
        });

        // 10 dps over 0.25s = 2.5 damage: 2 now, 0.5 carried.
        tick_status(&mut unit, Fixed::from_num(0.25), Fixed::ZERO);
        assert_eq!(unit.hp, 998);
        tick_status(&mut unit, Fixed::from_num(0.25), Fixed::from_num(0.25));
        assert_eq!(unit.hp, 995);

        // Past expiry: only the remaining active window burns, then it ends.
        tick_status(&mut unit, Fixed::from_num(1), Fixed::from_num(0.5));
        assert_eq!(unit.hp, 990);
        assert!(unit.status.burn.is_none());
    }

    #[test]
    fn test_decay_of_huge_hp_does_not_overflow() {
        let catalog = catalog();
        let mut sides = side_with(&catalog, "wall");
        sides[0].units[0].max_hp = u32::MAX;
        sides[0].units[0].hp = u32::MAX;

        run_lifecycle(&mut sides, &ctx(&catalog, 2.5, 0.0));
        let hp = sides[0].units[0].hp;
        assert!(hp > 0);
        assert!(hp < u32::MAX);
    }
}
