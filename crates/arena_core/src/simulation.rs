//! The authoritative match simulation.
//!
//! A [`Match`] owns both sides and advances them with [`Match::tick`]. It is
//! fully deterministic: the same catalog, config (including the seed), join
//! order, deploy sequence and `dt` sequence always produce the same
//! [`Match::state_hash`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combat::{
    apply_splash, run_combat, select_target, split_sides, AttackEvent, CombatContext, Strike,
};
use crate::components::{CardId, SideId, Target, UnitId, UnitInstance};
use crate::config::MatchConfig;
use crate::data::{CardCatalog, CardDefinition};
use crate::error::{GameError, Result};
use crate::lifecycle::{run_lifecycle, LifecycleContext, SpawnRequest};
use crate::math::{Fixed, Vec2Fixed};
use crate::side::Side;
use crate::snapshot::{GameOverEvent, MatchSnapshot, SideView, UnitView};

/// Why a deploy was ignored.
///
/// [`Match::deploy`] swallows these (logging them at `debug`);
/// [`Match::try_deploy`] returns them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployRejection {
    /// The match has already ended.
    #[error("match is over")]
    GameOver,
    /// The side has no player.
    #[error("side has not joined")]
    NotJoined,
    /// Card id not present in the catalog.
    #[error("unknown card '{0}'")]
    UnknownCard(String),
    /// Card is not in the side's current hand.
    #[error("card '{0}' is not in hand")]
    NotInHand(String),
    /// Not enough mana.
    #[error("needs {required} mana, has {available}")]
    InsufficientMana {
        /// Card cost.
        required: u32,
        /// Mana at the time of the attempt.
        available: Fixed,
    },
    /// The side already has the maximum number of live instances.
    #[error("card '{card}' is capped at {cap} live instances")]
    InstanceCap {
        /// Capped card.
        card: String,
        /// Cap from the catalog.
        cap: u32,
    },
}

/// Events generated during a simulation tick.
///
/// Sessions and tools use these for logs and summaries; the snapshot is
/// what goes to players.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Attacks that fired.
    pub attacks: Vec<AttackEvent>,
    /// Units removed this tick.
    pub deaths: Vec<UnitId>,
    /// Units created by spawners this tick.
    pub spawned: Vec<UnitId>,
    /// Mana credited by producers, per side.
    pub mana_produced: [Fixed; 2],
    /// Set on the tick the match ends, and only then.
    pub game_over: Option<GameOverEvent>,
}

/// One match between two sides.
///
/// # Tick order
///
/// 1. **Mana** - regenerate and clamp
/// 2. **Movement** - units with nothing in reach march on the opposing base
/// 3. **Combat** - targeting and attacks
/// 4. **Cleanup** - remove dead units
/// 5. **Lifecycle** - status effects, decay, spawners, production
/// 6. **Cleanup** - remove dead units again
/// 7. **Win check** - time limit, then destroyed bases
#[derive(Debug, Clone)]
pub struct Match {
    catalog: Arc<CardCatalog>,
    config: MatchConfig,
    sides: [Side; 2],
    tick: u64,
    elapsed: Fixed,
    next_unit_id: UnitId,
    rng: Pcg32,
    game_over: bool,
    winner: Option<SideId>,
    pending_game_over: Option<GameOverEvent>,
}

impl Match {
    /// Create an empty match waiting for two players.
    #[must_use]
    pub fn new(catalog: Arc<CardCatalog>, config: MatchConfig) -> Self {
        let sides = [
            Side::new(SideId::P1, config.base_hp, config.starting_mana),
            Side::new(SideId::P2, config.base_hp, config.starting_mana),
        ];
        let rng = Pcg32::seed_from_u64(config.seed);
        Self {
            catalog,
            config,
            sides,
            tick: 0,
            elapsed: Fixed::ZERO,
            next_unit_id: 1,
            rng,
            game_over: false,
            winner: None,
            pending_game_over: None,
        }
    }

    /// Seat a player with `deck`.
    ///
    /// The first caller gets P1, the second P2. A third caller gets
    /// [`GameError::RoomFull`] and nothing changes.
    pub fn join(&mut self, deck: Vec<CardId>) -> Result<SideId> {
        let Some(side) = SideId::ALL
            .into_iter()
            .find(|id| !self.sides[id.index()].joined)
        else {
            return Err(GameError::RoomFull);
        };

        let unknown: Vec<&CardId> = deck.iter().filter(|id| !self.catalog.contains(id)).collect();
        if !unknown.is_empty() {
            warn!(?side, ?unknown, "Deck references unknown cards");
        }

        self.sides[side.index()].seat(deck, self.config.hand_size);
        info!(?side, "Side joined");
        Ok(side)
    }

    /// Deploy a card, silently ignoring invalid requests.
    ///
    /// Returns the ids of the units created (empty for spells and
    /// rejections).
    pub fn deploy(&mut self, side: SideId, card_id: &str, position: Vec2Fixed) -> Vec<UnitId> {
        match self.try_deploy(side, card_id, position) {
            Ok(ids) => ids,
            Err(reason) => {
                debug!(?side, card_id, %reason, "Deploy rejected");
                Vec::new()
            }
        }
    }

    /// Deploy a card, reporting why it was rejected.
    ///
    /// On success, mana is spent once, `instance_count` units appear around
    /// the clamped position (or the spell resolves there), the played hand
    /// slot cycles, and the win condition is re-evaluated.
    pub fn try_deploy(
        &mut self,
        side: SideId,
        card_id: &str,
        position: Vec2Fixed,
    ) -> std::result::Result<Vec<UnitId>, DeployRejection> {
        if self.game_over {
            return Err(DeployRejection::GameOver);
        }
        let seat = &self.sides[side.index()];
        if !seat.joined {
            return Err(DeployRejection::NotJoined);
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(card) = catalog.get(card_id) else {
            return Err(DeployRejection::UnknownCard(card_id.to_string()));
        };
        let Some(slot) = seat.hand_slot(card_id) else {
            return Err(DeployRejection::NotInHand(card_id.to_string()));
        };
        if seat.mana < Fixed::saturating_from_num(card.cost) {
            return Err(DeployRejection::InsufficientMana {
                required: card.cost,
                available: seat.mana,
            });
        }
        if let Some(cap) = card.max_instances {
            if seat.live_instances(card_id) + card.instance_count > cap {
                return Err(DeployRejection::InstanceCap {
                    card: card_id.to_string(),
                    cap,
                });
            }
        }

        let seat = &mut self.sides[side.index()];
        if !seat.try_spend(card.cost) {
            return Err(DeployRejection::InsufficientMana {
                required: card.cost,
                available: seat.mana,
            });
        }

        let position = self.config.field.clamp(position);
        let ids = if card.is_spell() {
            self.resolve_spell(side, card, position);
            Vec::new()
        } else {
            let ids = self.spawn_units(side, card, position, card.instance_count);
            if let Some(spawner) = card.spawner.as_ref().filter(|s| s.on_deploy) {
                for &id in &ids {
                    let Some(origin) = self.sides[side.index()].unit(id).map(|u| u.position) else {
                        continue;
                    };
                    self.realize_spawn(&SpawnRequest {
                        side,
                        card_id: spawner.unit_id.clone(),
                        position: origin,
                        count: spawner.count,
                    });
                }
            }
            ids
        };

        self.sides[side.index()].cycle_hand(slot, &catalog, &mut self.rng);

        for seat in &mut self.sides {
            seat.remove_dead();
        }
        if let Some(event) = self.check_game_over() {
            self.pending_game_over = Some(event);
        }

        Ok(ids)
    }

    /// Advance the match by `dt` seconds.
    ///
    /// No-op until both sides have joined, after the match ends, and for
    /// non-positive `dt`.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        let mut events = TickEvents::default();
        if self.game_over || !self.both_joined() || dt <= Fixed::ZERO {
            return events;
        }
        let now = self.elapsed;
        let catalog = Arc::clone(&self.catalog);

        // 1. Mana
        let regen = self.config.mana_regen_per_second * dt;
        for side in &mut self.sides {
            side.credit_mana(regen, self.config.max_mana);
        }

        // 2. Movement
        self.run_movement(&catalog, dt, now);

        // 3. Combat
        let combat = CombatContext {
            catalog: &catalog,
            field: &self.config.field,
            dt,
            now,
            policy: self.config.timer_policy,
        };
        events.attacks = run_combat(&mut self.sides, &combat);

        // 4. Cleanup
        for side in &mut self.sides {
            events.deaths.extend(side.remove_dead());
        }

        // 5. Lifecycle
        let lifecycle = LifecycleContext {
            catalog: &catalog,
            dt,
            now,
            policy: self.config.timer_policy,
            max_mana: self.config.max_mana,
        };
        let outcome = run_lifecycle(&mut self.sides, &lifecycle);
        events.mana_produced = outcome.mana_produced;
        for request in &outcome.spawns {
            events.spawned.extend(self.realize_spawn(request));
        }

        // 6. Cleanup
        for side in &mut self.sides {
            events.deaths.extend(side.remove_dead());
        }

        self.elapsed += dt;
        self.tick += 1;

        // 7. Win check
        events.game_over = self.check_game_over();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Match state hash");
        }

        events
    }

    /// Game-over event produced by a deploy (a spell finishing a base).
    ///
    /// Returns the event once; later calls return `None`.
    pub fn take_game_over(&mut self) -> Option<GameOverEvent> {
        self.pending_game_over.take()
    }

    /// Public view of the match.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            sides: [
                SideView::from_side(&self.sides[0]),
                SideView::from_side(&self.sides[1]),
            ],
            units: self
                .units()
                .map(|unit| UnitView::from_instance(unit, self.elapsed))
                .collect(),
            game_over: self.game_over,
            winner: self.winner,
        }
    }

    /// Calculate a hash of the current match state.
    ///
    /// Two matches with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.elapsed.hash(&mut hasher);
        self.next_unit_id.hash(&mut hasher);
        self.sides.hash(&mut hasher);
        self.game_over.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        hasher.finish()
    }

    /// State of one side.
    #[must_use]
    pub fn side(&self, side: SideId) -> &Side {
        &self.sides[side.index()]
    }

    /// All live units, P1's first.
    pub fn units(&self) -> impl Iterator<Item = &UnitInstance> {
        self.sides.iter().flat_map(|side| side.units.iter())
    }

    /// Look up a unit on either side.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units().find(|u| u.id == id)
    }

    /// Whether both seats are taken.
    #[must_use]
    pub fn both_joined(&self) -> bool {
        self.sides.iter().all(|side| side.joined)
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over
    }

    /// Winner once the match has ended (`None` for a draw or while running).
    #[must_use]
    pub const fn winner(&self) -> Option<SideId> {
        self.winner
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Shared card catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    fn run_movement(&mut self, catalog: &CardCatalog, dt: Fixed, now: Fixed) {
        for side in SideId::ALL {
            let goal = self.config.field.march_goal(side);
            let (own, enemy) = split_sides(&mut self.sides, side);
            for unit in own.units.iter_mut().filter(|u| u.is_alive()) {
                let Some(card) = catalog.get(&unit.card_id) else {
                    continue;
                };
                if !card.is_mobile() || unit.status.is_stunned(now) {
                    continue;
                }

                // Targets are re-picked from current positions, so a unit
                // whose target walked out of range moves on this same tick.
                unit.target = if card.is_combatant() {
                    select_target(card, unit.position, &enemy.units, goal, catalog)
                } else {
                    Target::None
                };
                if unit.target.is_active() || unit.position.within(goal, card.range) {
                    continue;
                }

                let mut speed = card.speed * unit.status.slow_factor(now);
                if let Some(charge) = card.charge.filter(|_| unit.status.charged) {
                    speed = speed.saturating_mul(charge.speed_multiplier);
                }
                let (position, moved) = unit.position.step_toward(goal, speed * dt);
                unit.position = position;

                if let Some(charge) = card.charge {
                    if !unit.status.charged {
                        unit.status.charge_distance += moved;
                        if unit.status.charge_distance >= charge.distance {
                            unit.status.charged = true;
                        }
                    }
                }
            }
        }
    }

    fn resolve_spell(&mut self, side: SideId, card: &CardDefinition, center: Vec2Fixed) {
        let Some(radius) = card.splash_radius else {
            return;
        };
        let enemy_base = self.config.field.base_position(side.opponent());
        let strike = Strike::from_card(card, card.damage);
        let enemy = &mut self.sides[side.opponent().index()];
        let outcome = apply_splash(enemy, enemy_base, center, radius, &strike, self.elapsed);
        debug!(
            ?side,
            spell = %card.id,
            units_hit = outcome.units_hit.len(),
            base_hit = outcome.base_hit,
            "Spell resolved"
        );
    }

    fn spawn_units(
        &mut self,
        side: SideId,
        card: &CardDefinition,
        origin: Vec2Fixed,
        count: u32,
    ) -> Vec<UnitId> {
        let mut ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = self.jitter();
            let position = self.config.field.clamp(origin + offset);
            let id = self.next_unit_id;
            self.next_unit_id += 1;
            self.sides[side.index()]
                .units
                .push(UnitInstance::new(id, card, side, position));
            ids.push(id);
        }
        ids
    }

    fn realize_spawn(&mut self, request: &SpawnRequest) -> Vec<UnitId> {
        let catalog = Arc::clone(&self.catalog);
        let Some(card) = catalog.get(&request.card_id) else {
            warn!(card_id = %request.card_id, "Spawner references unknown card");
            return Vec::new();
        };
        self.spawn_units(request.side, card, request.position, request.count)
    }

    /// Random per-axis offset within `deploy_jitter`.
    fn jitter(&mut self) -> Vec2Fixed {
        let bits = self.config.deploy_jitter.to_bits();
        if bits <= 0 {
            return Vec2Fixed::ZERO;
        }
        let x = Fixed::from_bits(self.rng.random_range(-bits..=bits));
        let y = Fixed::from_bits(self.rng.random_range(-bits..=bits));
        Vec2Fixed::new(x, y)
    }

    /// Evaluate the time limit and destroyed bases.
    ///
    /// Returns the terminal event on the transition only.
    fn check_game_over(&mut self) -> Option<GameOverEvent> {
        if self.game_over {
            return None;
        }
        let p1 = &self.sides[SideId::P1.index()];
        let p2 = &self.sides[SideId::P2.index()];
        let time_up = self
            .config
            .time_limit
            .is_some_and(|limit| self.elapsed >= limit);

        let winner = match (p1.base_destroyed(), p2.base_destroyed()) {
            (true, true) => None,
            (true, false) => Some(SideId::P2),
            (false, true) => Some(SideId::P1),
            (false, false) if time_up => match p1.base_hp.cmp(&p2.base_hp) {
                std::cmp::Ordering::Greater => Some(SideId::P1),
                std::cmp::Ordering::Less => Some(SideId::P2),
                std::cmp::Ordering::Equal => None,
            },
            (false, false) => return None,
        };

        self.game_over = true;
        self.winner = winner;
        info!(
            ?winner,
            elapsed = self.elapsed.to_num::<f64>(),
            tick = self.tick,
            "Match over"
        );
        Some(GameOverEvent { winner })
    }
}
