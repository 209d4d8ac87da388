//! Decision agent: a bot that plays one side through the same deploy
//! interface as a remote player.
//!
//! The agent only sees a [`MatchSnapshot`], the shared catalog and the
//! field layout. Each decision runs in stages:
//!
//! 1. Threat assessment over enemy units inside our half.
//! 2. Defense against the nearest threat: kite it (hard only), drop a
//!    defensive building, or deploy a counter picked by threat class.
//! 3. Offense when nothing threatens us: spend overflowing mana, push with
//!    a tank, or support a tank already on the field.
//!
//! Every chosen position is clamped into the field.

pub mod placement;
pub mod threat;

use std::cmp::Reverse;
use std::str::FromStr;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::components::{CadenceTimer, SideId};
use crate::config::{FieldLayout, MatchConfig, TimerPolicy};
use crate::data::{CardCatalog, CardDefinition};
use crate::facade::{CommandSink, DeployCommand};
use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::MatchSnapshot;

pub use placement::Placement;
pub use threat::{assess_threats, Threat, ThreatClass};

/// Highest cost a kiting decoy may have.
pub const KITE_MAX_COST: u32 = 3;

/// Mana below the cap at which the agent spends to avoid wasting regen.
pub const OVERFLOW_MARGIN: i32 = 1;

/// Counter preferences per threat class, best first.
const SPLASH_COUNTERS: &[&str] = &[
    "wizard",
    "baby_dragon",
    "arrows",
    "zap",
    "fireball",
    "ice_wizard",
    "fire_spirit",
];
const AIR_COUNTERS: &[&str] = &[
    "musketeer",
    "archers",
    "minions",
    "mega_minion",
    "baby_dragon",
    "tesla",
    "wizard",
    "arrows",
];
const TANK_COUNTERS: &[&str] = &[
    "mini_pekka",
    "prince",
    "knight",
    "guardian",
    "cannon",
    "tesla",
    "skeletons",
    "goblins",
];
const GENERIC_COUNTERS: &[&str] = &[
    "knight",
    "guardian",
    "mini_pekka",
    "musketeer",
    "archers",
    "goblins",
];

/// Cheap cards used to burn overflowing mana.
const LOW_COST_POOL: &[&str] = &[
    "skeletons",
    "goblins",
    "fire_spirit",
    "archers",
    "knight",
    "minions",
    "guardian",
    "ice_wizard",
    "spear_goblin",
];

/// Bot strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Slow decisions and noisy placement.
    Easy,
    /// Default.
    #[default]
    Medium,
    /// Fast decisions and kiting.
    Hard,
}

impl Difficulty {
    /// Seconds between decisions.
    #[must_use]
    pub fn decision_interval(self) -> Fixed {
        match self {
            Self::Easy => Fixed::from_num(2.5),
            Self::Medium => Fixed::from_num(1.5),
            Self::Hard => Fixed::from_num(0.8),
        }
    }

    /// Fraction of max mana above which the agent starts a push.
    #[must_use]
    pub fn push_threshold(self) -> Fixed {
        match self {
            Self::Easy => Fixed::from_num(0.9),
            Self::Medium => Fixed::from_num(0.8),
            Self::Hard => Fixed::from_num(0.7),
        }
    }

    /// Whether the agent pulls melee threats with decoys.
    #[must_use]
    pub const fn kites(self) -> bool {
        matches!(self, Self::Hard)
    }

    /// Maximum per-axis placement noise for counters.
    #[must_use]
    pub fn placement_noise(self) -> Option<Fixed> {
        match self {
            Self::Easy => Some(Fixed::from_num(2.5)),
            Self::Medium | Self::Hard => None,
        }
    }
}

/// Error for an unrecognized difficulty name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}' (expected easy, medium or hard)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Cheap decoy pulling a melee threat toward the center.
    Kite,
    /// Building dropped in front of our base.
    DefensiveBuilding,
    /// Class-based counter to the nearest threat.
    Counter,
    /// Cheap card spent to avoid sitting at the mana cap.
    Overflow,
    /// Tank sent from the back line.
    Push,
    /// Troop following a friendly tank.
    Support,
}

/// A deploy plus the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Rule that fired.
    pub stage: Stage,
    /// Command to send.
    pub command: DeployCommand,
}

/// Bot controlling one side.
#[derive(Debug, Clone)]
pub struct DecisionAgent {
    side: SideId,
    difficulty: Difficulty,
    catalog: Arc<CardCatalog>,
    field: FieldLayout,
    max_mana: Fixed,
    timer: CadenceTimer,
    rng: Pcg32,
}

impl DecisionAgent {
    /// Create an agent for `side`.
    #[must_use]
    pub fn new(
        side: SideId,
        difficulty: Difficulty,
        catalog: Arc<CardCatalog>,
        config: &MatchConfig,
        seed: u64,
    ) -> Self {
        Self {
            side,
            difficulty,
            catalog,
            field: config.field,
            max_mana: config.max_mana,
            timer: CadenceTimer::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Side this agent plays.
    #[must_use]
    pub const fn side(&self) -> SideId {
        self.side
    }

    /// Configured difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Advance the decision cadence by `dt` and decide if it elapsed.
    pub fn update(&mut self, dt: Fixed, snapshot: &MatchSnapshot) -> Option<DeployCommand> {
        self.poll(dt, snapshot).map(|decision| decision.command)
    }

    /// Like [`update`](Self::update), but submits the command to `sink`.
    pub fn act(
        &mut self,
        dt: Fixed,
        snapshot: &MatchSnapshot,
        sink: &mut impl CommandSink,
    ) -> Option<Decision> {
        let decision = self.poll(dt, snapshot)?;
        sink.deploy(&decision.command);
        Some(decision)
    }

    /// Run one decision immediately.
    pub fn decide(&mut self, snapshot: &MatchSnapshot) -> Option<DeployCommand> {
        self.plan(snapshot).map(|decision| decision.command)
    }

    fn poll(&mut self, dt: Fixed, snapshot: &MatchSnapshot) -> Option<Decision> {
        if snapshot.game_over {
            return None;
        }
        let interval = self.difficulty.decision_interval();
        if self.timer.advance(dt, interval, TimerPolicy::ResetOnFire) == 0 {
            return None;
        }
        self.plan(snapshot)
    }

    /// Run one decision and report which rule fired.
    pub fn plan(&mut self, snapshot: &MatchSnapshot) -> Option<Decision> {
        let own = snapshot.side(self.side);
        if snapshot.game_over || !own.joined {
            return None;
        }

        let catalog = Arc::clone(&self.catalog);
        let affordable: Vec<&CardDefinition> = own
            .hand
            .iter()
            .filter_map(|id| catalog.get(id))
            .filter(|card| Fixed::saturating_from_num(card.cost) <= own.mana)
            .filter(|card| !self.at_cap(card, snapshot))
            .collect();
        if affordable.is_empty() {
            return None;
        }

        let threats = assess_threats(snapshot, self.side, &self.field, &catalog);
        let decision = match threats.first() {
            Some(threat) => self.defend(threat, &affordable),
            None => self.attack(snapshot, &catalog, &affordable),
        }?;

        debug!(
            side = ?self.side,
            stage = ?decision.stage,
            card = %decision.command.card_id,
            x = %decision.command.position.x,
            y = %decision.command.position.y,
            "Agent decision"
        );
        Some(decision)
    }

    fn defend(&mut self, threat: &Threat<'_>, affordable: &[&CardDefinition]) -> Option<Decision> {
        let place = Placement::new(&self.field, self.side);
        let at = threat.unit.position;

        if self.difficulty.kites() && threat::is_kiteable(threat.card) {
            let decoy = affordable
                .iter()
                .copied()
                .filter(|card| is_troop(card) && card.cost <= KITE_MAX_COST)
                .min_by_key(|card| card.cost);
            if let Some(card) = decoy {
                let spot = place.kite(at);
                return Some(self.decision(Stage::Kite, card, spot));
            }
        }

        if threat::wants_building(threat.card) {
            let flying = threat.card.is_flying();
            let building = affordable.iter().copied().find(|card| {
                card.is_building() && card.is_combatant() && (!flying || card.reaches_air())
            });
            if let Some(card) = building {
                let spot = place.defensive_building();
                return Some(self.decision(Stage::DefensiveBuilding, card, spot));
            }
        }

        let card = pick_counter(ThreatClass::of(threat.card), affordable)?;
        let mut spot = place.counter(card, at);
        if let Some(noise) = self.difficulty.placement_noise() {
            spot = self.jitter(spot, noise);
        }
        Some(self.decision(Stage::Counter, card, spot))
    }

    fn attack(
        &mut self,
        snapshot: &MatchSnapshot,
        catalog: &CardCatalog,
        affordable: &[&CardDefinition],
    ) -> Option<Decision> {
        let mana = snapshot.side(self.side).mana;

        if mana >= self.max_mana - Fixed::from_num(OVERFLOW_MARGIN) {
            let card = pick_cheap(affordable)?;
            let spot = self.back_line_spot();
            return Some(self.decision(Stage::Overflow, card, spot));
        }

        let own_tank = snapshot.units_of(self.side).find(|unit| {
            catalog.get(&unit.card_id).is_some_and(is_push_tank)
        });

        match own_tank {
            Some(tank) => {
                let card = affordable
                    .iter()
                    .copied()
                    .filter(|card| is_troop(card) && !is_push_tank(card))
                    .min_by_key(|card| Reverse(card.range))?;
                let spot = Placement::new(&self.field, self.side).support(tank.position);
                Some(self.decision(Stage::Support, card, spot))
            }
            None => {
                if mana <= self.max_mana * self.difficulty.push_threshold() {
                    return None;
                }
                let card = affordable.iter().copied().find(|card| is_push_tank(card))?;
                let spot = self.back_line_spot();
                Some(self.decision(Stage::Push, card, spot))
            }
        }
    }

    fn decision(&self, stage: Stage, card: &CardDefinition, spot: Vec2Fixed) -> Decision {
        let position = Placement::new(&self.field, self.side).clamp(spot);
        Decision {
            stage,
            command: DeployCommand::new(self.side, card.id.clone(), position),
        }
    }

    fn back_line_spot(&mut self) -> Vec2Fixed {
        let place = Placement::new(&self.field, self.side);
        let lanes = place.lanes();
        let lane = lanes[self.rng.random_range(0..lanes.len())];
        place.back_line(lane)
    }

    fn jitter(&mut self, point: Vec2Fixed, noise: Fixed) -> Vec2Fixed {
        let bits = noise.to_bits();
        let dx = Fixed::from_bits(self.rng.random_range(-bits..=bits));
        let dy = Fixed::from_bits(self.rng.random_range(-bits..=bits));
        Vec2Fixed::new(point.x + dx, point.y + dy)
    }

    fn at_cap(&self, card: &CardDefinition, snapshot: &MatchSnapshot) -> bool {
        card.max_instances.is_some_and(|cap| {
            let live = snapshot
                .units_of(self.side)
                .filter(|unit| unit.card_id == card.id)
                .count();
            live + card.instance_count as usize > cap as usize
        })
    }
}

/// Mobile, non-spell card.
fn is_troop(card: &CardDefinition) -> bool {
    !card.is_spell() && !card.is_building()
}

/// Troop worth leading a push with.
fn is_push_tank(card: &CardDefinition) -> bool {
    is_troop(card) && (threat::is_tank(card) || card.favors_buildings())
}

fn preferences(class: ThreatClass) -> &'static [&'static str] {
    match class {
        ThreatClass::SplashVulnerable => SPLASH_COUNTERS,
        ThreatClass::Flying => AIR_COUNTERS,
        ThreatClass::Tank => TANK_COUNTERS,
        ThreatClass::Generic => GENERIC_COUNTERS,
    }
}

/// Best counter from the class table, then any non-spell, then anything.
fn pick_counter<'a>(
    class: ThreatClass,
    affordable: &[&'a CardDefinition],
) -> Option<&'a CardDefinition> {
    preferences(class)
        .iter()
        .find_map(|id| affordable.iter().copied().find(|card| card.id == *id))
        .or_else(|| affordable.iter().copied().find(|card| !card.is_spell()))
        .or_else(|| affordable.first().copied())
}

/// Cheapest low-cost-pool card, else the cheapest non-spell.
fn pick_cheap<'a>(affordable: &[&'a CardDefinition]) -> Option<&'a CardDefinition> {
    affordable
        .iter()
        .copied()
        .filter(|card| LOW_COST_POOL.contains(&card.id.as_str()))
        .min_by_key(|card| card.cost)
        .or_else(|| {
            affordable
                .iter()
                .copied()
                .filter(|card| !card.is_spell())
                .min_by_key(|card| card.cost)
        })
}
