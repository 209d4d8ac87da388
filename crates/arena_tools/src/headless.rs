//! Headless bot-vs-bot matches.
//!
//! Runs two [`DecisionAgent`]s against each other with a fixed timestep and
//! no wall clock, so a seed always replays to the same result.

use std::sync::Arc;

use arena_core::agent::{DecisionAgent, Difficulty};
use arena_core::components::{CardId, SideId};
use arena_core::config::MatchConfig;
use arena_core::data::CardCatalog;
use arena_core::math::{seconds_from_millis, Fixed};
use arena_core::simulation::Match;
use serde::Serialize;
use tracing::{debug, info};

use crate::{Result, ToolError};

/// Deck both bots play unless told otherwise.
pub const STANDARD_DECK: [&str; 8] = [
    "knight", "archers", "giant", "musketeer", "goblins", "minions", "cannon", "fireball",
];

/// Parameters for one headless match.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Seed for the match and both agents.
    pub seed: u64,
    /// Difficulty of the P1 bot.
    pub p1: Difficulty,
    /// Difficulty of the P2 bot.
    pub p2: Difficulty,
    /// Fixed timestep in milliseconds.
    pub dt_ms: u32,
    /// Time limit in simulated seconds.
    pub max_seconds: u32,
    /// Deck for both sides.
    pub deck: Vec<CardId>,
    /// Base rules; `seed` and `time_limit` are overridden.
    pub match_config: MatchConfig,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            p1: Difficulty::default(),
            p2: Difficulty::default(),
            dt_ms: 50,
            max_seconds: 600,
            deck: STANDARD_DECK.iter().map(|id| (*id).to_string()).collect(),
            match_config: MatchConfig::default(),
        }
    }
}

/// Outcome of a headless match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    /// Seed the match ran with.
    pub seed: u64,
    /// Winning side, `None` for a draw.
    pub winner: Option<SideId>,
    /// Simulated seconds at the end.
    pub elapsed_seconds: f64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Accepted deploys per side, indexed by [`SideId::index`].
    pub deploys: [u32; 2],
    /// Base hit points per side at the end.
    pub base_hp: [u32; 2],
    /// Hash of the final state, for replay comparisons.
    pub state_hash: u64,
}

/// Play a full bot-vs-bot match.
///
/// Each tick advances the match by `dt_ms`, then each bot looks at the
/// post-tick snapshot and may deploy.
///
/// # Errors
///
/// Fails on a zero timestep or time limit, or if the deck names a card
/// missing from `catalog`.
pub fn run_headless(catalog: Arc<CardCatalog>, config: &HeadlessConfig) -> Result<MatchSummary> {
    if config.dt_ms == 0 {
        return Err(ToolError::InvalidArguments("dt_ms must be positive".into()));
    }
    if config.max_seconds == 0 {
        return Err(ToolError::InvalidArguments(
            "max_seconds must be positive".into(),
        ));
    }

    for id in &config.deck {
        catalog.require(id)?;
    }

    let match_config = MatchConfig {
        time_limit: Some(Fixed::from_num(config.max_seconds)),
        ..config.match_config.clone()
    }
    .with_seed(config.seed);

    let mut game = Match::new(Arc::clone(&catalog), match_config.clone());
    let mut agents = Vec::with_capacity(2);
    for difficulty in [config.p1, config.p2] {
        let side = game.join(config.deck.clone())?;
        let seed = config.seed.wrapping_add(side.index() as u64 + 1);
        agents.push(DecisionAgent::new(
            side,
            difficulty,
            Arc::clone(&catalog),
            &match_config,
            seed,
        ));
    }

    info!(
        seed = config.seed,
        p1 = ?config.p1,
        p2 = ?config.p2,
        dt_ms = config.dt_ms,
        "Starting headless match"
    );

    let dt = seconds_from_millis(config.dt_ms);
    // The time limit always fires first; this only bounds a broken rule set.
    let max_ticks = u64::from(config.max_seconds) * 1000 / u64::from(config.dt_ms) + 2;
    let mut deploys = [0u32; 2];

    while !game.is_over() && game.current_tick() < max_ticks {
        if game.tick(dt).game_over.is_some() {
            break;
        }

        let snapshot = game.snapshot();
        for agent in &mut agents {
            let Some(command) = agent.update(dt, &snapshot) else {
                continue;
            };
            match game.try_deploy(command.side, &command.card_id, command.position) {
                Ok(_) => deploys[command.side.index()] += 1,
                Err(reason) => {
                    debug!(side = ?command.side, card_id = %command.card_id, %reason, "Bot deploy rejected");
                }
            }
        }
        // A spell may have finished a base between ticks.
        if game.take_game_over().is_some() {
            break;
        }
    }

    let summary = MatchSummary {
        seed: config.seed,
        winner: game.winner(),
        elapsed_seconds: game.elapsed().to_num::<f64>(),
        ticks: game.current_tick(),
        deploys,
        base_hp: SideId::ALL.map(|side| game.side(side).base_hp),
        state_hash: game.state_hash(),
    };

    info!(
        winner = ?summary.winner,
        ticks = summary.ticks,
        elapsed = summary.elapsed_seconds,
        "Headless match finished"
    );
    Ok(summary)
}
