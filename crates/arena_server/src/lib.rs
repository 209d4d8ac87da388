//! # Arena Server
//!
//! Hosts matches without rendering. Each match is owned by a single tokio
//! task; joins, deploys and shutdown reach it through a command channel and
//! snapshots leave it through a broadcast channel.
//!
//! Transport is out of scope here: a network layer would forward decoded
//! client messages into a [`session::SessionHandle`] or the
//! [`lobby::Lobby`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod lobby;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use arena_core::agent::Difficulty;
use arena_core::components::CardId;
use arena_core::config::MatchConfig;
use arena_core::data::CardCatalog;
use arena_core::error::GameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default simulation rate in ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Maximum concurrent rooms in a lobby.
    pub max_rooms: usize,
    /// Rules for every match hosted by this server.
    pub match_config: MatchConfig,
    /// Difficulty of bot seats.
    pub bot_difficulty: Difficulty,
    /// Deck bot seats join with.
    pub bot_deck: Vec<CardId>,
    /// Catalog file; `None` uses the embedded catalog.
    pub catalog_path: Option<String>,
    /// Snapshots buffered per subscriber before it starts lagging.
    pub snapshot_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_rooms: 64,
            match_config: MatchConfig::default(),
            bot_difficulty: Difficulty::default(),
            bot_deck: [
                "knight", "archers", "giant", "musketeer", "goblins", "minions", "cannon",
                "fireball",
            ]
            .iter()
            .map(|id| (*id).to_string())
            .collect(),
            catalog_path: None,
            snapshot_buffer: 64,
        }
    }
}

impl ServerConfig {
    /// Parse a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, GameError> {
        ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Wall-clock time between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Load the configured catalog, or the embedded one.
    pub fn load_catalog(&self) -> Result<Arc<CardCatalog>, GameError> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| GameError::CatalogParse {
                    source_name: path.clone(),
                    message: e.to_string(),
                })?;
                CardCatalog::from_ron_str(&text, path)?
            }
            None => CardCatalog::builtin()?,
        };
        Ok(Arc::new(catalog))
    }
}

/// Errors surfaced by sessions and the lobby.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task has ended.
    #[error("Session closed")]
    Closed,

    /// The match refused the request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// No room with this id.
    #[error("Unknown room: {0}")]
    UnknownRoom(u64),
}
