//! # Arena Core
//!
//! Deterministic match simulation for Mana Arena.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond the embedded card catalog
//! - No system randomness (every match and agent owns a seeded RNG)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Authoritative servers driving many matches
//! - Headless bot-vs-bot simulation
//! - Determinism testing via [`simulation::Match::state_hash`]
//!
//! ## Crate Structure
//!
//! - [`data`] - Card definitions and the catalog
//! - [`simulation`] - The match and its tick loop
//! - [`combat`] - Targeting, attacks and splash
//! - [`lifecycle`] - Status effects, decay, spawners and mana production
//! - [`snapshot`] - Read-only views published each tick
//! - [`agent`] - Decision agent (bot)
//! - [`facade`] - Command interface shared by players and bots
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod combat;
pub mod components;
pub mod config;
pub mod data;
pub mod error;
pub mod facade;
pub mod lifecycle;
pub mod math;
pub mod side;
pub mod simulation;
pub mod snapshot;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Decision, DecisionAgent, Difficulty, Stage};
    pub use crate::components::*;
    pub use crate::config::{FieldLayout, MatchConfig, TimerPolicy};
    pub use crate::data::{CardCatalog, CardDefinition, CardType};
    pub use crate::error::{GameError, Result};
    pub use crate::facade::{CommandSink, DeployCommand};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::simulation::{DeployRejection, Match, TickEvents};
    pub use crate::snapshot::{GameOverEvent, MatchSnapshot, SideView, UnitView};
}
