//! Test fixtures and helpers.
//!
//! Pre-built catalogs, decks and matches for consistent testing.

use std::sync::Arc;

use arena_core::components::CardId;
use arena_core::config::MatchConfig;
use arena_core::data::CardCatalog;
use arena_core::simulation::Match;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The builtin catalog, shared.
///
/// # Panics
///
/// Panics if the embedded catalog fails validation.
#[must_use]
pub fn test_catalog() -> Arc<CardCatalog> {
    Arc::new(CardCatalog::builtin().expect("builtin catalog is valid"))
}

/// Turn string literals into a deck.
#[must_use]
pub fn deck(ids: &[&str]) -> Vec<CardId> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

/// A balanced eight-card deck.
///
/// Opening hand: knight, archers, fireball, giant. Next: goblins.
#[must_use]
pub fn standard_deck() -> Vec<CardId> {
    deck(&[
        "knight", "archers", "fireball", "giant", "goblins", "minions", "cannon", "zap",
    ])
}

/// Default config without deploy jitter, so positions are exact.
#[must_use]
pub fn exact_config() -> MatchConfig {
    MatchConfig {
        deploy_jitter: I32F32::ZERO,
        ..MatchConfig::default()
    }
}

/// A match with both sides seated with the given decks.
///
/// # Panics
///
/// Panics if the match refuses a join, which only happens when it is full.
#[must_use]
pub fn match_with_decks(config: MatchConfig, p1: Vec<CardId>, p2: Vec<CardId>) -> Match {
    let mut game = Match::new(test_catalog(), config);
    game.join(p1).expect("first seat is free");
    game.join(p2).expect("second seat is free");
    game
}

/// A match with both sides seated with [`standard_deck`].
#[must_use]
pub fn ready_match(config: MatchConfig) -> Match {
    match_with_decks(config, standard_deck(), standard_deck())
}
