//! Unified command interface for players and bots.
//!
//! Remote players and the decision agent both act through [`CommandSink`].
//! There is no other way to change a match from the outside, so a bot
//! can never do anything a player could not.

use serde::{Deserialize, Serialize};

use crate::components::{CardId, SideId};
use crate::math::Vec2Fixed;
use crate::simulation::Match;

/// A request to play a card at a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeployCommand {
    /// Acting side.
    pub side: SideId,
    /// Card to play.
    pub card_id: CardId,
    /// Requested position; the match clamps it to the field.
    pub position: Vec2Fixed,
}

impl DeployCommand {
    /// Create a deploy command.
    #[must_use]
    pub fn new(side: SideId, card_id: impl Into<CardId>, position: Vec2Fixed) -> Self {
        Self {
            side,
            card_id: card_id.into(),
            position,
        }
    }
}

/// Anything that accepts deploy commands.
///
/// Delivery is fire-and-forget: invalid commands are dropped by the match,
/// exactly as for a remote player.
pub trait CommandSink {
    /// Submit one deploy command.
    fn deploy(&mut self, command: &DeployCommand);
}

impl CommandSink for Match {
    fn deploy(&mut self, command: &DeployCommand) {
        Match::deploy(self, command.side, &command.card_id, command.position);
    }
}

/// Collects commands instead of applying them.
impl CommandSink for Vec<DeployCommand> {
    fn deploy(&mut self, command: &DeployCommand) {
        self.push(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::MatchConfig;
    use crate::data::CardCatalog;
    use crate::math::Fixed;

    #[test]
    fn test_match_accepts_commands_through_sink() {
        let catalog = Arc::new(CardCatalog::builtin().unwrap());
        let mut game = Match::new(catalog, MatchConfig::default());
        let deck: Vec<CardId> = vec!["knight".to_string()];
        game.join(deck.clone()).unwrap();
        game.join(deck).unwrap();

        let command = DeployCommand::new(SideId::P1, "knight", Vec2Fixed::from_ints(9, 8));
        CommandSink::deploy(&mut game, &command);

        assert_eq!(game.units().count(), 1);
        assert_eq!(game.side(SideId::P1).mana, Fixed::from_num(2));
    }

    #[test]
    fn test_invalid_command_is_dropped() {
        let catalog = Arc::new(CardCatalog::builtin().unwrap());
        let mut game = Match::new(catalog, MatchConfig::default());
        game.join(vec!["knight".to_string()]).unwrap();
        game.join(vec!["knight".to_string()]).unwrap();

        let command = DeployCommand::new(SideId::P2, "giant", Vec2Fixed::from_ints(9, 20));
        CommandSink::deploy(&mut game, &command);
        assert_eq!(game.units().count(), 0);
    }

    #[test]
    fn test_vec_sink_records() {
        let mut log: Vec<DeployCommand> = Vec::new();
        let command = DeployCommand::new(SideId::P2, "zap", Vec2Fixed::ZERO);
        log.deploy(&command);
        assert_eq!(log, vec![command]);
    }
}
