//! The card catalog: every card definition available to a process.
//!
//! Loaded once, validated, then shared read-only (usually as
//! `Arc<CardCatalog>`) by every match, agent and tool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::card_data::{CardDefinition, StatusEffect};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Largest hp, shield, damage or burn rate a card may declare.
pub const MAX_CARD_STAT: u32 = 1_000_000;

/// Largest mana cost a card may declare.
pub const MAX_CARD_COST: u32 = 1_000;

/// Catalog embedded into the binary.
const BUILTIN_CATALOG: &str = include_str!("../../assets/cards.ron");

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Card definitions in authoring order.
    pub cards: Vec<CardDefinition>,
}

/// Immutable lookup table of card definitions.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
    index: HashMap<String, usize>,
}

impl CardCatalog {
    /// Build a catalog from definitions, validating it.
    pub fn new(cards: Vec<CardDefinition>) -> Result<Self> {
        let errors = validate_cards(&cards);
        if !errors.is_empty() {
            return Err(GameError::InvalidCatalog(errors.join("; ")));
        }

        let index = cards
            .iter()
            .enumerate()
            .map(|(i, card)| (card.id.clone(), i))
            .collect();

        Ok(Self { cards, index })
    }

    /// Parse and validate a catalog from RON text.
    ///
    /// `source_name` only appears in error messages.
    pub fn from_ron_str(text: &str, source_name: &str) -> Result<Self> {
        let file: CatalogFile = ron::from_str(text).map_err(|e| GameError::CatalogParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        Self::new(file.cards)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_ron_str(BUILTIN_CATALOG, "builtin")
    }

    /// Look up a card by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CardDefinition> {
        self.index.get(id).map(|&i| &self.cards[i])
    }

    /// Look up a card by id, failing with [`GameError::UnknownCard`].
    pub fn require(&self, id: &str) -> Result<&CardDefinition> {
        self.get(id)
            .ok_or_else(|| GameError::UnknownCard(id.to_string()))
    }

    /// Whether a card id is known.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All cards in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.iter()
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the catalog has no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Check a set of definitions for consistency.
///
/// Checks that:
/// - Card ids are unique
/// - Combatants have a positive attack cadence
/// - Spawners reference known cards
/// - Spells have a splash radius
/// - Instance counts and caps are coherent
/// - Costs and stats stay within [`MAX_CARD_COST`] and [`MAX_CARD_STAT`]
///
/// Returns a list of validation errors.
#[must_use]
pub fn validate_cards(cards: &[CardDefinition]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for card in cards {
        *seen.entry(card.id.as_str()).or_default() += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(&id, _)| id)
        .collect();
    duplicates.sort_unstable();
    for id in duplicates {
        errors.push(format!("Duplicate card id '{id}'"));
    }

    for card in cards {
        if card.cost > MAX_CARD_COST {
            errors.push(format!(
                "Card '{}' costs {} (max {MAX_CARD_COST})",
                card.id, card.cost
            ));
        }
        let burn = match card.effect {
            Some(StatusEffect::Burn {
                damage_per_second, ..
            }) => damage_per_second,
            _ => 0,
        };
        for (stat, value) in [
            ("hp", card.hp),
            ("shield", card.shield),
            ("damage", card.damage),
            ("burn", burn),
        ] {
            if value > MAX_CARD_STAT {
                errors.push(format!(
                    "Card '{}' has {stat} {value} (max {MAX_CARD_STAT})",
                    card.id
                ));
            }
        }

        if card.is_combatant() && card.attack_cadence <= Fixed::ZERO {
            errors.push(format!(
                "Card '{}' deals damage but has no attack cadence",
                card.id
            ));
        }

        if let Some(spawner) = &card.spawner {
            if !seen.contains_key(spawner.unit_id.as_str()) {
                errors.push(format!(
                    "Card '{}' spawns unknown card '{}'",
                    card.id, spawner.unit_id
                ));
            }
            if spawner.interval <= Fixed::ZERO {
                errors.push(format!("Card '{}' has a non-positive spawn interval", card.id));
            }
        }

        if let Some(production) = &card.mana_production {
            if production.interval <= Fixed::ZERO {
                errors.push(format!(
                    "Card '{}' has a non-positive production interval",
                    card.id
                ));
            }
        }

        if card.is_spell() && card.splash_radius.is_none() {
            errors.push(format!("Spell '{}' has no splash radius", card.id));
        }

        if card.is_combatant()
            && card.splash_radius.is_some()
            && card.may_target_tower()
            && !card.hits_tower
        {
            errors.push(format!(
                "Card '{}' splashes at the base but cannot damage it (set hits_tower)",
                card.id
            ));
        }

        if card.instance_count == 0 {
            errors.push(format!("Card '{}' creates zero instances", card.id));
        }

        if let Some(cap) = card.max_instances {
            if cap < card.instance_count {
                errors.push(format!(
                    "Card '{}' caps at {} but deploys {} instances",
                    card.id, cap, card.instance_count
                ));
            }
        }

        if card.lifetime.is_some_and(|lifetime| lifetime <= Fixed::ZERO) {
            errors.push(format!("Card '{}' has a non-positive lifetime", card.id));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CardType, SpawnerSpec};

    fn card(id: &str, card_type: CardType) -> CardDefinition {
        CardDefinition {
            id: id.to_string(),
            name: id.to_string(),
            card_type,
            cost: 3,
            hp: 300,
            damage: 50,
            speed: Fixed::ONE,
            range: Fixed::ONE,
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

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = CardCatalog::builtin().unwrap();
        assert!(catalog.len() >= 20);
        assert!(catalog.get("knight").is_some());
        assert!(catalog.get("mana_collector").is_some());
        assert!(catalog.get("no_such_card").is_none());
    }

    #[test]
    fn test_builtin_catalog_covers_every_trait() {
        let catalog = CardCatalog::builtin().unwrap();
        assert!(catalog.iter().any(|c| c.splash_radius.is_some() && !c.is_spell()));
        assert!(catalog.iter().any(|c| c.instance_count > 1));
        assert!(catalog.iter().any(|c| c.favorite_target.is_some()));
        assert!(catalog.iter().any(|c| c.spawner.as_ref().is_some_and(|s| s.on_deploy)));
        assert!(catalog.iter().any(|c| c.lifetime.is_some()));
        assert!(catalog.iter().any(|c| c.mana_production.is_some()));
        assert!(catalog.iter().any(|c| c.effect.is_some()));
        assert!(catalog.iter().any(|c| c.shield > 0));
        assert!(catalog.iter().any(|c| c.charge.is_some()));
        assert!(catalog.iter().any(|c| c.self_destruct));
        assert!(catalog.iter().any(|c| c.hits_tower));
        assert!(catalog.iter().any(|c| !c.can_target_air));
        assert!(catalog.iter().any(|c| c.max_instances.is_some()));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let cards = vec![card("a", CardType::Ground), card("a", CardType::Ground)];
        let errors = validate_cards(&cards);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Duplicate"));
        assert!(CardCatalog::new(cards).is_err());
    }

    #[test]
    fn test_spawner_reference_checked() {
        let mut hut = card("hut", CardType::Building);
        hut.spawner = Some(SpawnerSpec {
            unit_id: "ghost".to_string(),
            interval: Fixed::from_num(5),
            count: 1,
            on_deploy: false,
        });
        let errors = validate_cards(&[hut]);
        assert!(errors.iter().any(|e| e.contains("unknown card 'ghost'")));
    }

    #[test]
    fn test_spell_requires_splash() {
        let spell = card("bolt", CardType::Spell);
        let errors = validate_cards(&[spell]);
        assert!(errors.iter().any(|e| e.contains("splash")));
    }

    #[test]
    fn test_oversized_stats_rejected() {
        let mut fortress = card("fortress", CardType::Building);
        fortress.hp = 50_000_000;
        fortress.lifetime = Some(Fixed::from_num(70));
        let mut whale = card("whale", CardType::Ground);
        whale.cost = u32::MAX;
        whale.damage = MAX_CARD_STAT;

        let errors = validate_cards(&[fortress, whale]);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("'fortress' has hp 50000000")));
        assert!(errors.iter().any(|e| e.contains("'whale' costs")));
    }

    #[test]
    fn test_cap_below_instance_count_rejected() {
        let mut swarm = card("swarm", CardType::Ground);
        swarm.instance_count = 3;
        swarm.max_instances = Some(2);
        assert_eq!(validate_cards(&[swarm]).len(), 1);
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = CardCatalog::from_ron_str("(cards: [oops])", "broken.ron").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_require_unknown_card() {
        let catalog = CardCatalog::new(vec![card("a", CardType::Ground)]).unwrap();
        assert!(catalog.require("a").is_ok());
        assert!(matches!(
            catalog.require("b"),
            Err(GameError::UnknownCard(id)) if id == "b"
        ));
    }
}
