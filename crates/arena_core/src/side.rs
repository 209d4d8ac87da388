//! Per-side state: mana, base, deck rotation and owned units.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::components::{CardId, SideId, UnitId, UnitInstance};
use crate::data::CardCatalog;
use crate::math::Fixed;

/// One player's (or bot's) half of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Side {
    /// Which side this is.
    pub id: SideId,
    /// Whether a player has taken this seat.
    pub joined: bool,
    /// Current mana, always within `[0, max_mana]`.
    pub mana: Fixed,
    /// Remaining hit points of this side's base.
    pub base_hp: u32,
    /// Ordered deck as submitted on join.
    pub deck: Vec<CardId>,
    /// Cards that can be played right now.
    pub hand: Vec<CardId>,
    /// Card that replaces the next played hand slot.
    pub next_card: Option<CardId>,
    /// Units and buildings this side owns, in creation order.
    pub units: Vec<UnitInstance>,
}

impl Side {
    /// Create an empty seat.
    #[must_use]
    pub fn new(id: SideId, base_hp: u32, starting_mana: Fixed) -> Self {
        Self {
            id,
            joined: false,
            mana: starting_mana,
            base_hp,
            deck: Vec::new(),
            hand: Vec::new(),
            next_card: None,
            units: Vec::new(),
        }
    }

    /// Take the seat with `deck`.
    ///
    /// The hand is the leading `hand_size` entries and the next card is the
    /// entry after that. Short decks produce a partial hand and no next card.
    pub fn seat(&mut self, deck: Vec<CardId>, hand_size: usize) {
        self.hand = deck.iter().take(hand_size).cloned().collect();
        self.next_card = deck.get(hand_size).cloned();
        self.deck = deck;
        self.joined = true;
    }

    /// Hand slot holding `card_id`, if any.
    #[must_use]
    pub fn hand_slot(&self, card_id: &str) -> Option<usize> {
        self.hand.iter().position(|c| c == card_id)
    }

    /// Number of live instances of `card_id` owned by this side.
    #[must_use]
    pub fn live_instances(&self, card_id: &str) -> u32 {
        self.units
            .iter()
            .filter(|u| u.card_id == card_id && u.is_alive())
            .count() as u32
    }

    /// Add mana, clamped to `max_mana`.
    pub fn credit_mana(&mut self, amount: Fixed, max_mana: Fixed) {
        self.mana = self.mana.saturating_add(amount).clamp(Fixed::ZERO, max_mana);
    }

    /// Spend mana if there is enough.
    pub fn try_spend(&mut self, cost: u32) -> bool {
        let cost = Fixed::saturating_from_num(cost);
        if self.mana < cost {
            return false;
        }
        self.mana -= cost;
        true
    }

    /// Apply damage to the base, saturating at zero.
    pub fn damage_base(&mut self, amount: u32) {
        self.base_hp = self.base_hp.saturating_sub(amount);
    }

    /// Whether the base has fallen.
    #[must_use]
    pub const fn base_destroyed(&self) -> bool {
        self.base_hp == 0
    }

    /// Look up an owned unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Look up an owned unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitInstance> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Remove every unit with no hp left, returning their ids.
    pub fn remove_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        if !dead.is_empty() {
            self.units.retain(UnitInstance::is_alive);
        }
        dead
    }

    /// Replace a played hand slot and draw a new next card.
    ///
    /// The slot takes the current next card (or a fresh draw if there is
    /// none). The new next card is drawn uniformly from the whole deck,
    /// skipping cards whose per-side instance cap is reached; if that leaves
    /// nothing, the whole deck is used.
    pub fn cycle_hand(&mut self, slot: usize, catalog: &CardCatalog, rng: &mut Pcg32) {
        if slot >= self.hand.len() {
            return;
        }
        let replacement = match self.next_card.take() {
            Some(card) => Some(card),
            None => self.draw(catalog, rng),
        };
        match replacement {
            Some(card) => self.hand[slot] = card,
            None => {
                self.hand.remove(slot);
            }
        }
        self.next_card = self.draw(catalog, rng);
    }

    fn draw(&self, catalog: &CardCatalog, rng: &mut Pcg32) -> Option<CardId> {
        if self.deck.is_empty() {
            return None;
        }
        let eligible: Vec<&CardId> = self
            .deck
            .iter()
            .filter(|id| !self.at_cap(id, catalog))
            .collect();
        let pool: Vec<&CardId> = if eligible.is_empty() {
            self.deck.iter().collect()
        } else {
            eligible
        };
        let pick = rng.random_range(0..pool.len());
        Some(pool[pick].clone())
    }

    fn at_cap(&self, card_id: &str, catalog: &CardCatalog) -> bool {
        catalog
            .get(card_id)
            .and_then(|card| card.max_instances)
            .is_some_and(|cap| self.live_instances(card_id) >= cap)
    }
}
