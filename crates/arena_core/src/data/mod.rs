//! Card data: static definitions and the catalog that holds them.
//!
//! All structs here deserialize from RON. Apart from the embedded default
//! catalog this module does no IO; tools read files and hand the text over.

mod card_data;
mod catalog;

pub use card_data::{
    CardDefinition, CardType, ChargeSpec, ManaProduction, ProjectileKind, SpawnerSpec,
    StatusEffect, TargetCategory, MELEE_AIR_REACH,
};
pub use catalog::{validate_cards, CardCatalog, CatalogFile};
