//! Where the agent puts things.
//!
//! Positions are expressed relative to the agent's side: "forward" points
//! at the enemy base, "behind" points back at our own.

use crate::components::SideId;
use crate::config::FieldLayout;
use crate::data::CardDefinition;
use crate::math::{Fixed, Vec2Fixed};

/// Distance kept from every field edge.
pub const EDGE_MARGIN: f64 = 0.5;
/// Range from which a card counts as ranged for placement.
pub const RANGED_REACH: i32 = 3;
/// Fraction of its range a ranged counter stands back from the threat.
pub const RANGED_STANDOFF: f64 = 0.8;
/// How far ahead of the threat a melee counter lands.
pub const MELEE_LEAD: f64 = 0.5;
/// How far in front of a threat a kiting decoy lands.
pub const KITE_LEAD: i32 = 3;
/// How far forward of our base a defensive building goes.
pub const BUILDING_OFFSET: i32 = 4;
/// How far behind our base the back line is.
pub const BACK_LINE_OFFSET: f64 = 1.5;
/// How far behind a tank support troops go.
pub const SUPPORT_GAP: f64 = 1.5;

/// Placement helper bound to one side of one field.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    field: &'a FieldLayout,
    side: SideId,
}

impl<'a> Placement<'a> {
    /// Placement for `side` on `field`.
    #[must_use]
    pub const fn new(field: &'a FieldLayout, side: SideId) -> Self {
        Self { field, side }
    }

    /// Move `point` along the field toward the enemy by `distance`
    /// (negative moves it back toward our base).
    #[must_use]
    pub fn forward(&self, point: Vec2Fixed, distance: Fixed) -> Vec2Fixed {
        Vec2Fixed::new(point.x, point.y + distance * self.field.forward(self.side))
    }

    /// Decoy spot at the horizontal center, in front of the threat.
    #[must_use]
    pub fn kite(&self, threat: Vec2Fixed) -> Vec2Fixed {
        let ahead = self.forward(threat, -Fixed::from_num(KITE_LEAD));
        Vec2Fixed::new(self.field.center_x(), ahead.y)
    }

    /// Defensive building spot: centered, just forward of our base.
    #[must_use]
    pub fn defensive_building(&self) -> Vec2Fixed {
        let base = self.field.base_position(self.side);
        self.forward(base, Fixed::from_num(BUILDING_OFFSET))
    }

    /// Where `card` should land to answer a threat at `threat`.
    ///
    /// Spells land on the threat, ranged cards stand back by most of their
    /// range and melee cards land just ahead of it.
    #[must_use]
    pub fn counter(&self, card: &CardDefinition, threat: Vec2Fixed) -> Vec2Fixed {
        if card.is_spell() {
            threat
        } else if card.range >= Fixed::from_num(RANGED_REACH) {
            self.forward(threat, -(card.range * Fixed::from_num(RANGED_STANDOFF)))
        } else {
            self.forward(threat, -Fixed::from_num(MELEE_LEAD))
        }
    }

    /// Back-line spot in the given lane.
    #[must_use]
    pub fn back_line(&self, lane_x: Fixed) -> Vec2Fixed {
        let base = self.field.base_position(self.side);
        let behind = self.forward(base, -Fixed::from_num(BACK_LINE_OFFSET));
        Vec2Fixed::new(lane_x, behind.y)
    }

    /// Spot just behind a friendly tank.
    #[must_use]
    pub fn support(&self, tank: Vec2Fixed) -> Vec2Fixed {
        self.forward(tank, -Fixed::from_num(SUPPORT_GAP))
    }

    /// Lane x-coordinates: left, center and right.
    #[must_use]
    pub fn lanes(&self) -> [Fixed; 3] {
        let quarter = self.field.width / Fixed::from_num(4);
        [quarter, self.field.center_x(), self.field.width - quarter]
    }

    /// Clamp into the field with the edge margin.
    #[must_use]
    pub fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed {
        self.field
            .clamp_with_margin(point, Fixed::from_num(EDGE_MARGIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CardCatalog;

    #[test]
    fn test_kite_and_building_spots_face_the_right_way() {
        let field = FieldLayout::default();
        let p1 = Placement::new(&field, SideId::P1);
        let p2 = Placement::new(&field, SideId::P2);
        let threat = Vec2Fixed::from_ints(4, 12);

        assert_eq!(p1.kite(threat), Vec2Fixed::from_ints(9, 9));
        assert_eq!(p2.kite(Vec2Fixed::from_ints(4, 20)), Vec2Fixed::from_ints(9, 23));
        assert_eq!(p1.defensive_building(), Vec2Fixed::from_ints(9, 7));
        assert_eq!(p2.defensive_building(), Vec2Fixed::from_ints(9, 25));
    }

    #[test]
    fn test_counter_spots_by_range() {
        let catalog = CardCatalog::builtin().unwrap();
        let field = FieldLayout::default();
        let p1 = Placement::new(&field, SideId::P1);
        let threat = Vec2Fixed::from_ints(9, 12);

        let musketeer = p1.counter(catalog.get("musketeer").unwrap(), threat);
        assert_eq!(musketeer.x, Fixed::from_num(9));
        assert!(musketeer.y < Fixed::from_num(8) && musketeer.y > Fixed::from_num(7));

        let knight = p1.counter(catalog.get("knight").unwrap(), threat);
        assert_eq!(knight, Vec2Fixed::new(Fixed::from_num(9), Fixed::from_num(11.5)));

        let zap = p1.counter(catalog.get("zap").unwrap(), threat);
        assert_eq!(zap, threat);
    }

    #[test]
    fn test_back_line_and_clamp() {
        let field = FieldLayout::default();
        let p1 = Placement::new(&field, SideId::P1);
        let spot = p1.back_line(field.center_x());
        assert_eq!(spot, Vec2Fixed::new(Fixed::from_num(9), Fixed::from_num(1.5)));

        let clamped = p1.clamp(Vec2Fixed::from_ints(-3, -3));
        assert_eq!(clamped, Vec2Fixed::new(Fixed::from_num(0.5), Fixed::from_num(0.5)));
    }
}
