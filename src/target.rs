//! Drop-target resolution.
//!
//! Character zones are tested first, in registration order, using exact
//! bounds containment. The single resource zone (discard for energy) is the
//! catch-all tested last. The first match wins; zones are expected not to
//! overlap.

use std::fmt;

use crate::geometry::{Point, Rect};
use crate::ids::{CharacterId, Team};

/// Symbolic result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTarget {
    Character(CharacterId),
    Discard,
}

impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropTarget::Character(id) => write!(f, "character {}", id),
            DropTarget::Discard => write!(f, "discard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterZone {
    pub character: CharacterId,
    pub team: Team,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    character_zones: Vec<CharacterZone>,
    resource_zone: Option<Rect>,
}

impl TargetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or move the zone of a character.
    pub fn set_character_zone(&mut self, character: CharacterId, team: Team, bounds: Rect) {
        let zone = CharacterZone {
            character,
            team,
            bounds,
        };
        match self
            .character_zones
            .iter_mut()
            .find(|z| z.character == character)
        {
            Some(existing) => *existing = zone,
            None => self.character_zones.push(zone),
        }
    }

    pub fn remove_character_zone(&mut self, character: CharacterId) {
        self.character_zones.retain(|z| z.character != character);
    }

    pub fn set_resource_zone(&mut self, bounds: Option<Rect>) {
        self.resource_zone = bounds;
    }

    pub fn character_zones(&self) -> &[CharacterZone] {
        &self.character_zones
    }

    pub fn zone_bounds(&self, target: DropTarget) -> Option<Rect> {
        match target {
            DropTarget::Character(id) => self
                .character_zones
                .iter()
                .find(|z| z.character == id)
                .map(|z| z.bounds),
            DropTarget::Discard => self.resource_zone,
        }
    }

    pub fn hit_test(&self, point: Point) -> Option<DropTarget> {
        if let Some(zone) = self
            .character_zones
            .iter()
            .find(|z| z.bounds.contains(point))
        {
            return Some(DropTarget::Character(zone.character));
        }
        self.resource_zone
            .filter(|bounds| bounds.contains(point))
            .map(|_| DropTarget::Discard)
    }
}
