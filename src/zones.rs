//! Lookup from battle entities to their on-screen handles.
//!
//! Battle entities stay plain data in the store. The UI layer owns a
//! `ZoneRegistry`, keyed by entity id, holding whatever handle its renderer
//! uses (`H`) together with the zone bounds used for drop resolution.

use std::collections::HashMap;

use crate::geometry::{Point, Rect};
use crate::ids::{CharacterId, Team};
use crate::state::BattleState;
use crate::target::{DropTarget, TargetResolver};

#[derive(Debug, Clone)]
pub struct ZoneRegistry<H> {
    characters: HashMap<CharacterId, H>,
    resolver: TargetResolver,
}

impl<H> Default for ZoneRegistry<H> {
    fn default() -> Self {
        Self {
            characters: HashMap::new(),
            resolver: TargetResolver::new(),
        }
    }
}

impl<H> ZoneRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_character(&mut self, id: CharacterId, team: Team, bounds: Rect, handle: H) {
        self.characters.insert(id, handle);
        self.resolver.set_character_zone(id, team, bounds);
    }

    pub fn set_discard_zone(&mut self, bounds: Rect) {
        self.resolver.set_resource_zone(Some(bounds));
    }

    /// The on-screen handle of a character, for animation targeting.
    pub fn find_character_card(&self, id: CharacterId) -> Option<&H> {
        self.characters.get(&id)
    }

    pub fn drop_target(&self, x: f32, y: f32) -> Option<DropTarget> {
        self.resolver.hit_test(Point::new(x, y))
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    /// Forget characters that are no longer part of the battle and stop
    /// offering defeated ones as drop targets.
    pub fn sync_with_state(&mut self, state: &BattleState) {
        self.characters
            .retain(|id, _| state.find_character(*id).is_some());
        let stale: Vec<CharacterId> = self
            .resolver
            .character_zones()
            .iter()
            .map(|zone| zone.character)
            .filter(|id| {
                state
                    .find_character(*id)
                    .is_none_or(|(_, character)| !character.is_alive())
            })
            .collect();
        for id in stale {
            self.resolver.remove_character_zone(id);
        }
    }
}
