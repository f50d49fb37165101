//! Holder of the single authoritative battle snapshot.

use crate::state::{BattleState, StateError};

/// One battle snapshot, replaced wholesale on every confirmed response.
///
/// Readers borrow the snapshot immutably. Only the session and the log
/// player replace it, through the crate-private [`BattleStateStore::replace`].
#[derive(Debug, Default)]
pub struct BattleStateStore {
    current: Option<BattleState>,
    revision: u64,
}

impl BattleStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a starting snapshot, for replays.
    pub fn with_state(state: BattleState) -> Result<Self, StateError> {
        let mut store = Self::new();
        store.replace(state)?;
        Ok(store)
    }

    pub fn get(&self) -> Option<&BattleState> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Number of replacements so far. Zero until the first snapshot lands.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the snapshot. An invalid snapshot is refused and the previous
    /// one stays in place.
    pub(crate) fn replace(&mut self, state: BattleState) -> Result<&BattleState, StateError> {
        state.validate()?;
        self.revision += 1;
        log::debug!(
            "battle state r{}: turn {} {} {}",
            self.revision,
            state.current_turn,
            state.current_player,
            state.phase
        );
        let state: &BattleState = self.current.insert(state);
        Ok(state)
    }
}
