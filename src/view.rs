use crate::animation::Animation;
use crate::battle_log::BattleOutcome;
use crate::error::ClientError;
use crate::state::{BattleState, Phase};

/// Non-blocking messages for the player. Errors are dismissible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PhaseChanged(Phase),
    Error(ClientError),
    BattleOver(BattleOutcome),
}

/// Rendering collaborator driven by the session and the log player.
///
/// Calls are made in order from a single thread. [`BattleView::play`]
/// returns only once the animation has finished.
pub trait BattleView {
    /// Redraw hand, deck counters and energy.
    fn update_hand_zones(&mut self, state: &BattleState);

    /// Redraw characters and their hit points.
    fn update_character_zones(&mut self, state: &BattleState);

    fn update_all_zones(&mut self, state: &BattleState) {
        self.update_hand_zones(state);
        self.update_character_zones(state);
    }

    /// Play one animation to completion. `state` is already the snapshot
    /// the animation leads to.
    fn play(&mut self, animation: &Animation, state: Option<&BattleState>);

    fn notify(&mut self, notification: &Notification);

    /// Mirror of the interaction lock, for greying out controls.
    fn set_interactable(&mut self, _interactable: bool) {}
}
