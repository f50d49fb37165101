use std::cell::Cell;
use std::rc::Rc;

/// Shared "player may interact" flag.
///
/// The session clears it for the duration of every phase handler and every
/// drop handler. UI components hold clones and refuse to start gestures
/// while it is clear. Single-threaded by construction.
#[derive(Debug, Clone)]
pub struct InteractionLock {
    interactable: Rc<Cell<bool>>,
}

impl Default for InteractionLock {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionLock {
    /// Starts locked: nothing is interactable before the battle loads.
    pub fn new() -> Self {
        Self {
            interactable: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_interactable(&self) -> bool {
        self.interactable.get()
    }

    pub(crate) fn lock(&self) {
        self.interactable.set(false);
    }

    pub(crate) fn unlock(&self) {
        self.interactable.set(true);
    }
}
