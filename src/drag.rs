//! Drag gesture for card tokens in hand.
//!
//! A drag keeps the offset between the pointer and the token at press time,
//! so the token never snaps to the pointer. While it moves, the target under
//! the pointer is resolved continuously and zone enter/leave feedback fires
//! whenever the highlighted target changes. Releasing either yields a
//! [`DropIntent`] for the owner to act on or sends the token back to its
//! current slot in hand.

use std::fmt;

use crate::geometry::{Point, Vec2};
use crate::ids::CardId;
use crate::interaction::InteractionLock;
use crate::state::DeckState;
use crate::target::{DropTarget, TargetResolver};

/// What the drag controller needs from the renderer.
pub trait TokenSurface {
    /// Current on-screen position of the token for `card`.
    fn token_position(&self, card: CardId) -> Option<Point>;

    /// Reparent the token to the top-level overlay so it renders above everything.
    fn lift_to_overlay(&mut self, card: CardId);

    fn move_token(&mut self, card: CardId, position: Point);

    fn zone_entered(&mut self, target: DropTarget);

    fn zone_left(&mut self, target: DropTarget);

    /// Animate the token back into the hand at `slot`.
    fn return_to_hand(&mut self, card: CardId, slot: usize);

    /// The card is no longer in hand; remove its token.
    fn remove_token(&mut self, card: CardId);
}

/// A card dropped on a resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropIntent {
    pub card: CardId,
    pub target: DropTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Dropped(DropIntent),
    /// No target under the pointer; the token went back to `slot`.
    Reverted { card: CardId, slot: usize },
    /// The card left the hand during the drag.
    Vanished { card: CardId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragError {
    InteractionLocked,
    AlreadyDragging(CardId),
    NoToken(CardId),
    NotDragging,
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragError::InteractionLocked => write!(f, "interaction is locked"),
            DragError::AlreadyDragging(card) => write!(f, "card {} is already being dragged", card),
            DragError::NoToken(card) => write!(f, "no token for card {}", card),
            DragError::NotDragging => write!(f, "no drag in progress"),
        }
    }
}

impl std::error::Error for DragError {}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    card: CardId,
    grab_offset: Vec2,
    hovered: Option<DropTarget>,
}

#[derive(Debug)]
pub struct DragGestureController {
    lock: InteractionLock,
    active: Option<ActiveDrag>,
}

impl DragGestureController {
    pub fn new(lock: InteractionLock) -> Self {
        Self { lock, active: None }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_card(&self) -> Option<CardId> {
        self.active.map(|drag| drag.card)
    }

    pub fn hovered(&self) -> Option<DropTarget> {
        self.active.and_then(|drag| drag.hovered)
    }

    /// Pointer pressed on the token of `card`.
    pub fn begin(
        &mut self,
        card: CardId,
        pointer: Point,
        surface: &mut dyn TokenSurface,
    ) -> Result<(), DragError> {
        if let Some(active) = self.active {
            return Err(DragError::AlreadyDragging(active.card));
        }
        if !self.lock.is_interactable() {
            return Err(DragError::InteractionLocked);
        }
        let origin = surface
            .token_position(card)
            .ok_or(DragError::NoToken(card))?;

        surface.lift_to_overlay(card);
        self.active = Some(ActiveDrag {
            card,
            grab_offset: pointer - origin,
            hovered: None,
        });
        log::debug!("drag start: card {card}");
        Ok(())
    }

    /// Pointer moved. Returns the target currently under the pointer.
    pub fn move_to(
        &mut self,
        pointer: Point,
        resolver: &TargetResolver,
        surface: &mut dyn TokenSurface,
    ) -> Option<DropTarget> {
        let drag = self.active.as_mut()?;
        surface.move_token(drag.card, pointer - drag.grab_offset);

        let candidate = resolver.hit_test(pointer);
        if candidate != drag.hovered {
            if let Some(previous) = drag.hovered {
                surface.zone_left(previous);
            }
            if let Some(next) = candidate {
                surface.zone_entered(next);
            }
            drag.hovered = candidate;
        }
        candidate
    }

    /// Pointer released. `hand` is the hand as it is now, not as it was
    /// when the drag began.
    pub fn release(
        &mut self,
        pointer: Point,
        resolver: &TargetResolver,
        hand: &DeckState,
        surface: &mut dyn TokenSurface,
    ) -> Result<DragOutcome, DragError> {
        let drag = self.active.take().ok_or(DragError::NotDragging)?;
        if let Some(previous) = drag.hovered {
            surface.zone_left(previous);
        }

        match resolver.hit_test(pointer) {
            Some(target) => {
                log::debug!("drag drop: card {} on {}", drag.card, target);
                Ok(DragOutcome::Dropped(DropIntent {
                    card: drag.card,
                    target,
                }))
            }
            None => Ok(Self::send_back(drag.card, hand, surface)),
        }
    }

    /// Abort the drag and send the token home.
    pub fn cancel(&mut self, hand: &DeckState, surface: &mut dyn TokenSurface) -> Option<DragOutcome> {
        let drag = self.active.take()?;
        if let Some(previous) = drag.hovered {
            surface.zone_left(previous);
        }
        Some(Self::send_back(drag.card, hand, surface))
    }

    fn send_back(card: CardId, hand: &DeckState, surface: &mut dyn TokenSurface) -> DragOutcome {
        match hand.hand_position(card) {
            Some(slot) => {
                surface.return_to_hand(card, slot);
                DragOutcome::Reverted { card, slot }
            }
            None => {
                surface.remove_token(card);
                DragOutcome::Vanished { card }
            }
        }
    }
}
