//! Result log entries returned by the battle service.
//!
//! On the wire every entry is a flat object tagged by a string
//! `action_type`. Inside the client it becomes a [`BattleLogEntry`] whose
//! [`LogEvent`] has one variant per action type, so everything that
//! dispatches on the kind of entry (animation selection in particular) is
//! checked exhaustively. Types the client does not know decode into
//! [`LogEvent::Unknown`] instead of failing.

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, Team};
use crate::state::{BattleState, Card, CardInDeck};

/// Who performed the logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
}

/// Values of a target after the action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAfter {
    pub hp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTarget {
    pub id: CharacterId,
    pub team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<TargetAfter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    StartTurn,
    DrawCard {
        drawn_cards: Vec<CardInDeck>,
    },
    PlayCard {
        card: Option<Card>,
        targets: Vec<LogTarget>,
    },
    DiscardCard {
        card: Option<Card>,
    },
    Damage {
        targets: Vec<LogTarget>,
    },
    Heal {
        targets: Vec<LogTarget>,
    },
    EffectTrigger {
        card: Option<Card>,
        targets: Vec<LogTarget>,
    },
    EnergyUpdate,
    EndTurn,
    BattleEnd,
    Unknown {
        action_type: String,
        card: Option<Card>,
        targets: Vec<LogTarget>,
    },
}

impl LogEvent {
    pub fn action_type(&self) -> &str {
        match self {
            LogEvent::StartTurn => "start_turn",
            LogEvent::DrawCard { .. } => "draw_card",
            LogEvent::PlayCard { .. } => "play_card",
            LogEvent::DiscardCard { .. } => "discard_card",
            LogEvent::Damage { .. } => "damage",
            LogEvent::Heal { .. } => "heal",
            LogEvent::EffectTrigger { .. } => "effect_trigger",
            LogEvent::EnergyUpdate => "energy_update",
            LogEvent::EndTurn => "end_turn",
            LogEvent::BattleEnd => "battle_end",
            LogEvent::Unknown { action_type, .. } => action_type,
        }
    }

    pub fn targets(&self) -> &[LogTarget] {
        match self {
            LogEvent::PlayCard { targets, .. }
            | LogEvent::Damage { targets }
            | LogEvent::Heal { targets }
            | LogEvent::EffectTrigger { targets, .. }
            | LogEvent::Unknown { targets, .. } => targets,
            LogEvent::StartTurn
            | LogEvent::DrawCard { .. }
            | LogEvent::DiscardCard { .. }
            | LogEvent::EnergyUpdate
            | LogEvent::EndTurn
            | LogEvent::BattleEnd => &[],
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            LogEvent::PlayCard { card, .. }
            | LogEvent::DiscardCard { card }
            | LogEvent::EffectTrigger { card, .. }
            | LogEvent::Unknown { card, .. } => card.as_ref(),
            _ => None,
        }
    }
}

/// How a finished battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleOutcome {
    pub winner: Option<Team>,
    pub turn: Option<u32>,
}

impl BattleOutcome {
    /// Outcome read off a completed snapshot.
    pub fn from_state(state: &BattleState) -> Self {
        Self {
            winner: state
                .winner_team
                .or_else(|| state.defeated_team().map(Team::opponent)),
            turn: Some(state.current_turn),
        }
    }
}

/// One atomic, already resolved event from the battle service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireBattleLog", into = "WireBattleLog")]
pub struct BattleLogEntry {
    pub actor: Actor,
    pub event: LogEvent,
    /// Complete replacement snapshot, never a partial patch.
    pub after_state: Option<BattleState>,
    pub animation_hint: Option<String>,
}

impl BattleLogEntry {
    pub fn new(actor: Actor, event: LogEvent) -> Self {
        Self {
            actor,
            event,
            after_state: None,
            animation_hint: None,
        }
    }

    pub fn with_after_state(mut self, state: BattleState) -> Self {
        self.after_state = Some(state);
        self
    }

    pub fn action_type(&self) -> &str {
        self.event.action_type()
    }

    /// Whether this entry ends the battle: an explicit `battle_end`, a
    /// completed snapshot, or a snapshot with a wiped-out team.
    pub fn signals_battle_end(&self) -> bool {
        matches!(self.event, LogEvent::BattleEnd)
            || self
                .after_state
                .as_ref()
                .is_some_and(|s| s.is_completed() || s.defeated_team().is_some())
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        if !self.signals_battle_end() {
            return None;
        }
        Some(match &self.after_state {
            Some(state) => BattleOutcome::from_state(state),
            None => BattleOutcome {
                winner: None,
                turn: None,
            },
        })
    }
}

/// Flat, string-tagged shape used on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireBattleLog {
    action_type: String,
    actor: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    targets: Option<Vec<LogTarget>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    drawn_cards: Option<Vec<CardInDeck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after_state: Option<BattleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    animation_hint: Option<String>,
}

impl From<WireBattleLog> for BattleLogEntry {
    fn from(wire: WireBattleLog) -> Self {
        let targets = wire.targets.unwrap_or_default();
        let card = wire.card;
        let action_type = wire.action_type;
        let event = match action_type.as_str() {
            "start_turn" => LogEvent::StartTurn,
            "draw_card" => LogEvent::DrawCard {
                drawn_cards: wire.drawn_cards.unwrap_or_default(),
            },
            "play_card" => LogEvent::PlayCard { card, targets },
            "discard_card" => LogEvent::DiscardCard { card },
            "damage" => LogEvent::Damage { targets },
            "heal" => LogEvent::Heal { targets },
            "effect_trigger" => LogEvent::EffectTrigger { card, targets },
            "energy_update" => LogEvent::EnergyUpdate,
            "end_turn" => LogEvent::EndTurn,
            "battle_end" => LogEvent::BattleEnd,
            _ => LogEvent::Unknown {
                action_type: action_type.clone(),
                card,
                targets,
            },
        };
        Self {
            actor: wire.actor,
            event,
            after_state: wire.after_state,
            animation_hint: wire.animation_hint,
        }
    }
}

impl From<BattleLogEntry> for WireBattleLog {
    fn from(entry: BattleLogEntry) -> Self {
        let action_type = entry.event.action_type().to_string();
        let mut wire = WireBattleLog {
            action_type,
            actor: entry.actor,
            card: None,
            targets: None,
            drawn_cards: None,
            after_state: entry.after_state,
            animation_hint: entry.animation_hint,
        };
        match entry.event {
            LogEvent::DrawCard { drawn_cards } => wire.drawn_cards = Some(drawn_cards),
            LogEvent::PlayCard { card, targets }
            | LogEvent::EffectTrigger { card, targets }
            | LogEvent::Unknown { card, targets, .. } => {
                wire.card = card;
                wire.targets = Some(targets);
            }
            LogEvent::DiscardCard { card } => wire.card = card,
            LogEvent::Damage { targets } | LogEvent::Heal { targets } => {
                wire.targets = Some(targets)
            }
            LogEvent::StartTurn | LogEvent::EnergyUpdate | LogEvent::EndTurn | LogEvent::BattleEnd => {
            }
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::state;
    use serde_json::json;

    #[test]
    fn test_decode_play_card_entry() {
        let value = json!({
            "action_type": "play_card",
            "actor": {"team": 1, "character_id": 1},
            "card": {"id": "strike", "name": "Strike", "cost": 1},
            "targets": [{"id": 102, "team": 2, "after": {"hp": 4}}],
            "animation_hint": "slash"
        });
        let entry: BattleLogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.action_type(), "play_card");
        assert_eq!(entry.actor.character_id, Some(CharacterId(1)));
        assert_eq!(entry.event.targets()[0].id, CharacterId(102));
        assert_eq!(entry.event.targets()[0].after.map(|a| a.hp), Some(4));
        assert_eq!(entry.event.card().map(|c| c.name.as_str()), Some("Strike"));
        assert_eq!(entry.animation_hint.as_deref(), Some("slash"));
        assert!(entry.after_state.is_none());
    }

    #[test]
    fn test_unknown_action_type_is_kept() {
        let value = json!({"action_type": "summon", "actor": {"team": 2}});
        let entry: BattleLogEntry = serde_json::from_value(value).unwrap();
        assert!(matches!(entry.event, LogEvent::Unknown { .. }));
        assert_eq!(entry.action_type(), "summon");
    }

    #[test]
    fn test_encode_keeps_wire_shape() {
        let entry = BattleLogEntry::new(
            Actor {
                team: Team::One,
                character_id: None,
            },
            LogEvent::DrawCard {
                drawn_cards: vec![crate::state::fixtures::card(5)],
            },
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action_type"], "draw_card");
        assert_eq!(value["drawn_cards"][0]["id"], 5);
        assert!(value.get("targets").is_none());
        let back: BattleLogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_battle_end_detection() {
        let actor = Actor {
            team: Team::One,
            character_id: None,
        };
        let plain = BattleLogEntry::new(actor, LogEvent::EndTurn).with_after_state(state());
        assert!(!plain.signals_battle_end());
        assert_eq!(plain.outcome(), None);

        let mut wiped = state();
        for c in &mut wiped.players[1].characters {
            c.hp = 0;
        }
        let entry = BattleLogEntry::new(actor, LogEvent::Damage { targets: vec![] })
            .with_after_state(wiped);
        assert!(entry.signals_battle_end());
        assert_eq!(
            entry.outcome(),
            Some(BattleOutcome {
                winner: Some(Team::One),
                turn: Some(1)
            })
        );

        let explicit = BattleLogEntry::new(actor, LogEvent::BattleEnd);
        assert_eq!(
            explicit.outcome(),
            Some(BattleOutcome {
                winner: None,
                turn: None
            })
        );
    }

    #[test]
    fn test_completed_status_names_winner() {
        let mut done = state();
        done.status = crate::state::BattleStatus::Completed;
        done.winner_team = Some(Team::Two);
        let entry = BattleLogEntry::new(
            Actor {
                team: Team::Two,
                character_id: None,
            },
            LogEvent::EndTurn,
        )
        .with_after_state(done);
        assert_eq!(entry.outcome().and_then(|o| o.winner), Some(Team::Two));
    }
}
