//! Animation selection for log entries.
//!
//! [`animation_for`] is a pure function of the entry's event. Each
//! [`LogEvent`] variant maps to exactly one [`Animation`]; unknown action
//! types get a generic callout.

use crate::battle_log::{BattleLogEntry, LogEvent, LogTarget};
use crate::ids::{CardId, CharacterId, Team};
use crate::state::Card;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Animation {
    TurnBanner {
        team: Team,
    },
    CardsDrawn {
        team: Team,
        cards: Vec<CardId>,
    },
    /// A card flies from `source` (or the hand) and strikes each target.
    CardStrike {
        team: Team,
        source: Option<CharacterId>,
        card: Option<Card>,
        targets: Vec<LogTarget>,
        hint: Option<String>,
    },
    CardDiscarded {
        team: Team,
        card: Option<Card>,
    },
    DamageNumbers {
        targets: Vec<LogTarget>,
    },
    HealNumbers {
        targets: Vec<LogTarget>,
    },
    EffectPulse {
        source: Option<CharacterId>,
        card: Option<Card>,
        targets: Vec<LogTarget>,
    },
    EnergyGauge {
        team: Team,
    },
    TurnEnded {
        team: Team,
    },
    Victory,
    Callout {
        label: String,
    },
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::TurnBanner { .. } => "turn_banner",
            Animation::CardsDrawn { .. } => "cards_drawn",
            Animation::CardStrike { .. } => "card_strike",
            Animation::CardDiscarded { .. } => "card_discarded",
            Animation::DamageNumbers { .. } => "damage_numbers",
            Animation::HealNumbers { .. } => "heal_numbers",
            Animation::EffectPulse { .. } => "effect_pulse",
            Animation::EnergyGauge { .. } => "energy_gauge",
            Animation::TurnEnded { .. } => "turn_ended",
            Animation::Victory => "victory",
            Animation::Callout { .. } => "callout",
        }
    }

    /// Characters the animation touches, for handle lookup.
    pub fn characters(&self) -> Vec<CharacterId> {
        match self {
            Animation::CardStrike {
                source, targets, ..
            }
            | Animation::EffectPulse {
                source, targets, ..
            } => source
                .iter()
                .copied()
                .chain(targets.iter().map(|t| t.id))
                .collect(),
            Animation::DamageNumbers { targets } | Animation::HealNumbers { targets } => {
                targets.iter().map(|t| t.id).collect()
            }
            _ => Vec::new(),
        }
    }
}

pub fn animation_for(entry: &BattleLogEntry) -> Animation {
    let team = entry.actor.team;
    let source = entry.actor.character_id;
    match &entry.event {
        LogEvent::StartTurn => Animation::TurnBanner { team },
        LogEvent::DrawCard { drawn_cards } => Animation::CardsDrawn {
            team,
            cards: drawn_cards.iter().map(|c| c.id).collect(),
        },
        LogEvent::PlayCard { card, targets } => Animation::CardStrike {
            team,
            source,
            card: card.clone(),
            targets: targets.clone(),
            hint: entry.animation_hint.clone(),
        },
        LogEvent::DiscardCard { card } => Animation::CardDiscarded {
            team,
            card: card.clone(),
        },
        LogEvent::Damage { targets } => Animation::DamageNumbers {
            targets: targets.clone(),
        },
        LogEvent::Heal { targets } => Animation::HealNumbers {
            targets: targets.clone(),
        },
        LogEvent::EffectTrigger { card, targets } => Animation::EffectPulse {
            source,
            card: card.clone(),
            targets: targets.clone(),
        },
        LogEvent::EnergyUpdate => Animation::EnergyGauge { team },
        LogEvent::EndTurn => Animation::TurnEnded { team },
        LogEvent::BattleEnd => Animation::Victory,
        LogEvent::Unknown { action_type, .. } => Animation::Callout {
            label: action_type.replace('_', " "),
        },
    }
}
