use serde::{Deserialize, Serialize};

use crate::ids::{CardId, CharacterId, Team};

/// Body of a turn request sent to the battle service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnAction {
    DrawCard {
        player_team: Team,
    },
    PlayCard {
        player_team: Team,
        card_id: CardId,
        character_id: CharacterId,
        /// Position of the card in hand when it was played.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        card_position: Option<usize>,
    },
    DiscardCard {
        player_team: Team,
        card_id: CardId,
    },
    EndTurn {
        player_team: Team,
    },
}

impl TurnAction {
    pub fn player_team(&self) -> Team {
        match self {
            TurnAction::DrawCard { player_team }
            | TurnAction::PlayCard { player_team, .. }
            | TurnAction::DiscardCard { player_team, .. }
            | TurnAction::EndTurn { player_team } => *player_team,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TurnAction::DrawCard { .. } => "draw_card",
            TurnAction::PlayCard { .. } => "play_card",
            TurnAction::DiscardCard { .. } => "discard_card",
            TurnAction::EndTurn { .. } => "end_turn",
        }
    }
}
