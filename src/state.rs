//! Battle snapshot data model.
//!
//! A `BattleState` is the complete, authoritative picture of one battle as
//! reported by the battle service. The client never patches it field by
//! field: every confirmed response replaces it wholesale (see
//! [`crate::store::BattleStateStore`]).
//!
//! Structural invariants are carried by the types where possible:
//! - exactly two players (`players` is a fixed 2-array)
//! - `current_player` is a [`Team`], which only decodes from `1` or `2`
//! - `phase` is one of the five [`Phase`] values
//!
//! The remaining invariants (pile membership, hit point bounds) are checked
//! by [`BattleState::validate`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{BattleId, CardId, CharacterId, Team};

/// One stage of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    StartTurn,
    DrawPhase,
    MainPhase,
    EndTurn,
    AiTurn,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::StartTurn => "start_turn",
            Phase::DrawPhase => "draw_phase",
            Phase::MainPhase => "main_phase",
            Phase::EndTurn => "end_turn",
            Phase::AiTurn => "ai_turn",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    Ongoing,
    Completed,
}

/// The pile a card instance currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pile {
    Deck,
    Hand,
    Discard,
}

impl fmt::Display for Pile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pile::Deck => f.write_str("deck"),
            Pile::Hand => f.write_str("hand"),
            Pile::Discard => f.write_str("discard"),
        }
    }
}

/// Immutable card definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Definition key shared by every copy of this card.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub card_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A card instance wrapped with its identity inside a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInDeck {
    pub id: CardId,
    pub card: Card,
}

/// A lingering effect on a character (poison, shield, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_turns: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub def: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<ActiveEffect>,
}

impl Character {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeckState {
    #[serde(default)]
    pub deck_cards: Vec<CardInDeck>,
    #[serde(default)]
    pub hand_cards: Vec<CardInDeck>,
    #[serde(default)]
    pub discard_cards: Vec<CardInDeck>,
    #[serde(default)]
    pub current_energy: u32,
}

impl DeckState {
    pub fn pile(&self, pile: Pile) -> &[CardInDeck] {
        match pile {
            Pile::Deck => &self.deck_cards,
            Pile::Hand => &self.hand_cards,
            Pile::Discard => &self.discard_cards,
        }
    }

    /// Which pile holds `card`, if any.
    pub fn pile_of(&self, card: CardId) -> Option<Pile> {
        [Pile::Hand, Pile::Deck, Pile::Discard]
            .into_iter()
            .find(|pile| self.pile(*pile).iter().any(|c| c.id == card))
    }

    /// Position of `card` in hand order.
    pub fn hand_position(&self, card: CardId) -> Option<usize> {
        self.hand_cards.iter().position(|c| c.id == card)
    }

    pub fn hand_card(&self, card: CardId) -> Option<&CardInDeck> {
        self.hand_cards.iter().find(|c| c.id == card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub team: Team,
    pub characters: Vec<Character>,
    #[serde(default)]
    pub deck: DeckState,
}

impl PlayerState {
    pub fn living_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.is_alive())
    }

    /// A team with no living characters has lost.
    pub fn is_defeated(&self) -> bool {
        self.living_characters().next().is_none()
    }
}

/// Complete authoritative battle snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub status: BattleStatus,
    pub current_turn: u32,
    pub current_player: Team,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_team: Option<Team>,
    pub players: [PlayerState; 2],
}

impl BattleState {
    pub fn player(&self, team: Team) -> &PlayerState {
        &self.players[team.index()]
    }

    pub fn current_player_state(&self) -> &PlayerState {
        self.player(self.current_player)
    }

    pub fn is_completed(&self) -> bool {
        self.status == BattleStatus::Completed
    }

    pub fn find_character(&self, id: CharacterId) -> Option<(Team, &Character)> {
        self.players.iter().find_map(|player| {
            player
                .characters
                .iter()
                .find(|c| c.id == id)
                .map(|c| (player.team, c))
        })
    }

    /// The first team with no living characters, if any.
    pub fn defeated_team(&self) -> Option<Team> {
        self.players
            .iter()
            .find(|player| player.is_defeated())
            .map(|player| player.team)
    }

    /// Check the invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), StateError> {
        for (index, expected) in [Team::One, Team::Two].into_iter().enumerate() {
            let found = self.players[index].team;
            if found != expected {
                return Err(StateError::TeamOrder { index, found });
            }
        }

        for player in &self.players {
            let mut seen: HashMap<CardId, (Team, Pile)> = HashMap::new();
            for pile in [Pile::Deck, Pile::Hand, Pile::Discard] {
                for card in player.deck.pile(pile) {
                    if let Some(first) = seen.insert(card.id, (player.team, pile)) {
                        return Err(StateError::DuplicateCard {
                            card: card.id,
                            first,
                            second: (player.team, pile),
                        });
                    }
                }
            }
            for character in &player.characters {
                if character.hp > character.max_hp {
                    return Err(StateError::HpOutOfRange {
                        character: character.id,
                        hp: character.hp,
                        max_hp: character.max_hp,
                    });
                }
            }
        }

        Ok(())
    }
}

/// A snapshot that violates a data-model invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `players[index]` is not the expected team.
    TeamOrder { index: usize, found: Team },
    /// A card instance appears in more than one of its owner's piles.
    DuplicateCard {
        card: CardId,
        first: (Team, Pile),
        second: (Team, Pile),
    },
    HpOutOfRange {
        character: CharacterId,
        hp: u32,
        max_hp: u32,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::TeamOrder { index, found } => {
                write!(f, "players[{index}] holds {found}")
            }
            StateError::DuplicateCard {
                card,
                first,
                second,
            } => write!(
                f,
                "card {card} is in {} {} and {} {}",
                first.0, first.1, second.0, second.1
            ),
            StateError::HpOutOfRange {
                character,
                hp,
                max_hp,
            } => write!(f, "character {character} has hp {hp} above max {max_hp}"),
        }
    }
}

impl std::error::Error for StateError {}
