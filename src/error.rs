//! Error types surfaced by the battle client.

use std::fmt;

use crate::ids::CardId;
use crate::state::{Phase, StateError};

/// Transport-level failure. The request may or may not have reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The service could not be reached.
    Unreachable(String),
    /// No response within the configured timeout.
    Timeout,
}

/// An action attempted where the state machine does not allow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No battle snapshot has been loaded yet.
    NotLoaded,
    /// Interaction is locked by a request or animation in progress.
    InteractionLocked,
    /// The action is only legal in another phase.
    WrongPhase { expected: Phase, actual: Option<Phase> },
    /// The card is not in the acting player's hand.
    CardNotInHand(CardId),
    /// A failed step must be retried before anything else happens.
    AwaitingRetry(Phase),
    /// The battle is already over.
    BattleOver,
}

/// Errors returned by the request client and the battle session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Network(NetworkError),
    /// The service answered with a non-success response.
    Api {
        status: Option<u16>,
        message: String,
    },
    Validation(ValidationError),
    /// The service answered with a payload that could not be used.
    Protocol(String),
}

impl ClientError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        ClientError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// The service accepted the request but its answer could not be used.
    /// The action may already be applied on the service side.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol(_))
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Unreachable(reason) => write!(f, "service unreachable: {}", reason),
            NetworkError::Timeout => write!(f, "request timed out"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotLoaded => write!(f, "battle not loaded"),
            ValidationError::InteractionLocked => write!(f, "wait for the current action to finish"),
            ValidationError::WrongPhase { expected, actual } => match actual {
                Some(actual) => write!(f, "only allowed during {}, now {}", expected, actual),
                None => write!(f, "only allowed during {}", expected),
            },
            ValidationError::CardNotInHand(card) => write!(f, "card {} is not in hand", card),
            ValidationError::AwaitingRetry(phase) => {
                write!(f, "{} failed and must be retried first", phase)
            }
            ValidationError::BattleOver => write!(f, "the battle is over"),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(e) => write!(f, "Network error ({}), please try again", e),
            ClientError::Api {
                status: Some(status),
                message,
            } => write!(f, "Server error {}: {}", status, message),
            ClientError::Api {
                status: None,
                message,
            } => write!(f, "Server error: {}", message),
            ClientError::Validation(e) => write!(f, "Not allowed: {}", e),
            ClientError::Protocol(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<NetworkError> for ClientError {
    fn from(value: NetworkError) -> Self {
        ClientError::Network(value)
    }
}

impl From<ValidationError> for ClientError {
    fn from(value: ValidationError) -> Self {
        ClientError::Validation(value)
    }
}

impl From<StateError> for ClientError {
    fn from(value: StateError) -> Self {
        ClientError::Protocol(format!("invalid battle state: {}", value))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::Protocol(value.to_string())
    }
}
