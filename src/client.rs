//! Request/response client for battle actions.
//!
//! [`BattleService`] is the seam the session talks to. [`ActionRequestClient`]
//! implements it on top of any [`Transport`]: it builds the request for each
//! action, unwraps the `{ success, data, message }` envelope and turns
//! failures into [`ClientError`]s.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::action::TurnAction;
use crate::battle_log::BattleLogEntry;
use crate::config::RetryPolicy;
use crate::error::{ClientError, NetworkError};
use crate::ids::BattleId;
use crate::pacing::{Pacer, ThreadPacer};
use crate::state::BattleState;

/// The authoritative battle service as seen by the session.
pub trait BattleService {
    fn get_battle_state(&mut self, battle: &BattleId) -> Result<BattleState, ClientError>;

    fn start_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError>;

    fn draw_cards(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError>;

    fn play_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError>;

    fn discard_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError>;

    fn end_turn(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError>;

    fn ai_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The seven battle endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    BattleState,
    StartTurn,
    DrawCards,
    PlayCard,
    DiscardCard,
    EndTurn,
    AiTurn,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::BattleState => Method::Get,
            _ => Method::Post,
        }
    }

    /// Path relative to the service base URL.
    pub fn path(self, battle: &BattleId) -> String {
        let suffix = match self {
            Endpoint::BattleState => "",
            Endpoint::StartTurn => "/start-turn",
            Endpoint::DrawCards => "/draw",
            Endpoint::PlayCard => "/play-card",
            Endpoint::DiscardCard => "/discard",
            Endpoint::EndTurn => "/end-turn",
            Endpoint::AiTurn => "/ai-turn",
        };
        format!("/card-battle/{}{}", battle, suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub battle: BattleId,
    pub endpoint: Endpoint,
    pub body: Option<TurnAction>,
}

/// Raw response as delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Moves one request to the service and back.
///
/// Transports report only transport failures as errors. Any response that
/// arrived, whatever its status, is returned as a [`RawResponse`].
pub trait Transport {
    fn send(&mut self, request: &ServiceRequest) -> Result<RawResponse, NetworkError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode a raw response into its payload.
pub fn decode_response<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, ClientError> {
    let status_ok = (200..300).contains(&raw.status);
    let envelope: Envelope<T> = match serde_json::from_str(&raw.body) {
        Ok(envelope) => envelope,
        Err(_) if !status_ok => {
            return Err(ClientError::api(
                Some(raw.status),
                format!("request failed with status {}", raw.status),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !status_ok || !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "request was rejected".to_string());
        return Err(ClientError::api(Some(raw.status), message));
    }

    envelope
        .data
        .ok_or_else(|| ClientError::Protocol("success response without data".to_string()))
}

/// Battle action client over a [`Transport`].
pub struct ActionRequestClient<T: Transport> {
    transport: T,
    retry: RetryPolicy,
    pacer: Box<dyn Pacer>,
}

impl<T: Transport> ActionRequestClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_retry(transport, RetryPolicy::default(), Box::new(ThreadPacer))
    }

    pub fn with_retry(transport: T, retry: RetryPolicy, pacer: Box<dyn Pacer>) -> Self {
        Self {
            transport,
            retry,
            pacer,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn log_request(
        &mut self,
        battle: &BattleId,
        endpoint: Endpoint,
        body: Option<&TurnAction>,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        send_request(&mut self.transport, battle, endpoint, body)
    }
}

fn send_request<T: Transport, R: DeserializeOwned>(
    transport: &mut T,
    battle: &BattleId,
    endpoint: Endpoint,
    body: Option<&TurnAction>,
) -> Result<R, ClientError> {
    let request = ServiceRequest {
        battle: battle.clone(),
        endpoint,
        body: body.cloned(),
    };
    log::debug!("-> {:?} {}", endpoint.method(), endpoint.path(battle));
    let raw = transport.send(&request)?;
    log::debug!("<- {} ({} bytes)", raw.status, raw.body.len());
    decode_response(&raw)
}

impl<T: Transport> BattleService for ActionRequestClient<T> {
    /// The only request retried automatically: it does not change the battle.
    fn get_battle_state(&mut self, battle: &BattleId) -> Result<BattleState, ClientError> {
        let transport = &mut self.transport;
        self.retry.run(self.pacer.as_mut(), || {
            send_request(&mut *transport, battle, Endpoint::BattleState, None)
        })
    }

    fn start_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::StartTurn, None)
    }

    fn draw_cards(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::DrawCards, Some(action))
    }

    fn play_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::PlayCard, Some(action))
    }

    fn discard_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::DiscardCard, Some(action))
    }

    fn end_turn(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::EndTurn, Some(action))
    }

    fn ai_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
        self.log_request(battle, Endpoint::AiTurn, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CardId, CharacterId, Team};
    use crate::pacing::NoPacing;
    use crate::state::fixtures::state;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: VecDeque<Result<RawResponse, NetworkError>>,
        sent: Vec<ServiceRequest>,
    }

    impl ScriptedTransport {
        fn reply(mut self, status: u16, body: serde_json::Value) -> Self {
            self.responses.push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        fn fail(mut self, error: NetworkError) -> Self {
            self.responses.push_back(Err(error));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, request: &ServiceRequest) -> Result<RawResponse, NetworkError> {
            self.sent.push(request.clone());
            self.responses
                .pop_front()
                .unwrap_or(Err(NetworkError::Unreachable("script exhausted".into())))
        }
    }

    fn client(transport: ScriptedTransport) -> ActionRequestClient<ScriptedTransport> {
        ActionRequestClient::with_retry(transport, RetryPolicy::default(), Box::new(NoPacing))
    }

    #[test]
    fn test_endpoint_paths() {
        let battle = BattleId::new("42");
        assert_eq!(Endpoint::BattleState.path(&battle), "/card-battle/42");
        assert_eq!(Endpoint::BattleState.method(), Method::Get);
        assert_eq!(Endpoint::PlayCard.path(&battle), "/card-battle/42/play-card");
        assert_eq!(Endpoint::AiTurn.method(), Method::Post);
    }

    #[test]
    fn test_get_state_unwraps_envelope() {
        let transport = ScriptedTransport::default().reply(
            200,
            serde_json::json!({"success": true, "data": state()}),
        );
        let mut client = client(transport);
        let fetched = client.get_battle_state(&BattleId::new("b-1")).unwrap();
        assert_eq!(fetched, state());
    }

    #[test]
    fn test_get_state_retries_network_errors() {
        let transport = ScriptedTransport::default()
            .fail(NetworkError::Timeout)
            .reply(200, serde_json::json!({"success": true, "data": state()}));
        let mut client = client(transport);
        assert!(client.get_battle_state(&BattleId::new("b-1")).is_ok());
        assert_eq!(client.transport().sent.len(), 2);
    }

    #[test]
    fn test_mutating_requests_are_not_retried() {
        let transport = ScriptedTransport::default().fail(NetworkError::Timeout);
        let mut client = client(transport);
        let result = client.start_turn(&BattleId::new("b-1"));
        assert_eq!(result, Err(ClientError::Network(NetworkError::Timeout)));
        assert_eq!(client.transport().sent.len(), 1);
    }

    #[test]
    fn test_unsuccessful_envelope_is_api_error() {
        let transport = ScriptedTransport::default().reply(
            200,
            serde_json::json!({"success": false, "message": "Not enough energy"}),
        );
        let mut client = client(transport);
        let action = TurnAction::PlayCard {
            player_team: Team::One,
            card_id: CardId(1),
            character_id: CharacterId(2),
            card_position: None,
        };
        let result = client.play_card(&BattleId::new("b-1"), &action);
        assert_eq!(
            result,
            Err(ClientError::api(Some(200), "Not enough energy"))
        );
        assert_eq!(client.transport().sent[0].body, Some(action));
        assert_eq!(client.transport().sent[0].endpoint, Endpoint::PlayCard);
    }

    #[test]
    fn test_http_error_keeps_status_and_message() {
        let transport = ScriptedTransport::default().reply(
            409,
            serde_json::json!({"success": false, "message": "Not your turn"}),
        );
        let mut client = client(transport);
        let result = client.ai_turn(&BattleId::new("b-1"));
        assert_eq!(result, Err(ClientError::api(Some(409), "Not your turn")));
    }

    #[test]
    fn test_non_json_error_body() {
        let raw = RawResponse {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        let result: Result<BattleState, _> = decode_response(&raw);
        assert!(matches!(result, Err(ClientError::Api { status: Some(502), .. })));
    }

    #[test]
    fn test_garbled_success_is_protocol_error() {
        let raw = RawResponse {
            status: 200,
            body: r#"{"success": true, "data": [{"nope": 1}]}"#.to_string(),
        };
        let result: Result<Vec<BattleLogEntry>, _> = decode_response(&raw);
        assert!(matches!(result, Err(ClientError::Protocol(_))));

        let raw = RawResponse {
            status: 200,
            body: r#"{"success": true}"#.to_string(),
        };
        let result: Result<Vec<BattleLogEntry>, _> = decode_response(&raw);
        assert!(matches!(result, Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_log_entries_decode() {
        let transport = ScriptedTransport::default().reply(
            200,
            serde_json::json!({"success": true, "data": [
                {"action_type": "start_turn", "actor": {"team": 1}},
                {"action_type": "effect_trigger", "actor": {"team": 1, "character_id": 1},
                 "targets": [{"id": 1, "team": 1, "after": {"hp": 8}}]}
            ]}),
        );
        let mut client = client(transport);
        let entries = client.start_turn(&BattleId::new("b-1")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action_type(), "effect_trigger");
    }
}
