pub mod action;
pub mod animation;
pub mod battle_log;
pub mod client;
pub mod config;
pub mod drag;
pub mod error;
pub mod geometry;
#[cfg(feature = "http")]
pub mod http;
pub mod ids;
pub mod interaction;
pub mod pacing;
pub mod playback;
pub mod session;
pub mod state;
pub mod store;
pub mod target;
pub mod view;
pub mod zones;

pub use action::TurnAction;
pub use animation::{Animation, animation_for};
pub use battle_log::{Actor, BattleLogEntry, BattleOutcome, LogEvent, LogTarget, TargetAfter};
pub use client::{
    ActionRequestClient, BattleService, Endpoint, Method, RawResponse, ServiceRequest, Transport,
    decode_response,
};
pub use config::{ConfigError, PlaybackConfig, RetryPolicy, ServiceConfig, SessionConfig};
pub use drag::{DragError, DragGestureController, DragOutcome, DropIntent, TokenSurface};
pub use error::{ClientError, NetworkError, ValidationError};
pub use geometry::{Point, Rect, Vec2};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use ids::{BattleId, CardId, CharacterId, Team};
pub use interaction::InteractionLock;
pub use pacing::{NoPacing, Pacer, ThreadPacer};
pub use playback::{LogAnimationPlayer, PlaybackMode, PlaybackReport};
pub use session::{BattleSession, SessionProgress, SessionStatus};
pub use state::{
    ActiveEffect, BattleState, BattleStatus, Card, CardInDeck, Character, DeckState, Phase, Pile,
    PlayerState, StateError,
};
pub use store::BattleStateStore;
pub use target::{CharacterZone, DropTarget, TargetResolver};
pub use view::{BattleView, Notification};
pub use zones::ZoneRegistry;
