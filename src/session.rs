//! Turn phase controller.
//!
//! A [`BattleSession`] owns the battle snapshot and drives the turn cycle
//!
//! ```text
//! start_turn -> draw_phase -> main_phase -> end_turn -> ai_turn -> start_turn ...
//! ```
//!
//! one phase per [`BattleSession::step`]. Every phase handler locks player
//! interaction, performs its request, plays the returned log to completion
//! and only then moves to the next phase. In the human main phase the
//! session suspends until [`BattleSession::signal_end_turn`] is called;
//! cards are played in between through [`BattleSession::handle_drop`].
//!
//! A rejected or unreachable request leaves the phase where it was. The
//! error is surfaced to the view, the last known snapshot is redisplayed and
//! nothing advances until [`BattleSession::retry`].
//!
//! A request the service accepted but whose answer cannot be used (a
//! protocol error, or a log with an invalid snapshot) is never sent again.
//! The session fetches the battle state instead and continues from there.

use crate::action::TurnAction;
use crate::battle_log::{BattleLogEntry, BattleOutcome};
use crate::client::BattleService;
use crate::config::SessionConfig;
use crate::drag::DropIntent;
use crate::error::{ClientError, ValidationError};
use crate::ids::{BattleId, CardId, CharacterId, Team};
use crate::interaction::InteractionLock;
use crate::playback::{LogAnimationPlayer, PlaybackMode, PlaybackReport};
use crate::state::{BattleState, Phase};
use crate::store::BattleStateStore;
use crate::target::DropTarget;
use crate::view::{BattleView, Notification};

/// Where the session is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No snapshot yet. [`BattleSession::load`] has not succeeded.
    Unloaded,
    /// The next step runs this phase.
    Running(Phase),
    /// Human main phase, waiting for plays and the end-turn signal.
    AwaitingEndTurn,
    /// The request of this phase failed; it runs again on retry.
    Faulted(Phase),
    /// The request of this phase was applied by the service but its result
    /// could not be used, and fetching the state failed too. Retry fetches
    /// the state again.
    Desynced(Phase),
    Ended(BattleOutcome),
}

/// Result of driving the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProgress {
    /// A phase completed; more steps can run right away.
    Continue,
    /// Suspended in the human main phase.
    NeedsEndTurn,
    BattleOver(BattleOutcome),
}

pub struct BattleSession<S: BattleService, V: BattleView> {
    battle: BattleId,
    human: Team,
    service: S,
    view: V,
    store: BattleStateStore,
    player: LogAnimationPlayer,
    lock: InteractionLock,
    status: SessionStatus,
    end_turn_signaled: bool,
}

impl<S: BattleService, V: BattleView> BattleSession<S, V> {
    pub fn new(
        battle: BattleId,
        human: Team,
        service: S,
        view: V,
        player: LogAnimationPlayer,
    ) -> Self {
        Self {
            battle,
            human,
            service,
            view,
            store: BattleStateStore::new(),
            player,
            lock: InteractionLock::new(),
            status: SessionStatus::Unloaded,
            end_turn_signaled: false,
        }
    }

    /// Session paced on the current thread as configured.
    pub fn from_config(battle: BattleId, config: &SessionConfig, service: S, view: V) -> Self {
        Self::new(
            battle,
            config.human_team,
            service,
            view,
            LogAnimationPlayer::paced(config.playback.clone()),
        )
    }

    pub fn battle_id(&self) -> &BattleId {
        &self.battle
    }

    pub fn human_team(&self) -> Team {
        self.human
    }

    pub fn state(&self) -> Option<&BattleState> {
        self.store.get()
    }

    pub fn store(&self) -> &BattleStateStore {
        &self.store
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, SessionStatus::Ended(_))
    }

    /// A handle on the interaction flag for UI components.
    pub fn interaction(&self) -> InteractionLock {
        self.lock.clone()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Fetch the initial snapshot.
    ///
    /// On failure the store stays empty, the error is surfaced to the view
    /// and the session stays [`SessionStatus::Unloaded`].
    pub fn load(&mut self) -> Result<(), ClientError> {
        self.set_interactable(false);
        let state = match self.fetch_state() {
            Ok(state) => state,
            Err(err) => {
                self.surface_error(&err);
                return Err(err);
            }
        };

        log::info!(
            "loaded battle {}: turn {}, {} in {}",
            self.battle,
            state.current_turn,
            state.current_player,
            state.phase
        );
        self.view.update_all_zones(&state);
        match finished_outcome(&state) {
            Some(outcome) => self.end_battle(outcome),
            None => self.enter(state.phase),
        }
        Ok(())
    }

    /// Drive the session until it suspends, ends or fails.
    pub fn run(&mut self) -> Result<SessionProgress, ClientError> {
        loop {
            match self.step()? {
                SessionProgress::Continue => {}
                progress => return Ok(progress),
            }
        }
    }

    /// Run the pending phase.
    pub fn step(&mut self) -> Result<SessionProgress, ClientError> {
        let phase = match self.status {
            SessionStatus::Unloaded => return Err(ValidationError::NotLoaded.into()),
            SessionStatus::Ended(outcome) => return Ok(SessionProgress::BattleOver(outcome)),
            SessionStatus::Faulted(phase) | SessionStatus::Desynced(phase) => {
                return Err(ValidationError::AwaitingRetry(phase).into());
            }
            SessionStatus::AwaitingEndTurn if !self.end_turn_signaled => {
                return Ok(SessionProgress::NeedsEndTurn);
            }
            SessionStatus::AwaitingEndTurn => Phase::MainPhase,
            SessionStatus::Running(phase) => phase,
        };

        if phase == Phase::MainPhase {
            return self.main_phase();
        }

        self.set_interactable(false);
        match self.run_phase(phase) {
            Ok(SessionProgress::BattleOver(outcome)) => {
                self.end_battle(outcome);
                Ok(SessionProgress::BattleOver(outcome))
            }
            Ok(progress) => Ok(progress),
            Err(err) if err.is_protocol() => {
                log::warn!("{} was applied but its result is unusable; resyncing", phase);
                self.surface_error(&err);
                self.resync(phase)
            }
            Err(err) => {
                log::warn!("{} failed; waiting for retry", phase);
                self.status = SessionStatus::Faulted(phase);
                self.refresh_view();
                self.surface_error(&err);
                Err(err)
            }
        }
    }

    /// Run the failed step again, or the initial fetch if it never succeeded,
    /// then keep going like [`BattleSession::run`]. A desynced session only
    /// fetches the state again; the applied request is not repeated.
    pub fn retry(&mut self) -> Result<SessionProgress, ClientError> {
        match self.status {
            SessionStatus::Unloaded => self.load()?,
            SessionStatus::Faulted(phase) => {
                log::info!("retrying {}", phase);
                self.status = SessionStatus::Running(phase);
            }
            SessionStatus::Desynced(phase) => {
                log::info!("resyncing after {}", phase);
                self.resync(phase)?;
            }
            _ => {}
        }
        self.run()
    }

    /// Resolve the main-phase wait. Returns `false` when the signal is
    /// ignored: outside the human main phase, while locked, or when a
    /// signal is already pending.
    pub fn signal_end_turn(&mut self) -> bool {
        if self.status != SessionStatus::AwaitingEndTurn
            || self.end_turn_signaled
            || !self.lock.is_interactable()
        {
            log::debug!("end turn signal ignored in {:?}", self.status);
            return false;
        }
        self.end_turn_signaled = true;
        self.set_interactable(false);
        true
    }

    pub fn handle_drop(&mut self, intent: DropIntent) -> Result<PlaybackReport, ClientError> {
        match intent.target {
            DropTarget::Character(character) => self.play_card(intent.card, character),
            DropTarget::Discard => self.discard_card(intent.card),
        }
    }

    /// Play a card from the human hand on `character`.
    pub fn play_card(
        &mut self,
        card: CardId,
        character: CharacterId,
    ) -> Result<PlaybackReport, ClientError> {
        let position = self.playable_card(card)?;
        let action = TurnAction::PlayCard {
            player_team: self.human,
            card_id: card,
            character_id: character,
            card_position: Some(position),
        };
        log::info!("{} plays card {} on {}", self.human, card, character);
        self.set_interactable(false);
        let response = self.service.play_card(&self.battle, &action);
        self.finish_hand_action(response)
    }

    /// Discard a card from the human hand for energy.
    pub fn discard_card(&mut self, card: CardId) -> Result<PlaybackReport, ClientError> {
        self.playable_card(card)?;
        let action = TurnAction::DiscardCard {
            player_team: self.human,
            card_id: card,
        };
        log::info!("{} discards card {}", self.human, card);
        self.set_interactable(false);
        let response = self.service.discard_card(&self.battle, &action);
        self.finish_hand_action(response)
    }

    /// Redraw every zone from the current snapshot.
    pub fn refresh_view(&mut self) {
        if let Some(state) = self.store.get() {
            self.view.update_all_zones(state);
        }
    }

    fn main_phase(&mut self) -> Result<SessionProgress, ClientError> {
        let current = self.current_player()?;
        if current != self.human {
            self.enter(Phase::AiTurn);
            return Ok(SessionProgress::Continue);
        }
        if self.end_turn_signaled {
            self.end_turn_signaled = false;
            self.enter(Phase::EndTurn);
            return Ok(SessionProgress::Continue);
        }
        if self.status != SessionStatus::AwaitingEndTurn {
            log::info!("{} main phase: waiting for end turn", self.human);
            self.status = SessionStatus::AwaitingEndTurn;
        }
        self.set_interactable(true);
        Ok(SessionProgress::NeedsEndTurn)
    }

    fn run_phase(&mut self, phase: Phase) -> Result<SessionProgress, ClientError> {
        let (entries, mode) = match phase {
            Phase::StartTurn => (
                self.service.start_turn(&self.battle)?,
                PlaybackMode::Standard,
            ),
            Phase::DrawPhase => {
                let action = TurnAction::DrawCard {
                    player_team: self.current_player()?,
                };
                (
                    self.service.draw_cards(&self.battle, &action)?,
                    PlaybackMode::Standard,
                )
            }
            Phase::EndTurn => {
                let action = TurnAction::EndTurn {
                    player_team: self.current_player()?,
                };
                (
                    self.service.end_turn(&self.battle, &action)?,
                    PlaybackMode::Standard,
                )
            }
            Phase::AiTurn => (self.service.ai_turn(&self.battle)?, PlaybackMode::AiTurn),
            Phase::MainPhase => return self.main_phase(),
        };

        let report = self
            .player
            .process(&entries, &mut self.store, &mut self.view, mode)?;
        if let Some(outcome) = report.outcome {
            return Ok(SessionProgress::BattleOver(outcome));
        }

        let next = match phase {
            Phase::StartTurn => Phase::DrawPhase,
            Phase::DrawPhase => Phase::MainPhase,
            Phase::EndTurn if self.current_player()? != self.human => Phase::AiTurn,
            Phase::EndTurn | Phase::AiTurn | Phase::MainPhase => Phase::StartTurn,
        };
        self.enter(next);
        Ok(SessionProgress::Continue)
    }

    /// Play the log of a hand action. A failure is surfaced and the player
    /// may act again.
    fn finish_hand_action(
        &mut self,
        response: Result<Vec<BattleLogEntry>, ClientError>,
    ) -> Result<PlaybackReport, ClientError> {
        let result = response.and_then(|entries| {
            self.player.process(
                &entries,
                &mut self.store,
                &mut self.view,
                PlaybackMode::Standard,
            )
        });

        match result {
            Ok(report) => {
                match report.outcome {
                    Some(outcome) => self.end_battle(outcome),
                    None => self.set_interactable(true),
                }
                Ok(report)
            }
            Err(err) if err.is_protocol() => {
                log::warn!("hand action was applied but its result is unusable; resyncing");
                self.surface_error(&err);
                match self.resync(Phase::MainPhase) {
                    Ok(_) => Err(err),
                    Err(resync) => Err(resync),
                }
            }
            Err(err) => {
                self.refresh_view();
                self.surface_error(&err);
                self.set_interactable(true);
                Err(err)
            }
        }
    }

    /// Replace the snapshot with the service's current one and continue from
    /// its phase. On failure the session waits in [`SessionStatus::Desynced`].
    fn resync(&mut self, after: Phase) -> Result<SessionProgress, ClientError> {
        self.set_interactable(false);
        self.end_turn_signaled = false;
        let state = match self.fetch_state() {
            Ok(state) => state,
            Err(err) => {
                log::warn!("resync after {} failed; waiting for retry", after);
                self.status = SessionStatus::Desynced(after);
                self.refresh_view();
                self.surface_error(&err);
                return Err(err);
            }
        };

        log::info!(
            "resynced battle {}: turn {}, {} in {}",
            self.battle,
            state.current_turn,
            state.current_player,
            state.phase
        );
        self.view.update_all_zones(&state);
        if let Some(outcome) = finished_outcome(&state) {
            self.end_battle(outcome);
            return Ok(SessionProgress::BattleOver(outcome));
        }
        self.enter(state.phase);
        match state.phase {
            Phase::MainPhase => self.main_phase(),
            _ => Ok(SessionProgress::Continue),
        }
    }

    fn fetch_state(&mut self) -> Result<BattleState, ClientError> {
        let state = self.service.get_battle_state(&self.battle)?;
        Ok(self.store.replace(state)?.clone())
    }

    /// Check that the human may act on `card` now; returns its hand position.
    fn playable_card(&self, card: CardId) -> Result<usize, ClientError> {
        match self.status {
            SessionStatus::Unloaded => return Err(ValidationError::NotLoaded.into()),
            SessionStatus::Ended(_) => return Err(ValidationError::BattleOver.into()),
            SessionStatus::Faulted(phase) | SessionStatus::Desynced(phase) => {
                return Err(ValidationError::AwaitingRetry(phase).into());
            }
            _ => {}
        }
        if !self.lock.is_interactable() {
            return Err(ValidationError::InteractionLocked.into());
        }
        if let SessionStatus::Running(phase) = self.status {
            return Err(ValidationError::WrongPhase {
                expected: Phase::MainPhase,
                actual: Some(phase),
            }
            .into());
        }
        let state = self.store.get().ok_or(ValidationError::NotLoaded)?;
        state
            .player(self.human)
            .deck
            .hand_position(card)
            .ok_or_else(|| ValidationError::CardNotInHand(card).into())
    }

    fn current_player(&self) -> Result<Team, ClientError> {
        self.store
            .get()
            .map(|state| state.current_player)
            .ok_or_else(|| ValidationError::NotLoaded.into())
    }

    fn enter(&mut self, phase: Phase) {
        log::info!("phase -> {}", phase);
        self.status = SessionStatus::Running(phase);
        self.view.notify(&Notification::PhaseChanged(phase));
    }

    fn end_battle(&mut self, outcome: BattleOutcome) {
        match outcome.winner {
            Some(winner) => log::info!("battle {} over: {} wins", self.battle, winner),
            None => log::info!("battle {} over", self.battle),
        }
        self.status = SessionStatus::Ended(outcome);
        self.set_interactable(false);
        self.view.notify(&Notification::BattleOver(outcome));
    }

    fn surface_error(&mut self, err: &ClientError) {
        log::warn!("{}", err);
        self.view.notify(&Notification::Error(err.clone()));
    }

    fn set_interactable(&mut self, interactable: bool) {
        if interactable {
            self.lock.unlock();
        } else {
            self.lock.lock();
        }
        self.view.set_interactable(interactable);
    }
}

fn finished_outcome(state: &BattleState) -> Option<BattleOutcome> {
    (state.is_completed() || state.defeated_team().is_some())
        .then(|| BattleOutcome::from_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use crate::battle_log::{Actor, LogEvent};
    use crate::error::NetworkError;
    use crate::state::fixtures::{card, state};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Service {
        initial: Option<BattleState>,
        responses: VecDeque<Result<Vec<BattleLogEntry>, ClientError>>,
        sent: Vec<String>,
        actions: Vec<TurnAction>,
    }

    impl Service {
        fn answer(&mut self, name: &str) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.sent.push(name.to_string());
            self.responses.pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    impl BattleService for Service {
        fn get_battle_state(&mut self, _battle: &BattleId) -> Result<BattleState, ClientError> {
            self.sent.push("state".to_string());
            self.initial
                .clone()
                .ok_or(ClientError::Network(NetworkError::Timeout))
        }

        fn start_turn(&mut self, _battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.answer("start_turn")
        }

        fn draw_cards(
            &mut self,
            _battle: &BattleId,
            action: &TurnAction,
        ) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.actions.push(action.clone());
            self.answer("draw")
        }

        fn play_card(
            &mut self,
            _battle: &BattleId,
            action: &TurnAction,
        ) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.actions.push(action.clone());
            self.answer("play_card")
        }

        fn discard_card(
            &mut self,
            _battle: &BattleId,
            action: &TurnAction,
        ) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.actions.push(action.clone());
            self.answer("discard")
        }

        fn end_turn(
            &mut self,
            _battle: &BattleId,
            action: &TurnAction,
        ) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.actions.push(action.clone());
            self.answer("end_turn")
        }

        fn ai_turn(&mut self, _battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
            self.answer("ai_turn")
        }
    }

    #[derive(Default)]
    struct View {
        notifications: Vec<Notification>,
        played: Vec<&'static str>,
        redraws: usize,
        interactable: bool,
    }

    impl BattleView for View {
        fn update_hand_zones(&mut self, _state: &BattleState) {
            self.redraws += 1;
        }

        fn update_character_zones(&mut self, _state: &BattleState) {}

        fn play(&mut self, animation: &Animation, _state: Option<&BattleState>) {
            self.played.push(animation.name());
        }

        fn notify(&mut self, notification: &Notification) {
            self.notifications.push(notification.clone());
        }

        fn set_interactable(&mut self, interactable: bool) {
            self.interactable = interactable;
        }
    }

    fn session(initial: BattleState) -> BattleSession<Service, View> {
        let service = Service {
            initial: Some(initial),
            ..Service::default()
        };
        BattleSession::new(
            BattleId::new("b-1"),
            Team::One,
            service,
            View::default(),
            LogAnimationPlayer::immediate(),
        )
    }

    fn in_phase(team: Team, phase: Phase) -> BattleState {
        let mut s = state();
        s.current_player = team;
        s.phase = phase;
        s
    }

    fn entry(team: Team, event: LogEvent, after: BattleState) -> BattleLogEntry {
        BattleLogEntry::new(
            Actor {
                team,
                character_id: None,
            },
            event,
        )
        .with_after_state(after)
    }

    #[test]
    fn test_load_derives_status_from_phase() {
        let mut s = session(in_phase(Team::One, Phase::DrawPhase));
        assert_eq!(s.status(), SessionStatus::Unloaded);
        s.load().unwrap();
        assert_eq!(s.status(), SessionStatus::Running(Phase::DrawPhase));
        assert!(s.state().is_some());
        assert_eq!(s.view().redraws, 1);
    }

    #[test]
    fn test_load_of_finished_battle_ends_immediately() {
        let mut done = state();
        done.status = crate::state::BattleStatus::Completed;
        done.winner_team = Some(Team::One);
        let mut s = session(done);
        s.load().unwrap();
        assert!(s.is_over());
        assert_eq!(
            s.run().unwrap(),
            SessionProgress::BattleOver(BattleOutcome {
                winner: Some(Team::One),
                turn: Some(1),
            })
        );
    }

    #[test]
    fn test_human_turn_reaches_main_phase() {
        let mut s = session(in_phase(Team::One, Phase::StartTurn));
        s.load().unwrap();

        assert_eq!(s.run().unwrap(), SessionProgress::NeedsEndTurn);
        assert_eq!(s.service().sent, vec!["state", "start_turn", "draw"]);
        assert_eq!(
            s.service().actions,
            vec![TurnAction::DrawCard {
                player_team: Team::One
            }]
        );
        assert_eq!(s.status(), SessionStatus::AwaitingEndTurn);
        assert!(s.interaction().is_interactable());
        assert!(s.view().interactable);
    }

    #[test]
    fn test_end_turn_signal_is_consumed_once() {
        let mut s = session(in_phase(Team::One, Phase::MainPhase));
        s.load().unwrap();
        assert_eq!(s.run().unwrap(), SessionProgress::NeedsEndTurn);

        assert!(s.signal_end_turn());
        assert!(!s.signal_end_turn());
        assert!(!s.interaction().is_interactable());

        let after_end = in_phase(Team::Two, Phase::AiTurn);
        let back = in_phase(Team::One, Phase::StartTurn);
        s.service_mut().responses.extend([
            Ok(vec![entry(Team::One, LogEvent::EndTurn, after_end)]),
            Ok(vec![entry(Team::Two, LogEvent::EndTurn, back)]),
        ]);

        assert_eq!(s.run().unwrap(), SessionProgress::NeedsEndTurn);
        assert_eq!(
            s.service().sent,
            vec!["state", "end_turn", "ai_turn", "start_turn", "draw"]
        );
        assert!(s.signal_end_turn());
    }

    #[test]
    fn test_signal_outside_main_phase_is_ignored() {
        let mut s = session(in_phase(Team::One, Phase::StartTurn));
        assert!(!s.signal_end_turn());
        s.load().unwrap();
        assert!(!s.signal_end_turn());
    }

    #[test]
    fn test_ai_main_phase_passes_through() {
        let mut s = session(in_phase(Team::Two, Phase::MainPhase));
        s.load().unwrap();
        assert_eq!(s.step().unwrap(), SessionProgress::Continue);
        assert_eq!(s.status(), SessionStatus::Running(Phase::AiTurn));
        assert_eq!(s.service().sent, vec!["state"]);
    }

    #[test]
    fn test_failed_phase_does_not_advance() {
        let mut s = session(in_phase(Team::One, Phase::StartTurn));
        s.load().unwrap();
        s.service_mut()
            .responses
            .push_back(Err(ClientError::api(Some(500), "engine down")));

        let err = s.run().unwrap_err();
        assert_eq!(err, ClientError::api(Some(500), "engine down"));
        assert_eq!(s.status(), SessionStatus::Faulted(Phase::StartTurn));
        assert!(!s.interaction().is_interactable());
        assert!(
            s.view()
                .notifications
                .contains(&Notification::Error(err.clone()))
        );

        // Nothing moves until retry.
        assert_eq!(
            s.step().unwrap_err(),
            ClientError::Validation(ValidationError::AwaitingRetry(Phase::StartTurn))
        );
        assert_eq!(s.service().sent, vec!["state", "start_turn"]);

        assert_eq!(s.retry().unwrap(), SessionProgress::NeedsEndTurn);
        assert_eq!(s.service().sent, vec!["state", "start_turn", "start_turn", "draw"]);
    }

    #[test]
    fn test_interaction_stays_locked_until_main_phase() {
        let mut s = session(in_phase(Team::One, Phase::StartTurn));
        s.load().unwrap();

        assert_eq!(s.step().unwrap(), SessionProgress::Continue);
        assert_eq!(s.status(), SessionStatus::Running(Phase::DrawPhase));
        assert!(!s.interaction().is_interactable());
        assert_eq!(
            s.discard_card(CardId(12)),
            Err(ValidationError::InteractionLocked.into())
        );

        assert_eq!(s.step().unwrap(), SessionProgress::Continue);
        assert_eq!(s.status(), SessionStatus::Running(Phase::MainPhase));
        assert!(!s.interaction().is_interactable());

        assert_eq!(s.step().unwrap(), SessionProgress::NeedsEndTurn);
        assert!(s.interaction().is_interactable());
        assert!(s.view().interactable);
    }

    fn broken_snapshot() -> BattleState {
        let mut bad = in_phase(Team::Two, Phase::AiTurn);
        bad.players[0].characters[0].hp = 99;
        bad
    }

    #[test]
    fn test_applied_ai_turn_is_fetched_not_resent() {
        let mut s = session(in_phase(Team::Two, Phase::AiTurn));
        s.load().unwrap();

        let mut hurt = in_phase(Team::Two, Phase::AiTurn);
        hurt.players[0].characters[1].hp = 6;
        s.service_mut().responses.push_back(Ok(vec![
            entry(Team::Two, LogEvent::Damage { targets: vec![] }, hurt),
            entry(Team::Two, LogEvent::EndTurn, broken_snapshot()),
        ]));
        let mut server = in_phase(Team::One, Phase::StartTurn);
        server.players[0].characters[1].hp = 6;
        s.service_mut().initial = Some(server.clone());

        assert_eq!(s.step().unwrap(), SessionProgress::Continue);
        assert_eq!(s.service().sent, vec!["state", "ai_turn", "state"]);
        assert_eq!(s.state(), Some(&server));
        assert_eq!(s.status(), SessionStatus::Running(Phase::StartTurn));
        assert!(
            s.view()
                .notifications
                .iter()
                .any(|n| matches!(n, Notification::Error(ClientError::Protocol(_))))
        );

        assert_eq!(s.run().unwrap(), SessionProgress::NeedsEndTurn);
        assert_eq!(
            s.service().sent,
            vec!["state", "ai_turn", "state", "start_turn", "draw"]
        );
    }

    #[test]
    fn test_failed_resync_waits_and_retry_only_fetches() {
        let mut s = session(in_phase(Team::Two, Phase::AiTurn));
        s.load().unwrap();
        s.service_mut()
            .responses
            .push_back(Ok(vec![entry(Team::Two, LogEvent::EndTurn, broken_snapshot())]));
        s.service_mut().initial = None;

        assert_eq!(
            s.run().unwrap_err(),
            ClientError::Network(NetworkError::Timeout)
        );
        assert_eq!(s.status(), SessionStatus::Desynced(Phase::AiTurn));
        assert!(!s.interaction().is_interactable());
        assert_eq!(
            s.step().unwrap_err(),
            ClientError::Validation(ValidationError::AwaitingRetry(Phase::AiTurn))
        );

        s.service_mut().initial = Some(in_phase(Team::One, Phase::MainPhase));
        assert_eq!(s.retry().unwrap(), SessionProgress::NeedsEndTurn);
        assert_eq!(s.service().sent, vec!["state", "ai_turn", "state", "state"]);
        assert_eq!(s.status(), SessionStatus::AwaitingEndTurn);
    }

    #[test]
    fn test_unreadable_play_response_fetches_state() {
        let mut s = session(in_phase(Team::One, Phase::MainPhase));
        s.load().unwrap();
        s.run().unwrap();

        let mut server = in_phase(Team::One, Phase::MainPhase);
        let played = server.players[0].deck.hand_cards.remove(0);
        server.players[0].deck.discard_cards.push(played);
        s.service_mut().initial = Some(server.clone());
        s.service_mut()
            .responses
            .push_back(Err(ClientError::Protocol("success response without data".into())));

        let err = s.play_card(CardId(12), CharacterId(101)).unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(
            s.service().sent,
            vec!["state", "play_card", "state"]
        );
        assert_eq!(s.state(), Some(&server));
        assert_eq!(s.status(), SessionStatus::AwaitingEndTurn);
        assert!(s.interaction().is_interactable());
        assert_eq!(
            s.play_card(CardId(12), CharacterId(101)),
            Err(ValidationError::CardNotInHand(CardId(12)).into())
        );
    }

    #[test]
    fn test_play_card_sends_hand_position() {
        let mut s = session(in_phase(Team::One, Phase::MainPhase));
        s.load().unwrap();
        s.run().unwrap();

        let mut after = in_phase(Team::One, Phase::MainPhase);
        let played = after.players[0].deck.hand_cards.remove(1);
        after.players[0].deck.discard_cards.push(played);
        s.service_mut().responses.push_back(Ok(vec![entry(
            Team::One,
            LogEvent::PlayCard {
                card: None,
                targets: vec![],
            },
            after,
        )]));

        let report = s.play_card(CardId(13), CharacterId(102)).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(
            s.service().actions,
            vec![TurnAction::PlayCard {
                player_team: Team::One,
                card_id: CardId(13),
                character_id: CharacterId(102),
                card_position: Some(1),
            }]
        );
        assert_eq!(s.view().played, vec!["card_strike"]);
        assert!(s.interaction().is_interactable());
        assert_eq!(
            s.state().map(|st| st.players[0].deck.hand_cards.len()),
            Some(1)
        );
    }

    #[test]
    fn test_play_card_validation() {
        let mut s = session(in_phase(Team::One, Phase::StartTurn));
        assert_eq!(
            s.play_card(CardId(12), CharacterId(101)),
            Err(ValidationError::NotLoaded.into())
        );
        s.load().unwrap();
        s.lock.unlock();
        assert_eq!(
            s.play_card(CardId(12), CharacterId(101)),
            Err(ValidationError::WrongPhase {
                expected: Phase::MainPhase,
                actual: Some(Phase::StartTurn)
            }
            .into())
        );

        s.run().unwrap();
        assert_eq!(
            s.play_card(CardId(20), CharacterId(101)),
            Err(ValidationError::CardNotInHand(CardId(20)).into())
        );

        s.lock.lock();
        assert_eq!(
            s.discard_card(CardId(12)),
            Err(ValidationError::InteractionLocked.into())
        );
        assert!(s.service().actions.iter().all(|a| a.type_name() == "draw_card"));
    }

    #[test]
    fn test_rejected_play_keeps_state_and_stays_interactive() {
        let mut s = session(in_phase(Team::One, Phase::MainPhase));
        s.load().unwrap();
        s.run().unwrap();
        let redraws = s.view().redraws;
        s.service_mut()
            .responses
            .push_back(Err(ClientError::api(Some(400), "not enough energy")));

        let err = s
            .handle_drop(DropIntent {
                card: CardId(12),
                target: DropTarget::Discard,
            })
            .unwrap_err();
        assert_eq!(err, ClientError::api(Some(400), "not enough energy"));
        assert_eq!(s.service().sent.last().map(String::as_str), Some("discard"));
        assert_eq!(s.state(), Some(&in_phase(Team::One, Phase::MainPhase)));
        assert_eq!(s.view().redraws, redraws + 1);
        assert_eq!(s.status(), SessionStatus::AwaitingEndTurn);
        assert!(s.interaction().is_interactable());
    }

    #[test]
    fn test_follow_up_entry_can_end_the_battle() {
        let mut s = session(in_phase(Team::One, Phase::MainPhase));
        s.load().unwrap();
        s.run().unwrap();

        let mut first = in_phase(Team::One, Phase::MainPhase);
        first.players[0].deck.hand_cards.remove(0);
        first.players[0].deck.discard_cards.push(card(12));
        let mut second = first.clone();
        for c in &mut second.players[1].characters {
            c.hp = 0;
        }
        s.service_mut().responses.push_back(Ok(vec![
            entry(
                Team::One,
                LogEvent::PlayCard {
                    card: None,
                    targets: vec![],
                },
                first,
            ),
            entry(Team::One, LogEvent::Damage { targets: vec![] }, second),
        ]));

        let report = s.play_card(CardId(12), CharacterId(101)).unwrap();
        assert!(report.battle_over());
        assert!(s.is_over());
        assert!(!s.interaction().is_interactable());
        assert!(s.view().notifications.iter().any(|n| matches!(
            n,
            Notification::BattleOver(BattleOutcome {
                winner: Some(Team::One),
                ..
            })
        )));
        assert_eq!(
            s.play_card(CardId(13), CharacterId(101)),
            Err(ValidationError::BattleOver.into())
        );
    }
}
