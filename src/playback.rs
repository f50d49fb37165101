//! Sequential playback of result logs.
//!
//! For every entry the snapshot is replaced first, then the hand zones are
//! refreshed, then the entry's animation plays to completion, then the
//! character zones are refreshed. The next entry starts only after all of
//! that has returned.

use crate::animation::animation_for;
use crate::battle_log::{BattleLogEntry, BattleOutcome};
use crate::config::PlaybackConfig;
use crate::error::ClientError;
use crate::pacing::{NoPacing, Pacer, ThreadPacer};
use crate::store::BattleStateStore;
use crate::view::BattleView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Entries follow each other immediately, apart from rests.
    Standard,
    /// A fixed pause separates consecutive entries so the AI's moves can be
    /// followed.
    AiTurn,
}

/// What a call to [`LogAnimationPlayer::process`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackReport {
    /// Entries applied and animated.
    pub applied: usize,
    /// Set when an entry ended the battle. Entries after it were skipped.
    pub outcome: Option<BattleOutcome>,
}

impl PlaybackReport {
    pub fn battle_over(&self) -> bool {
        self.outcome.is_some()
    }
}

pub struct LogAnimationPlayer {
    config: PlaybackConfig,
    pacer: Box<dyn Pacer>,
}

impl LogAnimationPlayer {
    pub fn new(config: PlaybackConfig, pacer: Box<dyn Pacer>) -> Self {
        Self { config, pacer }
    }

    /// Player that sleeps on the current thread for rests and AI pacing.
    pub fn paced(config: PlaybackConfig) -> Self {
        Self::new(config, Box::new(ThreadPacer))
    }

    /// Player without any pauses.
    pub fn immediate() -> Self {
        Self::new(PlaybackConfig::immediate(), Box::new(NoPacing))
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Apply and animate `entries` in order.
    ///
    /// Stops after the first entry that ends the battle. An entry whose
    /// snapshot fails validation aborts playback with a protocol error; the
    /// store keeps the last valid snapshot.
    pub fn process(
        &mut self,
        entries: &[BattleLogEntry],
        store: &mut BattleStateStore,
        view: &mut dyn BattleView,
        mode: PlaybackMode,
    ) -> Result<PlaybackReport, ClientError> {
        let mut report = PlaybackReport::default();

        for (index, entry) in entries.iter().enumerate() {
            if mode == PlaybackMode::AiTurn && index > 0 {
                self.pacer.pause(self.config.ai_entry_delay());
            }

            log::debug!(
                "log entry {}/{}: {} by {}",
                index + 1,
                entries.len(),
                entry.action_type(),
                entry.actor.team
            );

            if let Some(after) = &entry.after_state {
                let state = store.replace(after.clone())?;
                view.update_hand_zones(state);
            }

            let animation = animation_for(entry);
            view.play(&animation, store.get());

            if entry.after_state.is_some()
                && let Some(state) = store.get()
            {
                view.update_character_zones(state);
            }

            report.applied += 1;

            if let Some(outcome) = entry.outcome() {
                let skipped = entries.len() - index - 1;
                if skipped > 0 {
                    log::info!("battle ended; skipping {} remaining log entries", skipped);
                }
                report.outcome = Some(outcome);
                break;
            }

            if self.config.rests_after(entry) {
                self.pacer.pause(self.config.rest_delay());
            }
        }

        Ok(report)
    }
}
