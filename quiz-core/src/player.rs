use quiz_types::{GamePhase, GameState, ParticipantRecord, QuestionView, SubmitOutcome};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{Catalog, SharedStore, SyncError};

/// Default auto-refresh period for polling players.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveMode {
    Poll(Duration),
    Push,
}

/// What a player should be looking at.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerView {
    Waiting,
    Question(QuestionView),
    Results,
}

/// One player's session against the shared store.
///
/// The submitted flag lives only in this session. The store's
/// (question, nickname) key is what keeps a reloaded client from being
/// counted twice. Question documents are resolved through the same catalog
/// the host uses, so both agree on which document an ordinal names.
pub struct PlayerClient {
    store: SharedStore,
    catalog: Catalog,
    updates: watch::Receiver<GameState>,
    nickname: Option<String>,
    observed: Option<GameState>,
    submitted: bool,
}

impl PlayerClient {
    pub fn new(store: SharedStore, catalog: Catalog) -> Self {
        let updates = store.subscribe();
        Self {
            store,
            catalog,
            updates,
            nickname: None,
            observed: None,
            submitted: false,
        }
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn observed_state(&self) -> Option<&GameState> {
        self.observed.as_ref()
    }

    pub fn has_submitted(&self) -> bool {
        self.submitted
    }

    pub async fn join(&mut self, nickname: &str) -> Result<ParticipantRecord, SyncError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SyncError::InvalidNickname);
        }

        let record = self.store.append_participant(nickname).await?;
        info!("Player '{}' joined", nickname);
        self.nickname = Some(nickname.to_string());
        Ok(record)
    }

    /// Reads the shared state once. Returns `None` when nothing changed
    /// since the last observation.
    pub async fn observe_active_question(&mut self) -> Result<Option<PlayerView>, SyncError> {
        let state = self.store.get_state().await?;
        if self.observed.as_ref().is_some_and(|seen| seen.version == state.version) {
            return Ok(None);
        }

        let question_changed = self
            .observed
            .as_ref()
            .is_none_or(|seen| seen.current_index != state.current_index || !seen.started);
        if question_changed {
            self.submitted = false;
        }

        let view = self.view_for(&state).await?;
        debug!(
            "Observed version {} (question {}, {:?})",
            state.version, state.current_index, state.phase
        );
        self.observed = Some(state);
        Ok(Some(view))
    }

    /// Waits until the shared state moves, either by polling every
    /// `interval` or by waiting on the store's push channel.
    pub async fn wait_for_change(&mut self, mode: ObserveMode) -> Result<PlayerView, SyncError> {
        match mode {
            ObserveMode::Poll(period) => {
                let mut interval = tokio::time::interval(period);
                loop {
                    interval.tick().await;
                    if let Some(view) = self.observe_active_question().await? {
                        return Ok(view);
                    }
                }
            }
            ObserveMode::Push => loop {
                if let Some(view) = self.observe_active_question().await? {
                    return Ok(view);
                }
                self.updates
                    .changed()
                    .await
                    .map_err(|_| SyncError::store("state feed closed"))?;
            },
        }
    }

    /// Submits an answer for the observed question. Writes nothing once
    /// this session has already answered it.
    pub async fn submit(&mut self, answer: &str) -> Result<SubmitOutcome, SyncError> {
        let nickname = self.nickname.clone().ok_or(SyncError::InvalidNickname)?;
        if self.submitted {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        let state = self.observed.as_ref().ok_or(SyncError::NotAcceptingAnswers {
            phase: GamePhase::NotStarted,
        })?;
        if !state.is_accepting_answers() {
            return Err(SyncError::NotAcceptingAnswers { phase: state.phase });
        }

        let outcome = self
            .store
            .append_response(state.current_index, &nickname, answer)
            .await?;
        self.submitted = true;
        if outcome == SubmitOutcome::AlreadySubmitted {
            info!(
                "'{}' already answered question {}",
                nickname, state.current_index
            );
        }
        Ok(outcome)
    }

    async fn view_for(&self, state: &GameState) -> Result<PlayerView, SyncError> {
        if !state.started {
            return Ok(PlayerView::Waiting);
        }

        match state.phase {
            GamePhase::NotStarted => Ok(PlayerView::Waiting),
            GamePhase::Results => Ok(PlayerView::Results),
            GamePhase::InProgress | GamePhase::Revealed => {
                let index = state.current_index;
                let record = self.catalog.fetch(self.store.as_ref(), index).await?;
                Ok(PlayerView::Question(QuestionView::new(
                    index,
                    self.catalog.len(),
                    &record,
                    state.is_revealed(),
                )))
            }
        }
    }
}
