use quiz_types::{
    FirstCorrect, GameState, Ordinal, ParticipantRecord, QuestionRecord, QuestionTally,
    RankedPlayer,
};
use tracing::{info, warn};

use crate::transitions::{self, HostAction};
use crate::{Catalog, ScoringEngine, SharedStore, SyncError};

/// The active question as the host sees it, answer included.
#[derive(Debug, Clone, PartialEq)]
pub struct HostQuestion {
    pub index: Ordinal,
    pub total: u32,
    pub record: QuestionRecord,
    pub state: GameState,
}

/// Drives the shared game state and reads results back out of the
/// response log.
pub struct HostController {
    store: SharedStore,
    catalog: Catalog,
}

impl HostController {
    pub fn new(store: SharedStore, catalog: Catalog) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub async fn state(&self) -> Result<GameState, SyncError> {
        self.store.get_state().await
    }

    /// Applies `action` to the stored state. A reset also empties the
    /// response log once the state write has landed.
    ///
    /// With `expected_version` set, the write only lands if the stored state
    /// is still the one the caller last saw; otherwise the version just read
    /// is used and only a write racing this call can conflict.
    pub async fn apply(
        &self,
        action: HostAction,
        expected_version: Option<u64>,
    ) -> Result<GameState, SyncError> {
        let current = self.store.get_state().await?;
        if let Some(expected) = expected_version {
            if expected != current.version {
                warn!(
                    "Rejected {} from stale host view (version {} vs {})",
                    action.name(),
                    expected,
                    current.version
                );
                return Err(SyncError::StateConflict { expected });
            }
        }

        let next = transitions::apply(&current, action, self.catalog.len())?;
        let stored = self
            .store
            .compare_and_swap_state(current.version, next)
            .await?;

        info!(
            "Host {}: question {} / {}, phase {:?}, version {}",
            action.name(),
            stored.current_index + 1,
            self.catalog.len(),
            stored.phase,
            stored.version
        );

        // Replays start from an empty response log
        if action == HostAction::Reset {
            let removed = self.store.clear_responses().await?;
            info!("Cleared {} responses from the previous game", removed);
        }

        Ok(stored)
    }

    pub async fn start(&self) -> Result<GameState, SyncError> {
        self.apply(HostAction::Start, None).await
    }

    pub async fn advance(&self) -> Result<GameState, SyncError> {
        self.apply(HostAction::Advance, None).await
    }

    pub async fn reveal_answer(&self) -> Result<GameState, SyncError> {
        self.apply(HostAction::ToggleReveal, None).await
    }

    pub async fn show_results(&self) -> Result<GameState, SyncError> {
        self.apply(HostAction::ShowResults, None).await
    }

    pub async fn reset(&self) -> Result<GameState, SyncError> {
        self.apply(HostAction::Reset, None).await
    }

    pub async fn active_question(&self) -> Result<HostQuestion, SyncError> {
        let state = self.store.get_state().await?;
        let record = self.question(state.current_index)?.clone();
        Ok(HostQuestion {
            index: state.current_index,
            total: self.catalog.len(),
            record,
            state,
        })
    }

    pub async fn compute_leaderboard(
        &self,
        question_index: Ordinal,
    ) -> Result<QuestionTally, SyncError> {
        let question = self.question(question_index)?;
        let responses = self.store.responses(Some(question_index)).await?;
        Ok(ScoringEngine::question_tally(
            question_index,
            question,
            &responses,
        ))
    }

    pub async fn first_correct_responder(
        &self,
        question_index: Ordinal,
    ) -> Result<Option<FirstCorrect>, SyncError> {
        let question = self.question(question_index)?;
        let responses = self.store.responses(Some(question_index)).await?;
        Ok(ScoringEngine::first_correct_responder(
            question_index,
            question,
            &responses,
        ))
    }

    pub async fn final_results(&self) -> Result<Vec<RankedPlayer>, SyncError> {
        let responses = self.store.responses(None).await?;
        Ok(ScoringEngine::final_results(&self.catalog, &responses))
    }

    pub async fn participants(&self) -> Result<Vec<ParticipantRecord>, SyncError> {
        self.store.participants().await
    }

    fn question(&self, index: Ordinal) -> Result<&QuestionRecord, SyncError> {
        self.catalog
            .get(index)
            .ok_or(SyncError::QuestionNotFound { index })
    }
}
