use anyhow::Context;
use quiz_core::{Catalog, CatalogOrder, HostController, SharedStore, SyncError, keyed_documents};
use quiz_types::{
    GamePhase, GameState, Ordinal, ParticipantRecord, QuestionRecord, QuestionView,
    SubmitOutcome,
};
use std::path::Path;
use tokio::sync::watch;
use tracing::{info, warn};

/// Server-side entry point to the quiz: host actions go through the
/// `HostController`, remote players are attributed here.
pub struct QuizService {
    host: HostController,
    store: SharedStore,
}

impl QuizService {
    pub fn new(host: HostController) -> Self {
        let store = host.store().clone();
        Self { host, store }
    }

    /// Loads the catalog from the store. Fails when there are no usable
    /// questions, which stops the server before any player can join.
    pub async fn load(store: SharedStore, order: CatalogOrder) -> Result<Self, SyncError> {
        let catalog = Catalog::load(store.as_ref(), order).await?;
        Ok(Self::new(HostController::new(store, catalog)))
    }

    pub fn host(&self) -> &HostController {
        &self.host
    }

    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.store.subscribe()
    }

    pub async fn state(&self) -> Result<GameState, SyncError> {
        self.store.get_state().await
    }

    /// The player-facing question for `state`, if a question is showing.
    pub async fn question_view(&self, state: &GameState) -> Result<Option<QuestionView>, SyncError> {
        let showing_question = matches!(state.phase, GamePhase::InProgress | GamePhase::Revealed);
        if !state.started || !showing_question {
            return Ok(None);
        }

        let index = state.current_index;
        let catalog = self.host.catalog();
        let record = catalog.fetch(self.store.as_ref(), index).await?;
        Ok(Some(QuestionView::new(
            index,
            catalog.len(),
            &record,
            state.is_revealed(),
        )))
    }

    pub async fn join(&self, nickname: &str) -> Result<ParticipantRecord, SyncError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SyncError::InvalidNickname);
        }

        let participant = self.store.append_participant(nickname).await?;
        info!("Player '{}' joined", nickname);
        Ok(participant)
    }

    /// Records an answer for the active question. Answers aimed at any
    /// other question, or sent while answers are closed, are rejected.
    pub async fn submit_answer(
        &self,
        nickname: &str,
        question_id: Ordinal,
        answer: &str,
    ) -> Result<SubmitOutcome, SyncError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SyncError::InvalidNickname);
        }

        let state = self.store.get_state().await?;
        if !state.is_accepting_answers() {
            return Err(SyncError::NotAcceptingAnswers { phase: state.phase });
        }
        if state.current_index != question_id {
            warn!(
                "'{}' answered question {} while {} is active",
                nickname, question_id, state.current_index
            );
            return Err(SyncError::WrongQuestion {
                active: state.current_index,
                submitted: question_id,
            });
        }

        self.store
            .append_response(question_id, nickname, answer)
            .await
    }
}

/// Replaces the stored questions with those in a JSON file, keyed "0", "1",
/// ..., and returns how many were written.
pub async fn seed_questions_from_file(store: &SharedStore, path: &Path) -> anyhow::Result<usize> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let questions: Vec<QuestionRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;

    let count = questions.len();
    store.replace_questions(keyed_documents(questions)).await?;

    info!("Seeded {} questions from {}", count, path.display());
    Ok(count)
}
