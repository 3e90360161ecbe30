use async_trait::async_trait;
use quiz_core::{QuizStore, StateFeed, SyncError};
use quiz_types::{
    GameState, Ordinal, ParticipantRecord, QuestionRecord, ResponseRecord, SubmitOutcome,
};
use sea_orm::DatabaseConnection;
use tokio::sync::watch;

use crate::repositories::{
    GameStateRepository, ParticipantRepository, QuestionRepository, ResponseRepository,
    SwapResult,
};

fn into_sync_error(err: anyhow::Error) -> SyncError {
    err.downcast::<SyncError>().unwrap_or_else(SyncError::store)
}

/// `QuizStore` backed by the SQL tables. Push notifications only cover
/// writes made through this process.
pub struct SqlStore {
    questions: QuestionRepository,
    state: GameStateRepository,
    responses: ResponseRepository,
    participants: ParticipantRepository,
    feed: StateFeed,
}

impl SqlStore {
    pub async fn new(db: DatabaseConnection) -> Result<Self, SyncError> {
        let state = GameStateRepository::new(db.clone());
        let initial = state
            .find_current()
            .await
            .map_err(into_sync_error)?
            .unwrap_or_default();

        Ok(Self {
            questions: QuestionRepository::new(db.clone()),
            state,
            responses: ResponseRepository::new(db.clone()),
            participants: ParticipantRepository::new(db),
            feed: StateFeed::new(initial),
        })
    }
}

#[async_trait]
impl QuizStore for SqlStore {
    async fn load_questions(&self) -> Result<Vec<(String, QuestionRecord)>, SyncError> {
        self.questions.find_all().await.map_err(into_sync_error)
    }

    async fn get_question(&self, key: &str) -> Result<Option<QuestionRecord>, SyncError> {
        self.questions.find_by_key(key).await.map_err(into_sync_error)
    }

    async fn replace_questions(
        &self,
        documents: Vec<(String, QuestionRecord)>,
    ) -> Result<(), SyncError> {
        self.questions
            .replace_all(documents)
            .await
            .map_err(into_sync_error)
    }

    async fn question_count(&self) -> Result<u32, SyncError> {
        let count = self.questions.count().await.map_err(into_sync_error)?;
        u32::try_from(count).map_err(SyncError::store)
    }

    async fn get_state(&self) -> Result<GameState, SyncError> {
        let state = self
            .state
            .find_current()
            .await
            .map_err(into_sync_error)?
            .unwrap_or_default();
        // Keep push subscribers current with writes from other processes
        self.feed.publish(&state);
        Ok(state)
    }

    async fn compare_and_swap_state(
        &self,
        expected_version: u64,
        next: GameState,
    ) -> Result<GameState, SyncError> {
        match self
            .state
            .compare_and_swap(expected_version, &next)
            .await
            .map_err(into_sync_error)?
        {
            SwapResult::Swapped(stored) => {
                self.feed.publish(&stored);
                Ok(stored)
            }
            SwapResult::Conflict => Err(SyncError::StateConflict {
                expected: expected_version,
            }),
        }
    }

    async fn append_response(
        &self,
        question_id: Ordinal,
        nickname: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, SyncError> {
        let stored = self
            .responses
            .insert_unique(question_id, nickname, answer)
            .await
            .map_err(into_sync_error)?;

        Ok(match stored {
            Some(record) => SubmitOutcome::Recorded(record),
            None => SubmitOutcome::AlreadySubmitted,
        })
    }

    async fn clear_responses(&self) -> Result<u64, SyncError> {
        self.responses.delete_all().await.map_err(into_sync_error)
    }

    async fn responses(
        &self,
        question_id: Option<Ordinal>,
    ) -> Result<Vec<ResponseRecord>, SyncError> {
        self.responses.find(question_id).await.map_err(into_sync_error)
    }

    async fn append_participant(&self, nickname: &str) -> Result<ParticipantRecord, SyncError> {
        self.participants.append(nickname).await.map_err(into_sync_error)
    }

    async fn participants(&self) -> Result<Vec<ParticipantRecord>, SyncError> {
        self.participants.find_all().await.map_err(into_sync_error)
    }

    fn subscribe(&self) -> watch::Receiver<GameState> {
        self.feed.subscribe()
    }
}
