use async_trait::async_trait;
use chrono::Utc;
use quiz_types::{
    GameState, Ordinal, ParticipantRecord, QuestionRecord, ResponseRecord, SubmitOutcome,
};
use std::collections::BTreeMap;
use tokio::sync::{RwLock, watch};

use crate::{QuizStore, StateFeed, SyncError};

#[derive(Debug, Default)]
struct Collections {
    questions: BTreeMap<String, QuestionRecord>,
    state: Option<GameState>,
    responses: Vec<ResponseRecord>,
    participants: Vec<ParticipantRecord>,
}

/// In-process store. Used by tests and by single-process deployments that
/// do not need the SQL backend.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    feed: StateFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            feed: StateFeed::new(GameState::default()),
        }
    }

    pub async fn with_questions(questions: Vec<QuestionRecord>) -> Self {
        let store = Self::new();
        {
            let mut collections = store.collections.write().await;
            for (ordinal, record) in questions.into_iter().enumerate() {
                collections.questions.insert(ordinal.to_string(), record);
            }
        }
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn load_questions(&self) -> Result<Vec<(String, QuestionRecord)>, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections
            .questions
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect())
    }

    async fn get_question(&self, key: &str) -> Result<Option<QuestionRecord>, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections.questions.get(key).cloned())
    }

    async fn replace_questions(
        &self,
        documents: Vec<(String, QuestionRecord)>,
    ) -> Result<(), SyncError> {
        let mut collections = self.collections.write().await;
        collections.questions = documents.into_iter().collect();
        Ok(())
    }

    async fn question_count(&self) -> Result<u32, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections.questions.len() as u32)
    }

    async fn get_state(&self) -> Result<GameState, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections.state.clone().unwrap_or_default())
    }

    async fn compare_and_swap_state(
        &self,
        expected_version: u64,
        next: GameState,
    ) -> Result<GameState, SyncError> {
        let stored = {
            let mut collections = self.collections.write().await;
            let current_version = collections.state.as_ref().map_or(0, |s| s.version);
            if current_version != expected_version {
                return Err(SyncError::StateConflict {
                    expected: expected_version,
                });
            }

            let stored = GameState {
                version: expected_version + 1,
                ..next
            };
            collections.state = Some(stored.clone());
            stored
        };

        self.feed.publish(&stored);
        Ok(stored)
    }

    async fn append_response(
        &self,
        question_id: Ordinal,
        nickname: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, SyncError> {
        let mut collections = self.collections.write().await;
        if collections
            .responses
            .iter()
            .any(|r| r.question_id == question_id && r.nickname == nickname)
        {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        let record = ResponseRecord {
            question_id,
            nickname: nickname.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        };
        collections.responses.push(record.clone());
        Ok(SubmitOutcome::Recorded(record))
    }

    async fn clear_responses(&self) -> Result<u64, SyncError> {
        let mut collections = self.collections.write().await;
        let removed = collections.responses.len() as u64;
        collections.responses.clear();
        Ok(removed)
    }

    async fn responses(
        &self,
        question_id: Option<Ordinal>,
    ) -> Result<Vec<ResponseRecord>, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections
            .responses
            .iter()
            .filter(|r| question_id.is_none_or(|id| r.question_id == id))
            .cloned()
            .collect())
    }

    async fn append_participant(&self, nickname: &str) -> Result<ParticipantRecord, SyncError> {
        let record = ParticipantRecord {
            nickname: nickname.to_string(),
            timestamp: Utc::now(),
        };
        let mut collections = self.collections.write().await;
        collections.participants.push(record.clone());
        Ok(record)
    }

    async fn participants(&self) -> Result<Vec<ParticipantRecord>, SyncError> {
        let collections = self.collections.read().await;
        Ok(collections.participants.clone())
    }

    fn subscribe(&self) -> watch::Receiver<GameState> {
        self.feed.subscribe()
    }
}
