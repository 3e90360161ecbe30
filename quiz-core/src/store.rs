use async_trait::async_trait;
use quiz_types::{
    GameState, Ordinal, ParticipantRecord, QuestionRecord, ResponseRecord, SubmitOutcome,
};
use std::sync::Arc;
use tokio::sync::watch;

use crate::SyncError;

pub type SharedStore = Arc<dyn QuizStore>;

/// Backing store shared by the host and every player.
///
/// Mirrors the four logical collections: `questions/{key}`,
/// `game_state/current`, `responses` and `participants`. Timestamps on
/// appended records are assigned by the store.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Every question document as `(key, record)`, in the store's natural
    /// key order.
    async fn load_questions(&self) -> Result<Vec<(String, QuestionRecord)>, SyncError>;

    async fn get_question(&self, key: &str) -> Result<Option<QuestionRecord>, SyncError>;

    /// Replaces the whole question collection with `documents`. Keys that
    /// are not in `documents` no longer exist afterwards.
    async fn replace_questions(
        &self,
        documents: Vec<(String, QuestionRecord)>,
    ) -> Result<(), SyncError>;

    async fn question_count(&self) -> Result<u32, SyncError>;

    /// Reads `game_state/current`, returning the default state when the
    /// document does not exist yet.
    async fn get_state(&self) -> Result<GameState, SyncError>;

    /// Writes `next` only if the stored version still equals
    /// `expected_version`. The stored state gets `expected_version + 1` and
    /// is returned.
    async fn compare_and_swap_state(
        &self,
        expected_version: u64,
        next: GameState,
    ) -> Result<GameState, SyncError>;

    /// Appends a response unless one already exists for
    /// `(question_id, nickname)`.
    async fn append_response(
        &self,
        question_id: Ordinal,
        nickname: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, SyncError>;

    /// Deletes every response and returns how many were removed.
    async fn clear_responses(&self) -> Result<u64, SyncError>;

    /// Responses in insertion order, optionally filtered to one question.
    async fn responses(&self, question_id: Option<Ordinal>)
    -> Result<Vec<ResponseRecord>, SyncError>;

    async fn append_participant(&self, nickname: &str) -> Result<ParticipantRecord, SyncError>;

    async fn participants(&self) -> Result<Vec<ParticipantRecord>, SyncError>;

    /// Push channel carrying the latest written state.
    fn subscribe(&self) -> watch::Receiver<GameState>;
}

/// Publishes state writes to subscribers, dropping anything older than what
/// was already published so readers only ever see the version move forward.
#[derive(Debug)]
pub struct StateFeed {
    sender: watch::Sender<GameState>,
}

impl StateFeed {
    pub fn new(initial: GameState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn publish(&self, state: &GameState) -> bool {
        self.sender.send_if_modified(|current| {
            if state.version > current.version {
                *current = state.clone();
                true
            } else {
                false
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> GameState {
        self.sender.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_ignores_stale_versions() {
        let feed = StateFeed::new(GameState::default());
        let receiver = feed.subscribe();

        let newer = GameState {
            current_index: 2,
            version: 3,
            ..GameState::default()
        };
        assert!(feed.publish(&newer));

        let stale = GameState {
            current_index: 1,
            version: 2,
            ..GameState::default()
        };
        assert!(!feed.publish(&stale));
        assert_eq!(receiver.borrow().current_index, 2);
        assert_eq!(feed.latest().version, 3);
    }
}
