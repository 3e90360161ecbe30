use quiz_types::{GamePhase, Ordinal, QuizError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("question catalog is empty")]
    EmptyCatalog,
    #[error("question catalog could not be loaded: {0}")]
    CatalogUnavailable(String),
    #[error("question {index} not found")]
    QuestionNotFound { index: Ordinal },
    #[error("malformed record {key}: {reason}")]
    MalformedRecord { key: String, reason: String },
    #[error("game state changed since version {expected}")]
    StateConflict { expected: u64 },
    #[error("cannot {action} while {from:?}")]
    InvalidTransition { from: GamePhase, action: &'static str },
    #[error("answers are not being accepted while {phase:?}")]
    NotAcceptingAnswers { phase: GamePhase },
    #[error("question {submitted} is not the active question {active}")]
    WrongQuestion { active: Ordinal, submitted: Ordinal },
    #[error("nickname must not be empty")]
    InvalidNickname,
    #[error("store error: {0}")]
    Store(String),
}

impl SyncError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        SyncError::Store(err.to_string())
    }
}

impl From<SyncError> for QuizError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::QuestionNotFound { index } => QuizError::QuestionNotFound { index },
            SyncError::NotAcceptingAnswers { phase } => QuizError::NotAcceptingAnswers { phase },
            SyncError::WrongQuestion { active, submitted } => {
                QuizError::WrongQuestion { active, submitted }
            }
            SyncError::InvalidNickname => QuizError::InvalidNickname,
            SyncError::StateConflict { .. } => QuizError::StateConflict,
            other => QuizError::InternalError {
                message: other.to_string(),
            },
        }
    }
}
