use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GamePhase, Ordinal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QuizError {
    QuestionNotFound { index: Ordinal },
    NotAcceptingAnswers { phase: GamePhase },
    WrongQuestion { active: Ordinal, submitted: Ordinal },
    AlreadySubmitted,
    InvalidNickname,
    NotJoined,
    StateConflict,
    InternalError { message: String },
}
