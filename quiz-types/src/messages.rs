use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{GamePhase, GameState, Ordinal, ParticipantRecord, QuestionView, QuizError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    Join { nickname: String, join_code: String },
    SubmitAnswer { question_id: Ordinal, answer: String },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Joined {
        session_id: Uuid,
        participant: ParticipantRecord,
        state: GameState,
    },
    JoinRejected { reason: String },
    QuestionChanged { question: QuestionView, state: GameState },
    PhaseChanged { state: GameState },
    AnswerAccepted { question_id: Ordinal },
    AnswerRejected { question_id: Ordinal, error: QuizError },
    Error { message: String },
}

impl ServerMessage {
    pub fn phase(&self) -> Option<GamePhase> {
        match self {
            ServerMessage::Joined { state, .. }
            | ServerMessage::QuestionChanged { state, .. }
            | ServerMessage::PhaseChanged { state } => Some(state.phase),
            _ => None,
        }
    }
}
