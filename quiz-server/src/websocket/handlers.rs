use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::PassphraseGate;
use crate::quiz_service::QuizService;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use quiz_types::{ClientMessage, Ordinal, QuizError, ServerMessage, SubmitOutcome};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        quiz_service: Arc<QuizService>,
        gate: Arc<PassphraseGate>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            quiz_service,
            gate,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        match message {
            ClientMessage::Join {
                nickname,
                join_code,
            } => self.handle_join(nickname, join_code).await,
            ClientMessage::SubmitAnswer {
                question_id,
                answer,
            } => self.handle_submit_answer(question_id, answer).await,
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    async fn handle_join(&self, nickname: String, join_code: String) -> Result<(), String> {
        if let Err(e) = self.gate.verify_join_code(Some(&join_code)) {
            warn!("Join rejected for connection {}: {}", self.connection_id, e);
            return self
                .send_message(ServerMessage::JoinRejected {
                    reason: e.to_string(),
                })
                .await;
        }

        let participant = match self.quiz_service.join(&nickname).await {
            Ok(participant) => participant,
            Err(e) => {
                return self
                    .send_message(ServerMessage::JoinRejected {
                        reason: e.to_string(),
                    })
                    .await;
            }
        };

        self.connection_manager
            .set_nickname(self.connection_id, participant.nickname.clone())
            .await?;

        let state = self.quiz_service.state().await.map_err(|e| e.to_string())?;
        let question = self.quiz_service.question_view(&state).await;

        self.send_message(ServerMessage::Joined {
            session_id: self.connection_id.as_uuid(),
            participant,
            state: state.clone(),
        })
        .await?;

        match question {
            Ok(Some(question)) => {
                self.send_message(ServerMessage::QuestionChanged { question, state })
                    .await
            }
            Ok(None) => Ok(()),
            Err(e) => self.report_error(&e.to_string()).await,
        }
    }

    async fn handle_submit_answer(&self, question_id: Ordinal, answer: String) -> Result<(), String> {
        let Some(nickname) = self.connection_manager.nickname(self.connection_id).await else {
            return self
                .send_message(ServerMessage::AnswerRejected {
                    question_id,
                    error: QuizError::NotJoined,
                })
                .await;
        };

        let message = match self
            .quiz_service
            .submit_answer(&nickname, question_id, &answer)
            .await
        {
            Ok(SubmitOutcome::Recorded(_)) => {
                info!("'{}' answered question {}", nickname, question_id);
                ServerMessage::AnswerAccepted { question_id }
            }
            Ok(SubmitOutcome::AlreadySubmitted) => ServerMessage::AnswerRejected {
                question_id,
                error: QuizError::AlreadySubmitted,
            },
            Err(e) => {
                if matches!(e, quiz_core::SyncError::Store(_)) {
                    error!("Failed to store answer from '{}': {}", nickname, e);
                }
                ServerMessage::AnswerRejected {
                    question_id,
                    error: e.into(),
                }
            }
        };

        self.send_message(message).await
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    pub async fn report_error(&self, message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: message.to_string(),
        })
        .await
    }
}
