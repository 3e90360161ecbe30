use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::quiz_service::QuizService;
use crate::websocket::ConnectionManager;
use quiz_types::{GameState, ServerMessage};

/// Builds the push message for a state change. A new question (or a
/// reveal, which changes what the question view shows) carries the view;
/// anything else is a bare phase change.
pub async fn message_for_state(
    quiz_service: &QuizService,
    state: GameState,
) -> ServerMessage {
    match quiz_service.question_view(&state).await {
        Ok(Some(question)) => ServerMessage::QuestionChanged { question, state },
        Ok(None) => ServerMessage::PhaseChanged { state },
        Err(e) => {
            error!("Failed to load question {}: {}", state.current_index, e);
            ServerMessage::Error {
                message: e.to_string(),
            }
        }
    }
}

/// Pushes every state change to all joined sockets.
///
/// Writes made through this process arrive on the store's push channel;
/// the periodic re-read picks up writes made elsewhere.
pub fn spawn_state_broadcaster(
    quiz_service: Arc<QuizService>,
    connection_manager: Arc<ConnectionManager>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    let mut updates = quiz_service.subscribe();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().clone();
                    let message = message_for_state(&quiz_service, state).await;
                    let reached = connection_manager.broadcast_to_joined(message).await;
                    debug!("Pushed state change to {} connections", reached);
                }
                _ = interval.tick() => {
                    if let Err(e) = quiz_service.state().await {
                        error!("Failed to refresh game state: {}", e);
                    }
                }
            }
        }
    })
}
