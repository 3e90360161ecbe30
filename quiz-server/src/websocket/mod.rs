use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::auth::PassphraseGate;
use crate::quiz_service::QuizService;
use quiz_types::{ClientMessage, ServerMessage};

pub mod broadcaster;
pub mod connection;
pub mod handlers;
pub mod rate_limiter;

use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let message_receiver = connection_manager.create_connection(connection_id).await;

    let message_handler = MessageHandler::new(
        connection_id,
        connection_manager.clone(),
        quiz_service,
        gate,
    );

    let incoming_handler = {
        let connection_manager = connection_manager.clone();
        let mut rate_limiter = RateLimiter::new();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) if msg.is_close() => break,
                    Ok(msg) => {
                        if !rate_limiter.check_rate_limit() {
                            warn!("Rate limit exceeded for connection {}", connection_id);
                            let _ = connection_manager
                                .send_to_connection(
                                    connection_id,
                                    ServerMessage::Error {
                                        message: "Rate limit exceeded".to_string(),
                                    },
                                )
                                .await;
                            continue;
                        }

                        if let Err(e) = handle_message(msg, &message_handler).await {
                            error!("Error handling message for {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
        }
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!("Connection {} disconnected", connection_id);
    connection_manager.remove_connection(connection_id).await;
}

async fn handle_message(
    msg: Message,
    message_handler: &MessageHandler,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !msg.is_text() {
        return Ok(());
    }

    let text = msg.to_str().map_err(|_| "Invalid text message")?;

    let client_message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            // Malformed frames are reported back but do not drop the socket
            message_handler
                .report_error(&format!("Invalid JSON message: {}", e))
                .await?;
            return Ok(());
        }
    };

    message_handler
        .handle_message(client_message)
        .await
        .map_err(|e| format!("Message handling error: {}", e))?;

    Ok(())
}
