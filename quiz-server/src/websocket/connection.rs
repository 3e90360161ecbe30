use quiz_types::ServerMessage;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub nickname: Option<String>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            nickname: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Open player sockets. Nicknames are not unique: two sockets may join
/// under the same name.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);
        let mut connections = self.connections.write().await;
        connections.insert(id, conn);
        receiver
    }

    pub async fn remove_connection(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.remove(&id) {
            info!(
                "Removed connection {} ({}) after {:?}",
                id,
                conn.nickname.as_deref().unwrap_or("not joined"),
                conn.connected_at.elapsed()
            );
        }
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn set_nickname(&self, id: ConnectionId, nickname: String) -> Result<(), String> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(&id).ok_or("Connection not found")?;
        connection.nickname = Some(nickname);
        Ok(())
    }

    pub async fn nickname(&self, id: ConnectionId) -> Option<String> {
        let connections = self.connections.read().await;
        connections.get(&id).and_then(|c| c.nickname.clone())
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.last_activity = Instant::now();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(connection) => connection.send_message(message),
            None => Err("Connection not found".to_string()),
        }
    }

    /// Sends to every joined connection and returns how many were reached.
    pub async fn broadcast_to_joined(&self, message: ServerMessage) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|c| c.nickname.is_some())
            .filter(|c| c.send_message(message.clone()).is_ok())
            .count()
    }

    pub async fn cleanup_inactive_connections(&self, timeout: Duration) {
        let mut connections = self.connections.write().await;
        let before = connections.len();
        connections.retain(|_, connection| !connection.is_inactive(timeout));

        let removed = before - connections.len();
        if removed > 0 {
            info!("Removed {} inactive connections", removed);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_only_reaches_joined_connections() {
        let manager = ConnectionManager::new();
        let joined = ConnectionId::new();
        let anonymous = ConnectionId::new();

        let mut joined_rx = manager.create_connection(joined).await;
        let mut anonymous_rx = manager.create_connection(anonymous).await;
        manager.set_nickname(joined, "alice".to_string()).await.unwrap();

        let reached = manager
            .broadcast_to_joined(ServerMessage::Error {
                message: "hello".to_string(),
            })
            .await;
        assert_eq!(reached, 1);
        assert!(joined_rx.try_recv().is_ok());
        assert!(anonymous_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_connections() {
        let manager = ConnectionManager::new();
        let _rx = manager.create_connection(ConnectionId::new()).await;
        assert_eq!(manager.connection_count().await, 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        manager
            .cleanup_inactive_connections(Duration::from_millis(1))
            .await;
        assert_eq!(manager.connection_count().await, 0);

        let id = ConnectionId::new();
        let _rx = manager.create_connection(id).await;
        manager
            .cleanup_inactive_connections(Duration::from_secs(60))
            .await;
        assert!(manager.get_connection(id).await.is_some());
    }
}
