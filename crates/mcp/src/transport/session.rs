// SSE session bookkeeping: one outbound channel per connected client

use crate::protocol::JsonRpcResponse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Unique identifier for an SSE session, rendered as 32 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Accepts both the simple and the hyphenated UUID forms
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| TransportError::InvalidSessionId(raw.to_string()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("session_id is required")]
    MissingSessionId,

    #[error("Invalid session ID")]
    InvalidSessionId(String),

    #[error("Could not find session")]
    SessionNotFound(SessionId),

    #[error("Session closed")]
    SessionClosed(SessionId),

    #[error("Could not parse message")]
    InvalidMessage(String),
}

/// Live sessions keyed by id
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, mpsc::Sender<JsonRpcResponse>>>,
    channel_capacity: usize,
}

impl SessionManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a new session and hand back the receiving end of its channel
    pub async fn open(&self) -> (SessionId, mpsc::Receiver<JsonRpcResponse>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let id = SessionId::new();
        self.sessions.write().await.insert(id, tx);
        (id, rx)
    }

    /// Queue a message for a session's stream. A closed stream ends the session.
    pub async fn send(&self, id: SessionId, message: JsonRpcResponse) -> Result<(), TransportError> {
        let sender = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TransportError::SessionNotFound(id))?;

        if sender.send(message).await.is_err() {
            self.close(id).await;
            return Err(TransportError::SessionClosed(id));
        }

        Ok(())
    }

    /// Remove a session. Returns whether it was still registered.
    pub async fn close(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Closes its session when dropped, i.e. when the client's stream goes away
pub(crate) struct SessionGuard {
    pub(crate) id: SessionId,
    pub(crate) sessions: Arc<SessionManager>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.id;
        let sessions = self.sessions.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if sessions.close(id).await {
                    tracing::info!("SSE session {} closed", id);
                }
            });
        }
    }
}
