// HTTP+SSE transport: GET opens an event stream, POST delivers client messages

use super::session::{SessionGuard, SessionId, SessionManager, TransportError};
use crate::protocol::{JsonRpcError, JsonRpcResponse};
use crate::server::McpServer;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SSE_PATH: &str = "/sse";
pub const DEFAULT_MESSAGE_PATH: &str = "/messages/";
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SseConfig {
    /// Where clients open their event stream
    pub sse_path: String,
    /// Where clients POST JSON-RPC messages, announced in the `endpoint` event
    pub message_path: String,
    pub keep_alive: Duration,
    /// Outbound messages buffered per session
    pub channel_capacity: usize,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            sse_path: DEFAULT_SSE_PATH.to_string(),
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: Arc<SessionManager>,
    config: Arc<SseConfig>,
}

/// Serves an [`McpServer`] to remote clients over Server-Sent Events
pub struct SseTransport {
    state: SseState,
}

impl SseTransport {
    pub fn new(server: Arc<McpServer>, config: SseConfig) -> Self {
        let sessions = Arc::new(SessionManager::new(config.channel_capacity));
        Self {
            state: SseState {
                server,
                sessions,
                config: Arc::new(config),
            },
        }
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        self.state.sessions.clone()
    }

    pub fn config(&self) -> &SseConfig {
        &self.state.config
    }

    /// Routes for the stream and message endpoints, ready to merge into an app
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.state.config.sse_path, get(open_stream))
            .route(&self.state.config.message_path, post(post_message))
            .with_state(self.state.clone())
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let status = match &self {
            TransportError::MissingSessionId
            | TransportError::InvalidSessionId(_)
            | TransportError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            TransportError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            TransportError::SessionClosed(_) => StatusCode::GONE,
        };

        (status, self.to_string()).into_response()
    }
}

/// GET handler: registers a session and streams its messages
async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, mut rx) = state.sessions.open().await;
    let endpoint = format!("{}?session_id={}", state.config.message_path, session_id);
    tracing::info!("SSE session {} opened", session_id);

    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint));

        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => yield Ok(Event::default().event("message").data(json)),
                Err(e) => tracing::error!("Failed to serialize message for session {}: {}", session_id, e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.keep_alive))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// POST handler: accepts one JSON-RPC message; the reply travels over the stream
async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Result<(StatusCode, &'static str), TransportError> {
    let raw_id = query.session_id.ok_or(TransportError::MissingSessionId)?;
    let session_id = SessionId::parse(&raw_id)?;

    if !state.sessions.contains(session_id).await {
        tracing::debug!("Message for unknown session {}", session_id);
        return Err(TransportError::SessionNotFound(session_id));
    }

    let message: serde_json::Value = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Unparseable message for session {}: {}", session_id, e);
            let parse_error = JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error());
            if let Err(e) = state.sessions.send(session_id, parse_error).await {
                tracing::debug!("Could not report parse error to session {}: {}", session_id, e);
            }
            return Err(TransportError::InvalidMessage(e.to_string()));
        }
    };

    let server = state.server.clone();
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        if let Some(response) = server.handle_value(message).await {
            if let Err(e) = sessions.send(session_id, response).await {
                tracing::warn!("Dropping response for session {}: {}", session_id, e);
            }
        }
    });

    Ok((StatusCode::ACCEPTED, "Accepted"))
}
