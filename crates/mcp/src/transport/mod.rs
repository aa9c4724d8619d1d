// Network transports for the MCP server

pub mod session;
pub mod sse;

pub use session::{SessionId, SessionManager, TransportError};
pub use sse::{SseConfig, SseTransport};
