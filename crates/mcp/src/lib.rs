// MCP (Model Context Protocol) server implementation
// Exposes tools to remote agent clients over an HTTP+SSE transport

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use server::McpServer;
pub use transport::{SseConfig, SseTransport};
