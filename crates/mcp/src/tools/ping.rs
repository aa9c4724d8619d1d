// Liveness check tool

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, Tool, ToolError};
use ssemcp_core::SuccessEnvelope;

pub const PING_MESSAGE: &str = "Server is running";

/// Always succeeds with `status: "ok"`. Clients use it to confirm the server is up.
pub struct PingTool {
    server_name: String,
}

impl PingTool {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for PingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "ping".to_string(),
            description: "Simple ping to check that the MCP server is running".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<SuccessEnvelope, ToolError> {
        Ok(SuccessEnvelope::ok(PING_MESSAGE).with_field("server", self.server_name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ping_reports_ok() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PingTool::new("Generic MCP Server")));

        let output = registry.invoke("ping", None).await;
        assert!(!output.is_error);

        let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["message"], PING_MESSAGE);
        assert_eq!(value["server"], "Generic MCP Server");
        assert!(value.get("error").is_none());

        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_ping_ignores_arguments() {
        let tool = PingTool::new("x");
        let envelope = tool
            .execute(serde_json::json!({ "unexpected": true }))
            .await
            .unwrap();
        assert_eq!(envelope.status, ssemcp_core::Status::Ok);
    }
}
