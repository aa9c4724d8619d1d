// Tool trait, registry and the failure boundary every invocation runs inside

use crate::protocol::ToolSchema;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use ssemcp_core::{Envelope, ErrorEnvelope, SuccessEnvelope};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Failure raised inside a tool. Never leaves the boundary as anything but an error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A remote service the tool depends on failed
    #[error("Failed to fetch {resource}: {message}")]
    Upstream { resource: String, message: String },

    #[error("An error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn upstream(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::Upstream {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<SuccessEnvelope, ToolError>;
}

/// Deserialize a tool's arguments object into its typed parameters
pub fn parse_arguments<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Run a tool future and fold every exit path, panics included, into one envelope
pub async fn contain<F>(tool_name: &str, future: F) -> Envelope
where
    F: Future<Output = Result<SuccessEnvelope, ToolError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(envelope)) => envelope.into(),
        Ok(Err(e)) => {
            tracing::warn!("Tool {} failed: {}", tool_name, e);
            ErrorEnvelope::stamped(e.to_string()).into()
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Tool {} panicked: {}", tool_name, message);
            ErrorEnvelope::stamped(format!("An error occurred: {}", message)).into()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}

/// Text result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl From<Envelope> for ToolOutput {
    fn from(envelope: Envelope) -> Self {
        Self {
            is_error: envelope.is_error(),
            text: envelope.to_text(),
        }
    }
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        if self.tools.insert(schema.name.clone(), tool).is_some() {
            tracing::warn!("Tool {} registered twice, keeping the latest", schema.name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, ordered by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name. Always yields envelope text, whatever happens.
    pub async fn invoke(&self, name: &str, arguments: Option<serde_json::Value>) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Call to unknown tool: {}", name);
            return Envelope::from(ErrorEnvelope::stamped(format!("Unknown tool: {}", name))).into();
        };

        let arguments = match arguments {
            None | Some(serde_json::Value::Null) => serde_json::json!({}),
            Some(arguments) => arguments,
        };

        tracing::debug!("Invoking tool {}", name);
        contain(name, tool.execute(arguments)).await.into()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}
