// MCP server: dispatches JSON-RPC requests to the tool registry

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use serde_json::Value;

/// Transport-independent request handler. Holds no per-session state.
pub struct McpServer {
    info: ServerInfo,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(info: ServerInfo, registry: ToolRegistry) -> Self {
        Self { info, registry }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw message. Returns the response to send back, if any.
    pub async fn handle_message(&self, text: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                tracing::debug!("Failed to parse message: {}", e);
                Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
            }
        }
    }

    /// Handle an already-parsed JSON message
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        // Client responses carry no method; this server never sends requests, so drop them
        if value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some())
        {
            tracing::debug!("Ignoring client response message");
            return None;
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!("Invalid request: {}", e);
                Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()))
            }
        }
    }

    /// Handle a request. Notifications never produce a response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return request
                .id
                .map(|id| JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            method => {
                tracing::debug!("Unsupported method: {}", method);
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(method))
            }
        };

        Some(response)
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => tracing::info!("Client initialized"),
            "notifications/cancelled" => tracing::debug!("Client cancelled a request"),
            other => tracing::debug!("Ignoring notification: {}", other),
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing initialize params"),
                )
            }
            Err(e) => return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string())),
        };

        tracing::info!(
            "Initializing session for {} {} (protocol {})",
            params.client_info.name,
            params.client_info.version,
            params.protocol_version
        );

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                server_info: self.info.clone(),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing tool call params"))
            }
            Err(e) => return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string())),
        };

        let output = self.registry.invoke(&params.name, params.arguments).await;
        JsonRpcResponse::success(id, CallToolResult::text(output.text, output.is_error))
    }
}
