//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool handler. Transport-agnostic; see
//! [`crate::mcp::http`] for the HTTP binding.

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::mcp::tools::{ToolContext, ToolHandler};
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "weather";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for the weather tools
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(config: &Config) -> Self {
        Self::with_tool_handler(ToolHandler::new(config))
    }

    /// Create a server around an existing tool handler
    pub fn with_tool_handler(tool_handler: ToolHandler) -> Self {
        Self { tool_handler }
    }

    /// Handle an incoming JSON-RPC message.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(
        &self,
        message: &str,
        ctx: &ToolContext,
    ) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Ok(Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            )));
        }

        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Notification received");
            return Ok(None);
        };

        tracing::debug!(method = %request.method, id = ?id, "Request received");

        match request.method.as_str() {
            methods::INITIALIZE => match self.handle_initialize(&request) {
                Ok(result) => Ok(Some(JsonRpcResponse::success(Some(id), result))),
                Err(error) => Ok(Some(JsonRpcResponse::error(Some(id), error))),
            },
            methods::PING => Ok(Some(JsonRpcResponse::success(
                Some(id),
                serde_json::json!({}),
            ))),
            methods::LIST_TOOLS => {
                let result = self.handle_list_tools()?;
                Ok(Some(JsonRpcResponse::success(Some(id), result)))
            }
            methods::CALL_TOOL => match self.handle_call_tool(&request, ctx).await {
                Ok(result) => Ok(Some(JsonRpcResponse::success(Some(id), result))),
                Err(error) => Ok(Some(JsonRpcResponse::error(Some(id), error))),
            },
            _ => Ok(Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::method_not_found(&request.method),
            ))),
        }
    }

    /// Handle initialize request
    fn handle_initialize(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: InitializeParams = match request.params.as_ref() {
            Some(p) => serde_json::from_value(p.clone()).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid initialize parameters: {}", e))
            })?,
            None => return Err(JsonRpcError::invalid_params("Missing initialize parameters")),
        };

        tracing::info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol_version = %params.protocol_version,
            "Client initializing"
        );

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
        };

        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::invalid_params(format!("Unserializable result: {}", e)))
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    async fn handle_call_tool(
        &self,
        request: &JsonRpcRequest,
        ctx: &ToolContext,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => serde_json::from_value(p.clone()).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e))
            })?,
            None => return Err(JsonRpcError::invalid_params("Missing tool parameters")),
        };

        tracing::info!(tool = %params.name, sub = ?ctx.subject(), "Tool call");

        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments, ctx)
            .await;
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::invalid_params(format!("Unserializable result: {}", e)))
    }
}
