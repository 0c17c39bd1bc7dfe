//! Minimal HTTP client for calling tools on a running server

use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{json, Value};

use crate::error::{McpError, Result, WeatherMcpError};
use crate::mcp::types::*;

/// Client for a single MCP endpoint
pub struct McpClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// MCP endpoint URL
    url: String,

    /// Bearer token presented on every request
    token: Option<String>,

    /// Next request id
    next_id: AtomicI64,
}

impl McpClient {
    /// Create a client for `url`
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
            token,
            next_id: AtomicI64::new(1),
        }
    }

    /// Perform the initialize handshake
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let result = self
            .request(
                methods::INITIALIZE,
                Some(json!({
                    "protocolVersion": MCP_VERSION,
                    "clientInfo": {"name": "weather-mcp-client", "version": env!("CARGO_PKG_VERSION")},
                    "capabilities": {}
                })),
            )
            .await?;
        self.notify(methods::INITIALIZED).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// List the server's tools
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.request(methods::LIST_TOOLS, None).await?;
        let tools: ListToolsResult = serde_json::from_value(result)?;
        Ok(tools.tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let result = self
            .request(
                methods::CALL_TOOL,
                Some(json!({"name": name, "arguments": arguments})),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let request = JsonRpcRequest::new(id, method, params);

        let response: JsonRpcResponse = self
            .post(&request)
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(WeatherMcpError::Mcp(McpError::ProtocolError {
                message: format!("{} ({})", error.message, error.code),
            }));
        }

        response.result.ok_or_else(|| {
            WeatherMcpError::Mcp(McpError::ProtocolError {
                message: format!("Response to {} has no result", method),
            })
        })
    }

    async fn notify(&self, method: &str) -> Result<()> {
        self.post(&JsonRpcRequest::notification(method))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .json(message);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.send().await?)
    }
}

/// Parse `key=value` pairs into a JSON object; numeric values become numbers
pub fn parse_arguments(pairs: &[String]) -> Result<Value> {
    let mut arguments = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            WeatherMcpError::Mcp(McpError::InvalidArguments {
                message: format!("expected key=value, got '{}'", pair),
            })
        })?;
        let value = match value.parse::<serde_json::Number>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::String(value.to_string()),
        };
        arguments.insert(key.to_string(), value);
    }
    Ok(Value::Object(arguments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(&[
            "state=NC".to_string(),
            "latitude=35.5".to_string(),
            "longitude=-78".to_string(),
        ])
        .unwrap();
        assert_eq!(args, json!({"state": "NC", "latitude": 35.5, "longitude": -78}));
    }

    #[test]
    fn test_parse_arguments_rejects_bare_key() {
        assert!(parse_arguments(&["state".to_string()]).is_err());
    }
}
