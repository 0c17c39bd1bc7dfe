//! Error types for the Weather MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the Weather MCP Server
#[derive(Error, Debug)]
pub enum WeatherMcpError {
    /// Bearer token and identity errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Weather API or identity provider errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Bearer token and identity errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing credential: request has no bearer token")]
    MissingCredential,

    #[error("Invalid token: {description}")]
    InvalidToken { description: String },

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token audience does not match this resource")]
    InvalidAudience,

    #[error("Signing key set unavailable: {message}")]
    KeySetUnavailable { message: String },

    #[error("No signing key with id '{kid}'")]
    UnknownSigningKey { kid: String },

    #[error("Unable to resolve caller identity")]
    UserinfoUnavailable,
}

impl AuthError {
    /// HTTP status for this error. Every variant is an authentication
    /// failure, so this is always 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Builds the `WWW-Authenticate` header value per RFC 6750 Section 3,
    /// with the RFC 9728 `resource_metadata` parameter when available.
    pub fn www_authenticate(&self, resource_metadata_url: Option<&str>) -> String {
        let mut parts = Vec::new();

        if let Some(url) = resource_metadata_url {
            parts.push(format!("resource_metadata=\"{}\"", url));
        }

        match self {
            // No error code when the request carried no credentials at all
            AuthError::MissingCredential => {}
            other => {
                parts.push("error=\"invalid_token\"".to_string());
                parts.push(format!(
                    "error_description=\"{}\"",
                    other.to_string().replace('"', "'")
                ));
            }
        }

        if parts.is_empty() {
            "Bearer".to_string()
        } else {
            format!("Bearer {}", parts.join(", "))
        }
    }
}

/// Weather API and identity provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream request to {url} failed: {message}")]
    Unavailable { url: String, message: String },

    #[error("Malformed upstream response: missing or invalid '{field}'")]
    MalformedResponse { field: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },
}

/// Result type alias for Weather MCP operations
pub type Result<T> = std::result::Result<T, WeatherMcpError>;
