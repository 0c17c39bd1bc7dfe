//! OAuth discovery metadata
//!
//! The protected-resource document (RFC 9728) is built locally. The
//! authorization-server and OpenID documents are forwarded from the identity
//! provider on every request.

use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::UpstreamError;

/// Protected Resource Metadata per RFC 9728 Section 3
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource identifier
    pub resource: String,

    /// Issuer URLs of the authorization servers for this resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization_servers: Vec<String>,

    /// Methods for presenting bearer tokens
    #[serde(default = "default_bearer_methods")]
    pub bearer_methods_supported: Vec<String>,
}

fn default_bearer_methods() -> Vec<String> {
    vec!["header".to_string()]
}

impl ProtectedResourceMetadata {
    /// Metadata for the resource described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            resource: config.resource_url(),
            authorization_servers: vec![config.authorization_server.clone()],
            bearer_methods_supported: default_bearer_methods(),
        }
    }

    /// Well-known path of this document
    pub fn well_known_path() -> &'static str {
        "/.well-known/oauth-protected-resource"
    }
}

/// Discovery documents forwarded from the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryDocument {
    /// RFC 8414 authorization server metadata
    AuthorizationServer,

    /// OpenID Connect discovery document
    OpenIdConfiguration,
}

impl DiscoveryDocument {
    /// Well-known path, identical on this server and on the identity provider
    pub fn well_known_path(self) -> &'static str {
        match self {
            DiscoveryDocument::AuthorizationServer => "/.well-known/oauth-authorization-server",
            DiscoveryDocument::OpenIdConfiguration => "/.well-known/openid-configuration",
        }
    }
}

/// Fetches discovery documents from the identity provider
#[derive(Debug, Clone)]
pub struct DiscoveryForwarder {
    /// HTTP client
    http_client: reqwest::Client,

    /// Identity provider base URL
    authorization_server: String,

    /// User-Agent header value
    user_agent: String,

    /// Per-request timeout
    timeout: Duration,
}

impl DiscoveryForwarder {
    /// Create a forwarder for the identity provider in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            authorization_server: config.authorization_server.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Upstream URL of `document`
    pub fn upstream_url(&self, document: DiscoveryDocument) -> String {
        format!("{}{}", self.authorization_server, document.well_known_path())
    }

    /// Fetch `document` from the identity provider, unchanged
    pub async fn forward(&self, document: DiscoveryDocument) -> Result<Value, UpstreamError> {
        let url = self.upstream_url(document);

        let unavailable = |e: reqwest::Error| UpstreamError::Unavailable {
            url: url.clone(),
            message: e.to_string(),
        };

        self.http_client
            .get(&url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)
    }
}
