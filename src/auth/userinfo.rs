//! Userinfo resolution
//!
//! Exchanges the caller's bearer token for their identity at the identity
//! provider's userinfo endpoint. Nothing is cached; every call hits the provider.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::UpstreamError;

/// Claims returned by the userinfo endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Userinfo {
    /// Display name as sent; only a string is usable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    /// Subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Remaining claims
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Userinfo {
    /// The caller's display name, required by tools that greet the caller
    pub fn display_name(&self) -> Result<&str, UpstreamError> {
        self.name
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| UpstreamError::MalformedResponse {
                field: "name".to_string(),
            })
    }

    /// Names of all claims present, for diagnostics that must not leak values
    pub fn claim_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.extra.keys().map(String::as_str).collect();
        if self.sub.is_some() {
            keys.push("sub");
        }
        if self.name.is_some() {
            keys.push("name");
        }
        keys.sort_unstable();
        keys
    }
}

/// Userinfo endpoint client
#[derive(Debug, Clone)]
pub struct UserinfoClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// Userinfo endpoint
    userinfo_url: String,

    /// User-Agent header value
    user_agent: String,

    /// Per-request timeout
    timeout: Duration,
}

impl UserinfoClient {
    /// Create a new userinfo client
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            userinfo_url: config.userinfo_url(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Resolve the identity behind `authorization`, forwarded verbatim.
    ///
    /// Returns `None` on any failure after logging it.
    pub async fn resolve(&self, authorization: &str) -> Option<Userinfo> {
        match self.try_resolve(authorization).await {
            Ok(userinfo) => Some(userinfo),
            Err(e) => {
                tracing::error!(url = %self.userinfo_url, error = ?e, "Userinfo request failed");
                None
            }
        }
    }

    async fn try_resolve(&self, authorization: &str) -> reqwest::Result<Userinfo> {
        self.http_client
            .get(&self.userinfo_url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .header(AUTHORIZATION, authorization)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_server, test_config};
    use axum::{http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_userinfo() -> String {
        let router = Router::new().route(
            "/userinfo",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth == "Bearer numeric-name" {
                    return Ok(Json(json!({"sub": "auth0|n", "name": 42})));
                }
                if auth != "Bearer good-token" {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({
                    "sub": "auth0|alex",
                    "name": "Alex",
                    "email": "alex@example.com",
                    "accept": headers.get("accept").and_then(|v| v.to_str().ok()),
                })))
            }),
        );
        spawn_server(router).await
    }

    #[tokio::test]
    async fn test_resolve_forwards_authorization() {
        let upstream = spawn_userinfo().await;
        let client = UserinfoClient::new(&test_config(&upstream));

        let userinfo = client.resolve("Bearer good-token").await.unwrap();
        assert_eq!(userinfo.display_name().unwrap(), "Alex");
        assert_eq!(userinfo.sub.as_deref(), Some("auth0|alex"));
        assert_eq!(userinfo.extra["accept"], "*/*");
        assert_eq!(userinfo.claim_keys(), vec!["accept", "email", "name", "sub"]);
    }

    #[tokio::test]
    async fn test_resolve_rejected_token_is_none() {
        let upstream = spawn_userinfo().await;
        let client = UserinfoClient::new(&test_config(&upstream));

        assert!(client.resolve("Bearer bad-token").await.is_none());
    }

    #[tokio::test]
    async fn test_non_string_name_is_malformed() {
        let upstream = spawn_userinfo().await;
        let client = UserinfoClient::new(&test_config(&upstream));

        let userinfo = client.resolve("Bearer numeric-name").await.unwrap();
        assert_eq!(userinfo.sub.as_deref(), Some("auth0|n"));
        assert_eq!(
            userinfo.display_name().unwrap_err(),
            UpstreamError::MalformedResponse {
                field: "name".to_string()
            }
        );
    }

    #[test]
    fn test_display_name_missing() {
        let userinfo: Userinfo = serde_json::from_value(json!({"sub": "auth0|x"})).unwrap();
        assert_eq!(
            userinfo.display_name().unwrap_err(),
            UpstreamError::MalformedResponse {
                field: "name".to_string()
            }
        );
    }
}
