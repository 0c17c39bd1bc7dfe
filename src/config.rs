//! Configuration management for the Weather MCP Server
//!
//! Built-in defaults, overridden by environment variables, overridden by CLI flags.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Path the MCP endpoint is served on
pub const MCP_PATH: &str = "/mcp";

/// Configuration for the Weather MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Public base URL of this resource server
    pub base_url: String,

    /// Identity provider base URL (no trailing slash)
    pub authorization_server: String,

    /// Expected token issuer
    pub issuer: String,

    /// JWKS endpoint of the identity provider
    pub jwks_uri: String,

    /// Expected token audience
    pub audience: String,

    /// Weather API base URL
    pub weather_api_base: String,

    /// User-Agent sent on every outbound request
    pub user_agent: String,

    /// Timeout for every outbound request
    pub request_timeout: Duration,
}

impl Config {
    /// Create a configuration from the built-in defaults only
    pub fn defaults() -> Self {
        let authorization_server = defaults::AUTHORIZATION_SERVER.to_string();

        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            base_url: defaults::BASE_URL.to_string(),
            issuer: format!("{}/", authorization_server),
            jwks_uri: format!("{}/.well-known/jwks.json", authorization_server),
            authorization_server,
            audience: defaults::AUDIENCE.to_string(),
            weather_api_base: defaults::WEATHER_API_BASE.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }

    /// Create a configuration from the defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create a configuration reading overrides from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults();

        if let Some(server) = lookup(env::AUTH_SERVER) {
            let server = server.trim_end_matches('/').to_string();
            // Issuer and JWKS follow the authorization server unless set explicitly
            config.issuer = format!("{}/", server);
            config.jwks_uri = format!("{}/.well-known/jwks.json", server);
            config.authorization_server = server;
        }
        if let Some(host) = lookup(env::HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(env::PORT) {
            config.port = parse_var(env::PORT, &port)?;
        }
        if let Some(base_url) = lookup(env::BASE_URL) {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(issuer) = lookup(env::ISSUER) {
            config.issuer = issuer;
        }
        if let Some(jwks_uri) = lookup(env::JWKS_URI) {
            config.jwks_uri = jwks_uri;
        }
        if let Some(audience) = lookup(env::AUDIENCE) {
            config.audience = audience;
        }
        if let Some(api_base) = lookup(env::API_BASE) {
            config.weather_api_base = api_base.trim_end_matches('/').to_string();
        }
        if let Some(user_agent) = lookup(env::USER_AGENT) {
            config.user_agent = user_agent;
        }
        if let Some(timeout) = lookup(env::TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_var(env::TIMEOUT_SECS, &timeout)?);
        }

        Ok(config)
    }

    /// Userinfo endpoint of the identity provider
    pub fn userinfo_url(&self) -> String {
        format!("{}/userinfo", self.authorization_server)
    }

    /// Resource identifier advertised in protected-resource metadata
    pub fn resource_url(&self) -> String {
        format!("{}{}", self.base_url, MCP_PATH)
    }

    /// Address string to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        ConfigError::InvalidValue {
            var: var.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Built-in configuration values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8000;
    pub const BASE_URL: &str = "https://www.deerkoski.net";
    pub const AUTHORIZATION_SERVER: &str = "https://dev-v5dtht4xch6aermg.us.auth0.com";
    pub const AUDIENCE: &str = "https://www.deerkoski.net/mcp";
    pub const WEATHER_API_BASE: &str = "https://api.weather.gov";
    pub const USER_AGENT: &str = "weather-app/1.0";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Environment variable names
pub mod env {
    pub const HOST: &str = "WEATHER_MCP_HOST";
    pub const PORT: &str = "WEATHER_MCP_PORT";
    pub const BASE_URL: &str = "WEATHER_MCP_BASE_URL";
    pub const AUTH_SERVER: &str = "WEATHER_MCP_AUTH_SERVER";
    pub const ISSUER: &str = "WEATHER_MCP_ISSUER";
    pub const JWKS_URI: &str = "WEATHER_MCP_JWKS_URI";
    pub const AUDIENCE: &str = "WEATHER_MCP_AUDIENCE";
    pub const API_BASE: &str = "WEATHER_MCP_API_BASE";
    pub const USER_AGENT: &str = "WEATHER_MCP_USER_AGENT";
    pub const TIMEOUT_SECS: &str = "WEATHER_MCP_TIMEOUT_SECS";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherMcpError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::defaults();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.issuer, "https://dev-v5dtht4xch6aermg.us.auth0.com/");
        assert_eq!(
            config.jwks_uri,
            "https://dev-v5dtht4xch6aermg.us.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(
            config.userinfo_url(),
            "https://dev-v5dtht4xch6aermg.us.auth0.com/userinfo"
        );
        assert_eq!(config.resource_url(), "https://www.deerkoski.net/mcp");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (env::AUTH_SERVER, "https://idp.example.com/"),
            (env::PORT, "9000"),
            (env::API_BASE, "http://127.0.0.1:1234/"),
            (env::TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.authorization_server, "https://idp.example.com");
        assert_eq!(config.issuer, "https://idp.example.com/");
        assert_eq!(config.jwks_uri, "https://idp.example.com/.well-known/jwks.json");
        assert_eq!(config.port, 9000);
        assert_eq!(config.weather_api_base, "http://127.0.0.1:1234");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_issuer_wins() {
        let config = Config::from_lookup(lookup_from(&[
            (env::AUTH_SERVER, "https://idp.example.com"),
            (env::ISSUER, "https://issuer.example.com/"),
        ]))
        .unwrap();
        assert_eq!(config.issuer, "https://issuer.example.com/");
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[(env::PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, WeatherMcpError::Config(_)));
        assert!(err.to_string().contains(env::PORT));
    }
}
