//! Weather API client
//!
//! Fetches GeoJSON documents from the weather API. Every failure collapses to `None`.

use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;

use crate::config::Config;

/// Accept header for weather API requests
const GEO_JSON: &str = "application/geo+json";

/// Weather API client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API base URL (no trailing slash)
    base_url: String,

    /// User-Agent header value
    user_agent: String,

    /// Per-request timeout
    timeout: Duration,
}

impl WeatherClient {
    /// Create a new weather client
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: config.weather_api_base.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        }
    }

    /// URL of the active alerts for a state
    pub fn alerts_url(&self, state: &str) -> String {
        format!(
            "{}/alerts/active/area/{}",
            self.base_url,
            urlencoding::encode(state)
        )
    }

    /// URL of the grid point metadata for a coordinate pair
    pub fn points_url(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/points/{},{}", self.base_url, latitude, longitude)
    }

    /// GET a URL and return its parsed JSON body, or `None` on any failure
    pub async fn fetch(&self, url: &str) -> Option<Value> {
        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Weather API request failed");
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> reqwest::Result<Value> {
        self.http_client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, GEO_JSON)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Whether a fetched body carries any data.
///
/// `null`, `false`, empty objects, empty arrays and empty strings count as no data.
pub fn has_data(body: &Value) -> bool {
    match body {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}
