//! MCP Tool definitions and handlers
//!
//! Defines the weather tools and their implementations.

use axum::http::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::userinfo::UserinfoClient;
use crate::auth::verifier::TokenClaims;
use crate::config::Config;
use crate::error::{AuthError, McpError, Result, UpstreamError, WeatherMcpError};
use crate::mcp::types::{CallToolResult, Tool};
use crate::weather::client::{has_data, WeatherClient};
use crate::weather::format::{format_alert, format_period};
use crate::weather::types::{AlertFeature, ForecastPeriod, ForecastResponse, PointResponse};

/// Number of forecast periods rendered
const FORECAST_PERIODS: usize = 5;

/// Header values never written to logs
const REDACTED_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie"];

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
pub const POINT_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";

/// Per-request data handed to tool handlers by the transport
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Inbound transport headers
    pub headers: HeaderMap,

    /// Claims of the verified bearer token, if the transport verified one
    pub claims: Option<TokenClaims>,
}

impl ToolContext {
    /// Subject of the verified token
    pub fn subject(&self) -> Option<&str> {
        self.claims.as_ref().and_then(|c| c.sub.as_deref())
    }
}

/// Arguments of `get_alerts`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAlertsArgs {
    /// Two-letter US state code (e.g. CA, NY)
    pub state: String,
}

/// Arguments of `get_forecast`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetForecastArgs {
    /// Latitude of the location
    pub latitude: f64,

    /// Longitude of the location
    pub longitude: f64,
}

/// Tool handler
pub struct ToolHandler {
    weather: WeatherClient,
    userinfo: UserinfoClient,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(config: &Config) -> Self {
        Self {
            weather: WeatherClient::new(config),
            userinfo: UserinfoClient::new(config),
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(
                "get_alerts",
                "Get weather alerts for a US state.",
                input_schema::<GetAlertsArgs>(),
            ),
            tool_def(
                "get_forecast",
                "Get weather forecast for a location.",
                input_schema::<GetForecastArgs>(),
            ),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value, ctx: &ToolContext) -> CallToolResult {
        let result = match name {
            "get_alerts" => match parse_args::<GetAlertsArgs>(args) {
                Ok(args) => self.get_alerts(&args.state, &ctx.headers).await,
                Err(e) => Err(e),
            },
            "get_forecast" => match parse_args::<GetForecastArgs>(args) {
                Ok(args) => self.get_forecast(args.latitude, args.longitude).await,
                Err(e) => Err(e),
            },
            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        };

        match result {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                tracing::warn!(tool = %name, sub = ?ctx.subject(), error = %e, "Tool call failed");
                CallToolResult::error(e.to_string())
            }
        }
    }

    // ==================== Tool Handlers ====================

    /// Active alerts for `state`, greeting the caller between alerts
    pub async fn get_alerts(&self, state: &str, headers: &HeaderMap) -> Result<String> {
        log_headers(headers);

        let authorization = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredential)?;

        let userinfo = self
            .userinfo
            .resolve(authorization)
            .await
            .ok_or(AuthError::UserinfoUnavailable)?;
        let name = userinfo.display_name()?;
        tracing::debug!(name = %name, claims = ?userinfo.claim_keys(), "Resolved userinfo");

        let url = self.weather.alerts_url(state);
        let data = match self.weather.fetch(&url).await {
            Some(data) if has_data(&data) => data,
            _ => return Ok(ALERTS_UNAVAILABLE.to_string()),
        };

        let features: Vec<AlertFeature> = match data.get("features") {
            None => return Ok(ALERTS_UNAVAILABLE.to_string()),
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(features)) => features.iter().map(alert_feature).collect(),
            Some(_) => {
                return Err(UpstreamError::MalformedResponse {
                    field: "features".to_string(),
                }
                .into())
            }
        };

        if features.is_empty() {
            return Ok(NO_ACTIVE_ALERTS.to_string());
        }

        let alerts: Vec<String> = features.iter().map(format_alert).collect();
        // The greeting sits between alerts only, never before the first
        Ok(alerts.join(&format!("\n---\nHi {}", name)))
    }

    /// Forecast for the next periods at a coordinate pair
    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> Result<String> {
        let points_url = self.weather.points_url(latitude, longitude);
        let points = match self.weather.fetch(&points_url).await {
            Some(points) if has_data(&points) => points,
            _ => return Ok(POINT_UNAVAILABLE.to_string()),
        };

        let point: PointResponse =
            serde_json::from_value(points).map_err(|_| UpstreamError::MalformedResponse {
                field: "properties.forecast".to_string(),
            })?;

        let forecast = match self.weather.fetch(&point.properties.forecast).await {
            Some(forecast) if has_data(&forecast) => forecast,
            _ => return Ok(FORECAST_UNAVAILABLE.to_string()),
        };

        let forecast: ForecastResponse =
            serde_json::from_value(forecast).map_err(|_| UpstreamError::MalformedResponse {
                field: "properties.periods".to_string(),
            })?;

        let periods = forecast
            .properties
            .periods
            .into_iter()
            .take(FORECAST_PERIODS)
            .map(|period| {
                serde_json::from_value::<ForecastPeriod>(period)
                    .map(|period| format_period(&period))
                    .map_err(|_| UpstreamError::MalformedResponse {
                        field: "properties.periods".to_string(),
                    })
            })
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(periods.join("\n---\n"))
    }
}

/// Decode one alert; an unreadable feature renders with every default
fn alert_feature(feature: &Value) -> AlertFeature {
    serde_json::from_value(feature.clone()).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Unreadable alert feature");
        AlertFeature::default()
    })
}

/// Header names and loggable values, credentials replaced by `[redacted]`
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]"
            } else {
                value.to_str().unwrap_or("[non-ascii]")
            };
            (name.to_string(), shown.to_string())
        })
        .collect()
}

/// Log inbound headers at debug level with credentials redacted
fn log_headers(headers: &HeaderMap) {
    for (name, value) in redacted_headers(headers) {
        tracing::debug!(header = %name, value = %value, "Inbound header");
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| {
        WeatherMcpError::Mcp(McpError::InvalidArguments {
            message: e.to_string(),
        })
    })
}

fn input_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

fn tool_def(name: &str, description: &str, schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    }
}
