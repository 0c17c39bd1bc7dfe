//! Weather API type definitions
//!
//! These types mirror the parts of the National Weather Service responses the tools read.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// One feature of an active-alerts collection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlertFeature {
    /// Alert properties
    #[serde(default)]
    pub properties: AlertProperties,
}

/// Properties of an alert; every field is optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    /// Event name (e.g. "Flood Warning")
    #[serde(default, deserialize_with = "lenient_text")]
    pub event: Option<String>,

    /// Affected area description
    #[serde(default, deserialize_with = "lenient_text")]
    pub area_desc: Option<String>,

    /// Severity level
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: Option<String>,

    /// Full description
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Recommended actions
    #[serde(default, deserialize_with = "lenient_text")]
    pub instruction: Option<String>,
}

/// Accept any JSON value as text, rendering non-strings as JSON; `null` is absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Grid point metadata returned by `/points/{lat},{lon}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointResponse {
    pub properties: PointProperties,
}

/// Properties of a grid point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointProperties {
    /// URL of the forecast document for this point
    pub forecast: String,
}

/// Forecast document returned by the point's forecast URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

/// Properties of a forecast document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastProperties {
    /// Forecast periods in chronological order, decoded one at a time
    pub periods: Vec<Value>,
}

/// One forecast period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    /// Period name (e.g. "Tonight")
    pub name: String,

    /// Temperature value
    pub temperature: Number,

    /// Temperature unit ("F" or "C")
    pub temperature_unit: String,

    /// Wind speed (e.g. "5 to 10 mph")
    pub wind_speed: String,

    /// Wind direction (e.g. "NW")
    pub wind_direction: String,

    /// Long-form forecast text
    pub detailed_forecast: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_feature_missing_properties() {
        let feature: AlertFeature = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert!(feature.properties.event.is_none());
        assert!(feature.properties.area_desc.is_none());
    }

    #[test]
    fn test_alert_null_fields_are_absent() {
        let feature: AlertFeature = serde_json::from_value(json!({
            "properties": {"event": "Flood Warning", "instruction": null, "areaDesc": "Wake, NC"}
        }))
        .unwrap();
        assert_eq!(feature.properties.event.as_deref(), Some("Flood Warning"));
        assert_eq!(feature.properties.area_desc.as_deref(), Some("Wake, NC"));
        assert!(feature.properties.instruction.is_none());
    }

    #[test]
    fn test_alert_non_string_fields_render_as_json() {
        let feature: AlertFeature = serde_json::from_value(json!({
            "properties": {"event": "Heat Advisory", "severity": 3, "areaDesc": ["Wake", "Durham"]}
        }))
        .unwrap();
        assert_eq!(feature.properties.severity.as_deref(), Some("3"));
        assert_eq!(
            feature.properties.area_desc.as_deref(),
            Some("[\"Wake\",\"Durham\"]")
        );
    }

    #[test]
    fn test_forecast_periods_kept_raw() {
        let forecast: ForecastResponse = serde_json::from_value(json!({
            "properties": {"periods": [{"name": "Tonight"}, {"temperature": null}]}
        }))
        .unwrap();
        assert_eq!(forecast.properties.periods.len(), 2);
    }

    #[test]
    fn test_forecast_period_deserialize() {
        let period: ForecastPeriod = serde_json::from_value(json!({
            "number": 1,
            "name": "Tonight",
            "temperature": 54,
            "temperatureUnit": "F",
            "windSpeed": "5 mph",
            "windDirection": "SW",
            "detailedForecast": "Mostly clear."
        }))
        .unwrap();
        assert_eq!(period.name, "Tonight");
        assert_eq!(period.temperature.to_string(), "54");
        assert_eq!(period.wind_direction, "SW");
    }

    #[test]
    fn test_point_missing_forecast_fails() {
        let result: std::result::Result<PointResponse, _> =
            serde_json::from_value(json!({"properties": {"gridId": "RAH"}}));
        assert!(result.is_err());
    }
}
