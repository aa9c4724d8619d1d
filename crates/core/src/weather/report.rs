use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for any condition the upstream response leaves out
pub const NOT_AVAILABLE: &str = "N/A";

/// Current conditions for one location, flattened from wttr.in's `j1` format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature_c: String,
    pub temperature_f: String,
    pub condition: String,
    pub humidity: String,
    pub wind_speed_kmh: String,
    pub wind_direction: String,
    pub feels_like_c: String,
    pub feels_like_f: String,
}

impl WeatherReport {
    /// Extract the first `current_condition` entry of a `?format=j1` body.
    /// Missing values become `"N/A"` rather than an error.
    pub fn from_wttr(location: &str, body: &Value) -> Self {
        let current = body
            .get("current_condition")
            .and_then(|c| c.get(0))
            .unwrap_or(&Value::Null);

        let condition = current
            .get("weatherDesc")
            .and_then(|d| d.get(0))
            .map(|d| scalar(d, "value"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            location: location.to_string(),
            temperature_c: scalar(current, "temp_C"),
            temperature_f: scalar(current, "temp_F"),
            condition,
            humidity: scalar(current, "humidity"),
            wind_speed_kmh: scalar(current, "windspeedKmph"),
            wind_direction: scalar(current, "winddir16Point"),
            feels_like_c: scalar(current, "FeelsLikeC"),
            feels_like_f: scalar(current, "FeelsLikeF"),
        }
    }
}

// wttr.in sends numbers as strings, but accept bare numbers too
fn scalar(object: &Value, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
