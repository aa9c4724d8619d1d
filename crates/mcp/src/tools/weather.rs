// Weather tool: current conditions for a location, with optional history

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, parse_arguments, Tool, ToolError};
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use ssemcp_core::weather::{WeatherClient, WeatherError, WeatherHistory};
use ssemcp_core::SuccessEnvelope;
use std::sync::Arc;

/// Looks up current conditions through wttr.in
pub struct WeatherTool {
    client: WeatherClient,
    history: Option<Arc<WeatherHistory>>,
}

impl WeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self {
            client,
            history: None,
        }
    }

    /// Append every successful lookup to the given history store
    pub fn with_history(mut self, history: Arc<WeatherHistory>) -> Self {
        self.history = Some(history);
        self
    }
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

#[async_trait::async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_weather".to_string(),
            description: "Get current weather information for a specific location".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "location": json_schema_string("The city name or location to get weather for")
                }),
                vec!["location"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<SuccessEnvelope, ToolError> {
        let args: WeatherArgs = parse_arguments(arguments)?;

        let report = self
            .client
            .current(&args.location)
            .await
            .map_err(|e| match e {
                WeatherError::InvalidLocation(message) => ToolError::InvalidArguments(message),
                WeatherError::Request(e) => ToolError::upstream("weather data", e),
                other => ToolError::Internal(other.into()),
            })?;

        let observed_at = Utc::now();

        // History is best-effort; the lookup itself already succeeded
        if let Some(history) = &self.history {
            if let Err(e) = history.record(&report, observed_at).await {
                tracing::warn!("Failed to save weather data for {}: {:#}", report.location, e);
            }
        }

        let data = serde_json::to_value(&report).context("Failed to encode weather report")?;
        let mut envelope = SuccessEnvelope::success(data);
        envelope.timestamp = observed_at;
        Ok(envelope)
    }
}
