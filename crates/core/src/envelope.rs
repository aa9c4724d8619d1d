// Response envelopes: the only shape a tool ever hands back to a client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returned verbatim if an envelope somehow fails to serialize
const FALLBACK_ERROR_TEXT: &str = "{\n  \"error\": \"An error occurred: failed to serialize response\"\n}";

/// Keys owned by [`SuccessEnvelope`] that extra fields may not shadow
const RESERVED_KEYS: [&str; 4] = ["status", "message", "data", "timestamp"];

/// Outcome marker carried by every success envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Ok,
}

/// Success shape: `status`, optional `message`/`data`, `timestamp`, plus
/// any extra top-level fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SuccessEnvelope {
    /// `status: "ok"` with a human-readable message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }

    /// `status: "success"` with an opaque payload
    pub fn success(data: impl Into<Value>) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data.into()),
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Add a top-level field. Names owned by the envelope itself are ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            tracing::debug!("Ignoring reserved envelope field: {}", key);
            return self;
        }
        self.extra.insert(key, value.into());
        self
    }
}

/// Error shape: `error` text and, optionally, when it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: None,
        }
    }

    pub fn stamped(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: Some(Utc::now()),
        }
    }
}

/// Exactly one of these is produced per tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Error(ErrorEnvelope),
}

impl Envelope {
    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }

    /// Serialize as pretty-printed JSON text. Never fails.
    pub fn to_text(&self) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize envelope: {}", e);
                FALLBACK_ERROR_TEXT.to_string()
            }
        }
    }
}

impl From<SuccessEnvelope> for Envelope {
    fn from(envelope: SuccessEnvelope) -> Self {
        Envelope::Success(envelope)
    }
}

impl From<ErrorEnvelope> for Envelope {
    fn from(envelope: ErrorEnvelope) -> Self {
        Envelope::Error(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_ok_envelope_text() {
        let envelope: Envelope = SuccessEnvelope::ok("Server is running")
            .with_field("server", "Generic MCP Server")
            .into();

        let value = parse(&envelope.to_text());
        assert_eq!(value["status"], "ok");
        assert_eq!(value["message"], "Server is running");
        assert_eq!(value["server"], "Generic MCP Server");
        assert!(value.get("error").is_none());
        assert!(value.get("data").is_none());

        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_success_envelope_carries_data() {
        let envelope: Envelope =
            SuccessEnvelope::success(serde_json::json!({ "temperature_c": "12" })).into();

        let value = parse(&envelope.to_text());
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["temperature_c"], "12");
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_error_envelope_has_no_status() {
        let envelope: Envelope = ErrorEnvelope::new("An error occurred: boom").into();
        let value = parse(&envelope.to_text());

        assert_eq!(value["error"], "An error occurred: boom");
        assert!(value.get("status").is_none());
        assert!(value.get("timestamp").is_none());
        assert!(envelope.is_error());

        let stamped: Envelope = ErrorEnvelope::stamped("boom").into();
        let value = parse(&stamped.to_text());
        assert!(value["timestamp"].is_string());
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_reserved_fields_are_not_shadowed() {
        let envelope = SuccessEnvelope::ok("hello")
            .with_field("status", "hijacked")
            .with_field("timestamp", "yesterday");

        assert!(envelope.extra.is_empty());
        let value = parse(&Envelope::from(envelope).to_text());
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_text_is_indented() {
        let text = Envelope::from(ErrorEnvelope::new("x")).to_text();
        assert!(text.contains("\n  \"error\""));
    }

    #[test]
    fn test_parse_back_into_variants() {
        let success = Envelope::from(SuccessEnvelope::ok("fine")).to_text();
        assert!(matches!(
            serde_json::from_str::<Envelope>(&success).unwrap(),
            Envelope::Success(_)
        ));

        let error = Envelope::from(ErrorEnvelope::new("bad")).to_text();
        assert!(matches!(
            serde_json::from_str::<Envelope>(&error).unwrap(),
            Envelope::Error(_)
        ));
    }
}
