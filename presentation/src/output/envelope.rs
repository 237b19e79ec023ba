//! Response envelope for machine-readable output.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// `{success, speech, query, timestamp}` on success,
/// `{success: false, error, timestamp}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl ResponseEnvelope {
    pub fn success(
        query: impl Into<String>,
        speech: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: true,
            speech: Some(speech.into()),
            query: Some(query.into()),
            error: None,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn failure(error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            speech: None,
            query: None,
            error: Some(error.into()),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!(r#"{{"success":{},"timestamp":"{}"}}"#, self.success, self.timestamp)
        })
    }
}
