// src/message.rs
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatRequest {
    /// The message to relay, if the caller sent a non-empty one.
    pub fn non_empty_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub timestamp: String,
}

impl ChatResponse {
    pub fn new(response: String) -> Self {
        Self {
            success: true,
            response,
            timestamp: now_iso8601(),
        }
    }
}

/// Failure body shared by every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime: f64,
}

/// UTC timestamp with millisecond precision, e.g. `2026-10-16T09:30:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
