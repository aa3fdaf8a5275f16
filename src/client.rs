//! HTTP client for the relay's `/api/message` endpoint, used by the `chat` binary.

use thiserror::Error;

use crate::message::{ChatRequest, ChatResponse};

pub const SEND_FAILURE_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay answered HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/message", base_url.trim_end_matches('/')),
        })
    }

    /// Relay `message` and return the bot's text, or [`SEND_FAILURE_REPLY`]
    /// when the relay could not be reached or refused the request.
    pub async fn send(&self, message: &str) -> String {
        match self.try_send(message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "error sending message");
                SEND_FAILURE_REPLY.to_string()
            }
        }
    }

    pub async fn try_send(&self, message: &str) -> Result<String, RelayError> {
        let request = ChatRequest {
            message: Some(message.to_string()),
        };
        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.response)
    }
}
