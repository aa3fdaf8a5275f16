//! Client for an OpenAI-compatible chat-completion API (Groq by default).
//!
//! Every call sends the same system prompt and sampling parameters plus the
//! user's message, and reads back the first choice's text. [`CompletionClient::reply`]
//! never fails: upstream problems come back as one of the fallback sentences
//! in [`UpstreamError::fallback_message`].

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Be friendly, concise, and helpful in your responses.";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1000;
pub const TOP_P: f32 = 1.0;

pub const QUOTA_EXCEEDED_REPLY: &str = "Sorry, I've reached my API limit. Please try again later.";
pub const INVALID_KEY_REPLY: &str =
    "Sorry, there's an issue with my configuration. Please contact support.";
pub const RATE_LIMITED_REPLY: &str =
    "I'm receiving too many requests. Please wait a moment and try again.";
pub const GENERIC_FAILURE_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// Characters of the reply echoed into the logs.
const LOG_PREVIEW_CHARS: usize = 100;

/// Explicit settings for [`CompletionClient::new`].
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
}

/// Why an upstream call produced no usable text.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("completion quota exhausted")]
    InsufficientQuota,

    #[error("completion API rejected the credential")]
    InvalidApiKey,

    #[error("completion API rate limit hit")]
    RateLimited,

    #[error("completion API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion API returned no text")]
    EmptyCompletion,

    #[error("failed to decode completion response: {0}")]
    Decode(String),

    #[error("request to completion API failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Classify a non-2xx response from its status and raw body.
    ///
    /// The error `code` wins over the status: Groq reports an exhausted quota
    /// as a 429 too, and that must not read as a plain rate limit.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ApiErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error)
            .unwrap_or_default();

        let mentions_rate_limit = detail
            .message
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().contains("rate limit"));

        match (status, detail.code.as_deref()) {
            (_, Some("insufficient_quota")) => UpstreamError::InsufficientQuota,
            (StatusCode::UNAUTHORIZED, _) | (_, Some("invalid_api_key")) => {
                UpstreamError::InvalidApiKey
            }
            (StatusCode::TOO_MANY_REQUESTS, _) | (_, Some("rate_limit_exceeded")) => {
                UpstreamError::RateLimited
            }
            _ if mentions_rate_limit => UpstreamError::RateLimited,
            _ => UpstreamError::Api {
                status: status.as_u16(),
                message: detail.message.unwrap_or_else(|| body.to_string()),
            },
        }
    }

    /// The sentence shown to the user in place of a real answer.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            UpstreamError::InsufficientQuota => QUOTA_EXCEEDED_REPLY,
            UpstreamError::InvalidApiKey => INVALID_KEY_REPLY,
            UpstreamError::RateLimited => RATE_LIMITED_REPLY,
            UpstreamError::Api { .. }
            | UpstreamError::EmptyCompletion
            | UpstreamError::Decode(_)
            | UpstreamError::Transport(_) => GENERIC_FAILURE_REPLY,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

// No Debug: keeps the credential out of any formatted state dump.
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the completion API for an answer, substituting a fallback sentence
    /// on any failure.
    pub async fn reply(&self, user_message: &str) -> String {
        match self.complete(user_message).await {
            Ok(text) => {
                tracing::info!(preview = %preview(&text), "completion received");
                text
            }
            Err(err) => {
                tracing::warn!(error = %err, "completion failed, answering with fallback");
                err.fallback_message().to_string()
            }
        }
    }

    pub async fn complete(&self, user_message: &str) -> Result<String, UpstreamError> {
        tracing::debug!(model = %self.model, "sending message to completion API");

        let body = CompletionRequest {
            model: &self.model,
            messages: [
                RequestMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                RequestMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_response(status, &error_body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.is_empty())
            .ok_or(UpstreamError::EmptyCompletion)
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
