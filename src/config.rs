//! Process configuration sourced from the environment.
//!
//! `main` loads `.env` through `dotenvy` and then calls [`Config::from_env`].
//! Everything else goes through [`Config::from_lookup`], which takes any
//! key -> value function so tests never touch the process environment.

use secrecy::SecretString;
use thiserror::Error;

use crate::services::completion::{CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("APP_ENV must be `development` or `production`, got {0:?}")]
    InvalidEnvironment(String),

    #[error("ALLOWED_ORIGINS must list explicit origins; `*` is not accepted")]
    WildcardOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Completion API credential. `None` keeps the server up but every relay
    /// request answers with a configuration error.
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub port: u16,
    pub environment: Environment,
    /// CORS origins honoured in production.
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset, same as an empty line in `.env`.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        // The production CORS layer takes an explicit list; a wildcard there panics.
        if allowed_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::WildcardOrigin);
        }

        Ok(Self {
            api_key: get("GROQ_API_KEY").map(SecretString::from),
            base_url: get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port,
            environment,
            allowed_origins,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        })
    }

    /// Completion client settings, or `None` when no credential is configured.
    pub fn completion(&self) -> Option<CompletionConfig> {
        self.api_key.clone().map(|api_key| CompletionConfig {
            api_key,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        })
    }
}
