// src/state.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::completion::CompletionClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    /// `None` when the server was started without a completion credential.
    pub completion: Option<CompletionClient>,
    started_at: Instant,
}

impl AppState {
    pub fn new(completion: Option<CompletionClient>) -> Self {
        Self {
            completion,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
