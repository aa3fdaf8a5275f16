//! In-memory, append-only list of chat messages rendered by the chat UI.

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

pub const GREETING: &str =
    "Hello! I'm your AI assistant powered by GROQ. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Local::now(),
        }
    }

    /// `[14:03:07] you: hello`
    pub fn render(&self) -> String {
        let who = match self.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        format!("[{}] {}: {}", self.timestamp.format("%H:%M:%S"), who, self.text)
    }
}

/// Messages only ever get appended; existing entries are handed out as
/// shared references, so their text cannot change after insertion.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A transcript opening with the bot greeting.
    pub fn new() -> Self {
        let mut transcript = Self::default();
        transcript.push(Sender::Bot, GREETING);
        transcript
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> &Message {
        self.messages.push(Message::new(sender, text));
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Message {
        self.push(Sender::User, text)
    }

    pub fn push_bot(&mut self, text: impl Into<String>) -> &Message {
        self.push(Sender::Bot, text)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
