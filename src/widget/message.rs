//! Transcript messages.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Who (or what) produced a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Text typed by the user.
    User,
    /// Answer returned by the endpoint.
    Assistant,
    /// Rejection or transport failure.
    Blocked,
    /// Any other kind; rendered with an empty label.
    Other(String),
}

impl MessageKind {
    /// Display label shown above the message body.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::Blocked => "Blocked",
            Self::Other(_) => "",
        }
    }

    /// Lowercase name used for CSS classes.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Blocked => "blocked",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        match value {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "blocked" => Self::Blocked,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A single transcript entry. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub content: String,
    /// Short-form local time (`HH:MM:SS`).
    pub timestamp: String,
}

impl Message {
    #[must_use]
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self::at(kind, content, Local::now())
    }

    #[must_use]
    pub fn at(kind: MessageKind, content: impl Into<String>, when: DateTime<Local>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: when.format("%H:%M:%S").to_string(),
        }
    }
}
