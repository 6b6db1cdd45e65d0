//! Bounded, most-recent-first record of send attempts.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Maximum number of entries kept in an [`AuditHistory`].
pub const AUDIT_CAPACITY: usize = 50;

/// Maximum number of characters of the query kept in an [`AuditItem`].
pub const QUERY_PREVIEW_CHARS: usize = 100;

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Blocked,
}

impl AuditStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditItem {
    /// Long-form local time (`YYYY-MM-DD HH:MM:SS`).
    pub timestamp: String,
    /// First [`QUERY_PREVIEW_CHARS`] characters of the query.
    pub query: String,
    pub status: AuditStatus,
    pub message: String,
}

impl AuditItem {
    #[must_use]
    pub fn new(query: &str, status: AuditStatus, message: impl Into<String>) -> Self {
        Self::at(query, status, message, Local::now())
    }

    #[must_use]
    pub fn at(
        query: &str,
        status: AuditStatus,
        message: impl Into<String>,
        when: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp: when.format("%Y-%m-%d %H:%M:%S").to_string(),
            query: truncate_chars(query, QUERY_PREVIEW_CHARS).to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Returns the prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Audit entries, newest first, never longer than [`AUDIT_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct AuditHistory {
    items: VecDeque<AuditItem>,
}

impl AuditHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item` at the front, dropping the oldest entries past capacity.
    pub fn record(&mut self, item: AuditItem) {
        self.items.push_front(item);
        self.items.truncate(AUDIT_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Newest entry first.
    pub fn iter(&self) -> impl Iterator<Item = &AuditItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&AuditItem> {
        self.items.front()
    }
}
