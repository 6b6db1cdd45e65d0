//! View collaborators of the widget and their HTML rendition.

use std::fmt::Write as _;

use super::audit::AuditHistory;
use super::message::Message;

/// Element id of the text input.
pub const INPUT_ID: &str = "message-input";
/// Element id of the send control.
pub const SEND_BUTTON_ID: &str = "send-btn";
/// Element id of the transcript container.
pub const MESSAGES_ID: &str = "messages";
/// Element id of the audit container.
pub const AUDIT_LOG_ID: &str = "audit-log";

/// Shown in the audit view while the history is empty.
pub const NO_REQUESTS_PLACEHOLDER: &str = "No requests yet";

/// The input field, send control, transcript and audit container the widget drives.
pub trait ChatView: Send {
    /// Current (untrimmed) value of the input field.
    fn input_value(&self) -> String;

    fn clear_input(&mut self);

    /// Enable or disable both the input field and the send control.
    fn set_controls(&mut self, enabled: bool, send_label: &str);

    fn focus_input(&mut self);

    /// Append one message to the transcript and scroll to it.
    fn append_message(&mut self, message: &Message);

    /// Replace the whole audit view with `history`.
    fn render_audit(&mut self, history: &AuditHistory);
}

/// Escape markup-significant characters so `text` renders literally.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markup for a single transcript message.
#[must_use]
pub fn render_message(message: &Message) -> String {
    format!(
        r#"<div class="message message-{kind}">
    <div class="message-label">{label}</div>
    <div class="message-content">{content}</div>
    <div class="message-time">{time}</div>
</div>"#,
        kind = escape_html(message.kind.as_str()),
        label = message.kind.label(),
        content = escape_html(&message.content),
        time = message.timestamp,
    )
}

/// Markup for the full audit view.
///
/// Query and status text are escaped here as well as in the transcript.
#[must_use]
pub fn render_audit_log(history: &AuditHistory) -> String {
    if history.is_empty() {
        return format!("<p>{NO_REQUESTS_PLACEHOLDER}</p>");
    }

    let mut out = String::new();
    for item in history.iter() {
        let _ = write!(
            out,
            r#"<div class="audit-item {status}">
    <div class="audit-timestamp">{timestamp}</div>
    <div class="audit-query">Query: "{query}"</div>
    <div class="audit-status">Status: {message}</div>
</div>"#,
            status = item.status.as_str(),
            timestamp = item.timestamp,
            query = escape_html(&item.query),
            message = escape_html(&item.message),
        );
    }
    out
}

/// In-memory markup view: the state of the four DOM elements.
#[derive(Debug, Clone)]
pub struct HtmlView {
    input: String,
    input_enabled: bool,
    input_focused: bool,
    send_enabled: bool,
    send_label: String,
    transcript: Vec<String>,
    scrolled_to: Option<usize>,
    audit: String,
}

impl Default for HtmlView {
    fn default() -> Self {
        Self {
            input: String::new(),
            input_enabled: true,
            input_focused: false,
            send_enabled: true,
            send_label: super::SEND_LABEL.to_string(),
            transcript: Vec::new(),
            scrolled_to: None,
            audit: format!("<p>{NO_REQUESTS_PLACEHOLDER}</p>"),
        }
    }
}

impl HtmlView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user typing into the input field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn is_send_enabled(&self) -> bool {
        self.send_enabled
    }

    pub fn send_label(&self) -> &str {
        &self.send_label
    }

    /// Rendered message blocks, oldest first.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Whether the transcript is scrolled to its newest entry.
    pub fn is_scrolled_to_latest(&self) -> bool {
        self.scrolled_to.is_some_and(|idx| idx + 1 == self.transcript.len())
    }

    /// Inner markup of the audit container.
    pub fn audit_html(&self) -> &str {
        &self.audit
    }

    /// Markup of the transcript and audit containers.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            r#"<div id="{MESSAGES_ID}">{}</div>
<div id="{AUDIT_LOG_ID}">{}</div>"#,
            self.transcript.join("\n"),
            self.audit,
        )
    }

    /// Drop transcript and audit markup.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.scrolled_to = None;
        self.audit = format!("<p>{NO_REQUESTS_PLACEHOLDER}</p>");
    }
}

impl ChatView for HtmlView {
    fn input_value(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_controls(&mut self, enabled: bool, send_label: &str) {
        self.input_enabled = enabled;
        self.send_enabled = enabled;
        self.send_label = send_label.to_string();
        if !enabled {
            self.input_focused = false;
        }
    }

    fn focus_input(&mut self) {
        self.input_focused = self.input_enabled;
    }

    fn append_message(&mut self, message: &Message) {
        self.transcript.push(render_message(message));
        self.scrolled_to = Some(self.transcript.len() - 1);
    }

    fn render_audit(&mut self, history: &AuditHistory) {
        self.audit = render_audit_log(history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::audit::{AuditItem, AuditStatus};
    use crate::widget::message::MessageKind;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<b onclick="x">Tom & 'Jerry'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn message_markup_escapes_content() {
        let msg = Message::new(MessageKind::User, "<script>alert(1)</script>");
        let html = render_message(&msg);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"<div class="message-label">User</div>"#));
        assert!(html.contains("message message-user"));
    }

    #[test]
    fn unknown_kind_has_empty_label() {
        let msg = Message::new(MessageKind::from("system"), "hello");
        let html = render_message(&msg);
        assert!(html.contains(r#"<div class="message-label"></div>"#));
        assert!(html.contains("message-system"));
    }

    #[test]
    fn empty_audit_shows_placeholder() {
        assert_eq!(render_audit_log(&AuditHistory::new()), "<p>No requests yet</p>");
    }

    #[test]
    fn audit_markup_lists_newest_first_and_escapes() {
        let mut history = AuditHistory::new();
        history.record(AuditItem::new("first", AuditStatus::Success, "Response generated"));
        history.record(AuditItem::new("<i>second</i>", AuditStatus::Blocked, "<b>no</b>"));

        let html = render_audit_log(&history);
        let second = html.find("&lt;i&gt;second&lt;/i&gt;").unwrap();
        let first = html.find(r#"Query: "first""#).unwrap();
        assert!(second < first);
        assert!(html.contains(r#"class="audit-item blocked""#));
        assert!(html.contains("Status: &lt;b&gt;no&lt;/b&gt;"));
        assert!(html.contains("Status: Response generated"));
    }

    #[test]
    fn html_view_tracks_controls_and_scroll() {
        let mut view = HtmlView::new();
        view.set_controls(false, "Sending...");
        assert!(!view.is_input_enabled());
        assert!(!view.is_send_enabled());
        view.focus_input();
        assert!(!view.is_input_focused());

        view.append_message(&Message::new(MessageKind::User, "a"));
        view.append_message(&Message::new(MessageKind::Assistant, "b"));
        assert!(view.is_scrolled_to_latest());

        view.set_controls(true, "Send");
        view.focus_input();
        assert!(view.is_input_focused());
        assert!(view.render().contains(r#"<div id="messages">"#));
    }
}
