//! Line-oriented [`ChatView`] for terminals.

use std::io::Write;

use super::audit::AuditHistory;
use super::message::Message;
use super::view::{ChatView, NO_REQUESTS_PLACEHOLDER};

/// Prints transcript messages as they arrive and keeps the last rendered
/// audit view for on-demand display.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
    input: String,
    enabled: bool,
    audit: Vec<String>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input: String::new(),
            enabled: true,
            audit: vec![NO_REQUESTS_PLACEHOLDER.to_string()],
        }
    }

    /// Replace the pending input line.
    pub fn set_input(&mut self, line: impl Into<String>) {
        self.input = line.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lines of the last rendered audit view.
    pub fn audit_lines(&self) -> &[String] {
        &self.audit
    }

    /// Write the last rendered audit view.
    pub fn print_audit(&mut self) {
        let mut block = String::from("── audit log ──\n");
        for line in &self.audit {
            block.push_str(line);
            block.push('\n');
        }
        self.emit(&block);
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(name: "terminal.write.failed", error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn input_value(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_controls(&mut self, enabled: bool, send_label: &str) {
        self.enabled = enabled;
        if !enabled {
            self.emit(&format!("{send_label}\n"));
        }
    }

    fn focus_input(&mut self) {
        if self.enabled {
            self.emit("> ");
        }
    }

    fn append_message(&mut self, message: &Message) {
        let label = message.kind.label();
        let line = if label.is_empty() {
            format!("[{}] {}\n", message.timestamp, message.content)
        } else {
            format!("[{}] {label}: {}\n", message.timestamp, message.content)
        };
        self.emit(&line);
    }

    fn render_audit(&mut self, history: &AuditHistory) {
        if history.is_empty() {
            self.audit = vec![NO_REQUESTS_PLACEHOLDER.to_string()];
            return;
        }
        self.audit = history
            .iter()
            .map(|item| {
                format!(
                    "{} [{}] Query: \"{}\" Status: {}",
                    item.timestamp,
                    item.status.as_str(),
                    item.query,
                    item.message
                )
            })
            .collect();
    }
}
