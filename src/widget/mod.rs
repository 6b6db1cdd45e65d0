//! Chat widget controller.
//!
//! [`ChatWidget`] reads a query from its [`ChatView`], posts it through an
//! [`AnswerTransport`], appends the outcome to the transcript and keeps a
//! bounded [`AuditHistory`] of every attempt.
//!
//! # Modules
//!
//! - [`audit`]: audit entries and the bounded history
//! - [`message`]: transcript messages
//! - [`terminal`]: line-oriented view for the `chat` subcommand
//! - [`transport`]: the answer endpoint seam and its HTTP implementation
//! - [`view`]: the view trait and its markup rendition

pub mod audit;
pub mod message;
pub mod terminal;
pub mod transport;
pub mod view;

pub use audit::{AUDIT_CAPACITY, AuditHistory, AuditItem, AuditStatus, QUERY_PREVIEW_CHARS};
pub use message::{Message, MessageKind};
pub use terminal::TerminalView;
pub use transport::{AnswerTransport, HttpTransport, SendError};
pub use view::{ChatView, HtmlView, escape_html};

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Send control label while idle.
pub const SEND_LABEL: &str = "Send";
/// Send control label while a request is in flight.
pub const SENDING_LABEL: &str = "Sending...";
/// Audit message recorded for answered queries.
pub const RESPONSE_GENERATED: &str = "Response generated";
/// Audit message recorded for transport failures.
pub const NETWORK_ERROR: &str = "Network error";

/// Result of one [`ChatWidget::send_message`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The input was empty after trimming; nothing happened.
    Ignored,
    /// Another send was still in flight; nothing happened.
    Busy,
    /// The endpoint answered.
    Answered,
    /// The endpoint rejected the query or could not be reached.
    Blocked,
    /// The widget was reset while the request was pending; the reply was dropped.
    Discarded,
}

/// Stateful chat controller.
///
/// Every method takes `&self`. No lock is held across the network call, and
/// at most one send is in flight per widget.
///
/// Locks are taken in the order transcript, audit, view.
pub struct ChatWidget<T, V> {
    transport: T,
    view: Mutex<V>,
    transcript: Mutex<Vec<Message>>,
    audit: Mutex<AuditHistory>,
    /// Ticket of the send holding the widget, `0` when idle.
    in_flight: AtomicU64,
    next_ticket: AtomicU64,
    /// Bumped by [`ChatWidget::reset`]; replies from an older epoch are dropped.
    epoch: AtomicU64,
}

impl<T, V> std::fmt::Debug for ChatWidget<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("transcript_len", &self.transcript.lock().len())
            .field("audit_len", &self.audit.lock().len())
            .field("in_flight", &(self.in_flight.load(Ordering::Acquire) != 0))
            .field("epoch", &self.epoch.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: AnswerTransport, V: ChatView> ChatWidget<T, V> {
    /// Build a widget over its collaborators and render the empty audit view.
    pub fn new(transport: T, view: V) -> Self {
        let widget = Self {
            transport,
            view: Mutex::new(view),
            transcript: Mutex::new(Vec::new()),
            audit: Mutex::new(AuditHistory::new()),
            in_flight: AtomicU64::new(0),
            next_ticket: AtomicU64::new(1),
            epoch: AtomicU64::new(0),
        };
        widget.render_audit_log();
        widget
    }

    /// Send the current input value to the answer endpoint.
    ///
    /// Controls are restored and the input refocused on every path that
    /// reaches the network step, including when this future is dropped.
    pub async fn send_message(&self) -> SendOutcome {
        let query = self.view.lock().input_value().trim().to_string();
        if query.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(guard) = InFlight::acquire(self) else {
            debug!(name: "widget.send.busy", "Send ignored, request already in flight");
            return SendOutcome::Busy;
        };

        self.view.lock().set_controls(false, SENDING_LABEL);
        self.add_message(MessageKind::User, &query);
        self.view.lock().clear_input();

        debug!(name: "widget.send.started", query_len = query.len(), "Posting query");

        let reply = self.transport.post_answer(&query).await;
        let (kind, content, status, audit_message, outcome) = match reply {
            Ok(answer) => {
                info!(
                    name: "widget.send.completed",
                    answer_len = answer.len(),
                    "Answer received"
                );
                (
                    MessageKind::Assistant,
                    answer,
                    AuditStatus::Success,
                    RESPONSE_GENERATED.to_string(),
                    SendOutcome::Answered,
                )
            }
            Err(SendError::ServerRejected { status, body }) => {
                warn!(name: "widget.send.rejected", status, reason = %body, "Query rejected");
                (
                    MessageKind::Blocked,
                    body.clone(),
                    AuditStatus::Blocked,
                    body,
                    SendOutcome::Blocked,
                )
            }
            Err(SendError::TransportFailure(description)) => {
                warn!(name: "widget.send.failed", error = %description, "Request failed");
                (
                    MessageKind::Blocked,
                    format!("Error: {description}"),
                    AuditStatus::Blocked,
                    NETWORK_ERROR.to_string(),
                    SendOutcome::Blocked,
                )
            }
        };

        let item = AuditItem::new(&query, status, audit_message);
        if self.commit_reply(guard.epoch, Message::new(kind, content), item) {
            outcome
        } else {
            debug!(name: "widget.send.discarded", "Reply arrived after reset, dropped");
            SendOutcome::Discarded
        }
    }

    /// Append a message to the transcript and the view.
    pub fn add_message(&self, kind: impl Into<MessageKind>, content: impl Into<String>) {
        let message = Message::new(kind.into(), content);
        let mut transcript = self.transcript.lock();
        self.view.lock().append_message(&message);
        transcript.push(message);
    }

    /// Record an audit entry at the front of the history and re-render it.
    pub fn add_audit_item(&self, query: &str, status: AuditStatus, message: impl Into<String>) {
        self.audit
            .lock()
            .record(AuditItem::new(query, status, message));
        self.render_audit_log();
    }

    /// Re-render the entire audit view from the history.
    pub fn render_audit_log(&self) {
        let audit = self.audit.lock();
        self.view.lock().render_audit(&audit);
    }

    /// Forget transcript, audit history and any in-flight marker.
    ///
    /// A send still awaiting the endpoint keeps running, but its reply is
    /// dropped and its completion no longer touches the widget.
    pub fn reset(&self) {
        {
            let mut transcript = self.transcript.lock();
            let mut audit = self.audit.lock();
            self.epoch.fetch_add(1, Ordering::AcqRel);
            self.in_flight.store(0, Ordering::Release);
            transcript.clear();
            audit.clear();
            let mut view = self.view.lock();
            view.set_controls(true, SEND_LABEL);
            view.render_audit(&audit);
        }
        info!(name: "widget.reset", "Widget state cleared");
    }

    /// Whether a send is currently awaiting the endpoint.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != 0
    }

    /// Snapshot of the transcript, oldest first.
    pub fn transcript(&self) -> Vec<Message> {
        self.transcript.lock().clone()
    }

    /// Snapshot of the audit history, newest first.
    pub fn audit_history(&self) -> AuditHistory {
        self.audit.lock().clone()
    }

    /// Run `f` against the view.
    ///
    /// The view lock is held while `f` runs and is not re-entrant: `f` must
    /// not call back into this widget or it deadlocks.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        f(&mut self.view.lock())
    }

    /// Append the reply and its audit entry unless a reset happened since
    /// `epoch` was taken.
    fn commit_reply(&self, epoch: u64, message: Message, item: AuditItem) -> bool {
        let mut transcript = self.transcript.lock();
        let mut audit = self.audit.lock();
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        audit.record(item);
        let mut view = self.view.lock();
        view.append_message(&message);
        view.render_audit(&audit);
        transcript.push(message);
        true
    }

    /// Release `ticket` and restore the controls, if it still holds the widget.
    fn finish_send(&self, ticket: u64) {
        if self
            .in_flight
            .compare_exchange(ticket, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let mut view = self.view.lock();
        view.set_controls(true, SEND_LABEL);
        view.focus_input();
    }
}

/// Holds the in-flight ticket; restores the view when dropped.
struct InFlight<'a, T: AnswerTransport, V: ChatView> {
    widget: &'a ChatWidget<T, V>,
    ticket: u64,
    epoch: u64,
}

impl<'a, T: AnswerTransport, V: ChatView> InFlight<'a, T, V> {
    fn acquire(widget: &'a ChatWidget<T, V>) -> Option<Self> {
        // Read under the transcript lock so a concurrent reset is either fully
        // before or fully after the acquisition.
        let _transcript = widget.transcript.lock();
        let ticket = widget.next_ticket.fetch_add(1, Ordering::Relaxed);
        widget
            .in_flight
            .compare_exchange(0, ticket, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                widget,
                ticket,
                epoch: widget.epoch.load(Ordering::Acquire),
            })
    }
}

impl<T: AnswerTransport, V: ChatView> Drop for InFlight<'_, T, V> {
    fn drop(&mut self) {
        self.widget.finish_send(self.ticket);
    }
}
