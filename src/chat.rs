//! Interactive terminal front end for the chat widget.
//!
//! Every input line is a query, except the commands `/audit` (print the audit
//! log), `/reset` (clear transcript and audit log) and `/quit`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::config::ClientConfig;
use crate::widget::{
    AnswerTransport, ChatView, ChatWidget, HttpTransport, SendOutcome, TerminalView,
};

/// Read queries from stdin until EOF or `/quit`.
pub async fn run(config: &ClientConfig) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config.base_url, config.api_key.clone())?;
    info!(name: "chat.started", endpoint = %transport.endpoint(), "Chat client started");

    let widget = ChatWidget::new(transport, TerminalView::new(std::io::stdout()));
    drive(&widget, BufReader::new(tokio::io::stdin())).await
}

/// Feed lines from `input` to `widget`.
pub async fn drive<T, W, R>(
    widget: &ChatWidget<T, TerminalView<W>>,
    input: R,
) -> anyhow::Result<()>
where
    T: AnswerTransport,
    W: Write + Send,
    R: AsyncBufRead + Unpin,
{
    widget.with_view(ChatView::focus_input);

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/audit" => widget.with_view(TerminalView::print_audit),
            "/reset" => widget.reset(),
            _ => {
                widget.with_view(|v| v.set_input(line.as_str()));
                // Answered and blocked sends refocus on their own.
                if matches!(
                    widget.send_message().await,
                    SendOutcome::Answered | SendOutcome::Blocked
                ) {
                    continue;
                }
            }
        }
        widget.with_view(ChatView::focus_input);
    }
    Ok(())
}
