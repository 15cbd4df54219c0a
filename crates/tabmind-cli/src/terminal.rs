//! Plain terminal rendering of a turn.

use futures_util::StreamExt;
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;
use tabmind_core::core_types::{Message, MessageId, ToolCall, ToolStatus};
use tabmind_core::reveal::reveal;
use tabmind_core::sink::{PresentationSink, TurnState};

/// Prints tool progress as it happens. The final reply is printed by the
/// caller so it can be revealed gradually.
#[derive(Default)]
pub struct TerminalSink {
    seen: HashMap<String, ToolStatus>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn print_call(call: &ToolCall) {
        let marker = match call.status {
            ToolStatus::Pending | ToolStatus::Running => "…",
            ToolStatus::Done => "✓",
            ToolStatus::Error => "✗",
        };
        eprintln!("  {} {} {}", marker, call.name(), call.invocation.arguments());
    }
}

impl PresentationSink for TerminalSink {
    fn on_turn_started(&mut self, _placeholder: &Message) {
        self.seen.clear();
    }

    fn on_tool_calls_updated(&mut self, _message_id: MessageId, tool_calls: &[ToolCall]) {
        for call in tool_calls {
            if self.seen.get(&call.id) != Some(&call.status) {
                self.seen.insert(call.id.clone(), call.status);
                Self::print_call(call);
            }
        }
    }

    fn on_state_changed(&mut self, state: &TurnState) {
        if let TurnState::Aborted(reason) = state {
            log::warn!("Turn aborted: {}", reason);
        }
    }

    fn on_finalized(&mut self, _message: &Message) {}
}

/// Writes `text` to stdout, one character per `interval`.
pub async fn print_revealed(text: &str, interval: Duration) -> io::Result<()> {
    let mut stdout = io::stdout();
    if interval.is_zero() {
        writeln!(stdout, "{}", text)?;
        return stdout.flush();
    }

    let mut frames = Box::pin(reveal(text, interval));
    let mut printed = 0;
    while let Some(frame) = frames.next().await {
        write!(stdout, "{}", &frame[printed..])?;
        stdout.flush()?;
        printed = frame.len();
    }
    writeln!(stdout)?;
    stdout.flush()
}
