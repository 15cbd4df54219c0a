// src/sink.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::{Message, MessageId, ToolCall};

/// Where a turn currently is in the orchestration loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    AwaitingModel,
    Parsing,
    ExecutingTools,
    Finalized,
    Aborted(String),
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Finalized | TurnState::Aborted(_))
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::AwaitingModel => write!(f, "awaiting-model"),
            TurnState::Parsing => write!(f, "parsing"),
            TurnState::ExecutingTools => write!(f, "executing-tools"),
            TurnState::Finalized => write!(f, "finalized"),
            TurnState::Aborted(reason) => write!(f, "aborted ({})", reason),
        }
    }
}

/// Receives a turn's progress as it happens.
/// Rendering lives entirely on the other side of this trait; implementations
/// must not assume they can influence the conversation.
pub trait PresentationSink: Send {
    /// The assistant placeholder exists and the model is about to be asked.
    fn on_turn_started(&mut self, placeholder: &Message);

    /// A tool call was added to, or changed status on, the placeholder.
    fn on_tool_calls_updated(&mut self, message_id: MessageId, tool_calls: &[ToolCall]);

    fn on_state_changed(&mut self, _state: &TurnState) {}

    /// Final content of the placeholder, also sent for aborted turns.
    fn on_finalized(&mut self, message: &Message);
}

/// Sink for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl PresentationSink for NoopSink {
    fn on_turn_started(&mut self, _placeholder: &Message) {}

    fn on_tool_calls_updated(&mut self, _message_id: MessageId, _tool_calls: &[ToolCall]) {}

    fn on_finalized(&mut self, _message: &Message) {}
}
