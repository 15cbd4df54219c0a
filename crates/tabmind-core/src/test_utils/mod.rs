// src/test_utils/mod.rs
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::core_types::{Message, MessageId, ToolCall, ToolInvocation};
use crate::errors::AssistantError;
use crate::llm::{ModelRequest, LLM};
use crate::sink::{PresentationSink, TurnState};
use crate::tools::{Tool, ToolMetadata};

/// Model that replays canned replies in order and records every request.
pub struct ScriptedLLM {
    replies: Mutex<VecDeque<Result<String, AssistantError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    delay: Duration,
}

impl ScriptedLLM {
    pub fn new(replies: Vec<Result<String, AssistantError>>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from(replies)),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AssistantError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(AssistantError::LLMError("script exhausted".to_string())))
    }
}

/// Tool that always answers with the same text.
pub struct StaticTool {
    name: &'static str,
    output: String,
}

impl StaticTool {
    pub fn new(name: &'static str, output: impl Into<String>) -> Self {
        Self {
            name,
            output: output.into(),
        }
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.name.to_string(),
            description: format!("static {}", self.name),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    async fn execute(&self, _invocation: &ToolInvocation) -> Result<String, AssistantError> {
        Ok(self.output.clone())
    }
}

#[derive(Debug, Clone)]
pub enum SinkEvent {
    TurnStarted(MessageId),
    ToolCalls(Vec<ToolCall>),
    State(TurnState),
    Finalized(String),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub finalized: Vec<String>,
}

impl PresentationSink for RecordingSink {
    fn on_turn_started(&mut self, placeholder: &Message) {
        self.events.push(SinkEvent::TurnStarted(placeholder.id));
    }

    fn on_tool_calls_updated(&mut self, _message_id: MessageId, tool_calls: &[ToolCall]) {
        self.events.push(SinkEvent::ToolCalls(tool_calls.to_vec()));
    }

    fn on_state_changed(&mut self, state: &TurnState) {
        self.events.push(SinkEvent::State(state.clone()));
    }

    fn on_finalized(&mut self, message: &Message) {
        self.finalized.push(message.content.clone());
        self.events.push(SinkEvent::Finalized(message.content.clone()));
    }
}
