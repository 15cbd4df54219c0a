//! Conversational tool-calling orchestrator for a new-tab assistant.
//!
//! The crate owns the conversation model, the tool-call protocol embedded in
//! model replies, the per-turn execution loop and the context-compression
//! policy. Rendering, persistence and the privileged network relay server
//! live outside it and are reached through traits.
//!
//! # Architecture Overview
//!
//! - **Orchestration**: `agent::Orchestrator` runs one turn against an
//!   `OrchestratorContext`; `session::Session` enforces one turn at a time
//! - **Language model integration**: the `LLM` trait with a relay client and an
//!   OpenAI-compatible client, plus the tolerant tool-call extractor
//! - **Memory management**: transcript, token budget estimate and compressor
//! - **Tools**: `web_search` and `fetch_url` behind a registry and executor
//! - **Presentation**: the `PresentationSink` event contract and the cosmetic
//!   reveal stream
//! - **Configuration**: YAML file with environment-variable resolution

pub mod agent;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod reveal;
pub mod session;
pub mod sink;
pub mod tools;

pub use agent::{Orchestrator, OrchestratorContext, OrchestratorSettings, TurnOutcome};
pub use config::*;
pub use core_types::{Attachment, Message, MessageId, Role, ToolCall, ToolInvocation, ToolStatus, UserInput};
pub use errors::{AssistantError, ToolParseError};
pub use llm::LLM;
pub use session::Session;
pub use sink::{NoopSink, PresentationSink, TurnState};

#[cfg(test)]
pub mod test_utils;
