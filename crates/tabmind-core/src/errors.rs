//! Error types for the orchestrator and its collaborators
//!
//! Errors are grouped by the subsystem that produced them (model endpoint,
//! tools, configuration, parsing). Inside a turn every one of them is resolved
//! into a terminal conversation state; they only surface to callers through
//! configuration loading, client construction and the session guard.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AssistantError {
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("A turn is already running for this session")]
    TurnInProgress,
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        AssistantError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::LLMError(err.to_string())
    }
}

/// Why a tool-call candidate found in a model reply was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("tool call is not a JSON object")]
    NotAnObject,
    #[error("tool call has no string 'name'")]
    MissingName,
    #[error("tool call '{0}' has no 'arguments' object")]
    MissingArguments(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArgument { tool: String, reason: String },
}
