//! Language model endpoint abstraction.
//!
//! Both supported backends (the hosted relay and an OpenAI-compatible chat
//! completions endpoint) take the same request: one question, one system
//! context string and the model parameters, and answer with the plain reply
//! text. Tool calls travel inside that text and are recovered by
//! [`response_parser::ToolCallExtractor`].

use crate::config::ModelParameters;
use crate::errors::AssistantError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod providers;
pub mod response_parser;
pub mod utils;

pub use response_parser::{ExtractedReply, ToolCallExtractor};
pub use utils::LLMFactory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelRequest {
    pub question: String,
    pub system_context: String,
    pub params: ModelParameters,
}

#[async_trait]
pub trait LLM: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AssistantError>;
}
