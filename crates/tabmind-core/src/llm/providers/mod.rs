//! LLM provider implementations
//!
//! The hosted relay speaks a form-encoded request / plain-text response
//! protocol; the custom endpoint is any OpenAI-compatible chat completions API
//! (OpenAI, DeepSeek, local gateways).

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::errors::AssistantError;
use crate::llm::LLM;

pub mod openai;
pub mod relay;

/// Create an LLM client based on the `use_custom_endpoint` flag
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    if config.use_custom_endpoint {
        openai::create_client(config, timeout)
    } else {
        relay::create_client(config, timeout)
    }
}

/// Client with the model-call timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, AssistantError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AssistantError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}
