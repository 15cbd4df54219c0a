use crate::config::LlmConfig;
use crate::errors::AssistantError;
use crate::llm::providers::http_client;
use crate::llm::{ModelRequest, LLM};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// OpenAI-compatible chat completions client (OpenAI, DeepSeek, gateways).
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> Result<Self, AssistantError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn build_request_body(&self, request: &ModelRequest) -> Value {
        let mut messages = Vec::new();
        if !request.system_context.is_empty() {
            messages.push(json!({"role": "system", "content": request.system_context}));
        }
        messages.push(json!({"role": "user", "content": request.question}));

        json!({
            "model": request.params.model,
            "messages": messages,
            "temperature": request.params.temperature,
            "max_tokens": request.params.max_tokens,
        })
    }

    fn parse_response(response: Value) -> Result<String, AssistantError> {
        let choices = response["choices"]
            .as_array()
            .ok_or_else(|| AssistantError::ParsingError("No choices in response".to_string()))?;

        let choice = choices
            .first()
            .ok_or_else(|| AssistantError::ParsingError("Empty choices array".to_string()))?;

        // A null content is a legitimate (if degenerate) reply; the loop
        // turns it into a truncation notice.
        Ok(choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AssistantError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(request);
        log::debug!("Chat completions request to {} (model {})", url, request.params.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::LLMError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AssistantError::LLMError(format!("Failed to read response: {}", e)))?;

        log::debug!("Chat completions response ({}): {} chars", status, response_text.len());

        if !status.is_success() {
            return Err(AssistantError::LLMError(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| AssistantError::ParsingError(format!("Invalid JSON response: {}", e)))?;

        Self::parse_response(response_json)
    }
}

pub fn create_client(config: &LlmConfig, timeout: Duration) -> Result<Arc<dyn LLM>, AssistantError> {
    let api_key = config.custom.auth.api_key.clone().ok_or_else(|| {
        AssistantError::ConfigError(
            "Custom endpoint API key not found. Set 'api_key' or 'api_key_env'".to_string(),
        )
    })?;

    Ok(Arc::new(OpenAIClient::new(
        api_key,
        config.custom.api_base.clone(),
        timeout,
    )?))
}
