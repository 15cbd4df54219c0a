use crate::config::LlmConfig;
use crate::errors::AssistantError;
use crate::llm::providers::http_client;
use crate::llm::{ModelRequest, LLM};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Client for the hosted chat relay: form-encoded request, plain-text reply.
#[derive(Debug, Clone)]
pub struct RelayLLMClient {
    client: Client,
    endpoint_url: String,
}

impl RelayLLMClient {
    pub fn new(endpoint_url: String, timeout: Duration) -> Result<Self, AssistantError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint_url,
        })
    }

    fn form_fields(request: &ModelRequest) -> Vec<(&'static str, String)> {
        vec![
            ("question", request.question.clone()),
            ("systemContext", request.system_context.clone()),
            ("model", request.params.model.clone()),
            ("temperature", request.params.temperature.to_string()),
            ("maxTokens", request.params.max_tokens.to_string()),
        ]
    }
}

#[async_trait]
impl LLM for RelayLLMClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AssistantError> {
        log::debug!(
            "Relay request to {} ({} chars of system context)",
            self.endpoint_url,
            request.system_context.len()
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .form(&Self::form_fields(request))
            .send()
            .await
            .map_err(|e| AssistantError::LLMError(format!("HTTP request to relay failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::LLMError(format!("Failed to read relay response: {}", e)))?;

        if !status.is_success() {
            let err_msg = format!("Relay request failed with status {}: {}", status, body);
            log::error!("{}", err_msg);
            return Err(AssistantError::LLMError(err_msg));
        }

        log::debug!("Relay response: {} chars", body.len());
        Ok(body)
    }
}

pub fn create_client(config: &LlmConfig, timeout: Duration) -> Result<Arc<dyn LLM>, AssistantError> {
    Ok(Arc::new(RelayLLMClient::new(config.relay.url.clone(), timeout)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelParameters;
    use axum::{extract::Form, http::StatusCode, routing::post, Router};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> ModelRequest {
        ModelRequest {
            question: "What time is it?".to_string(),
            system_context: "Be brief.".to_string(),
            params: ModelParameters::default(),
        }
    }

    #[tokio::test]
    async fn test_relay_sends_form_and_returns_text() {
        let app = Router::new().route(
            "/chat",
            post(|Form(fields): Form<HashMap<String, String>>| async move {
                format!(
                    "{}|{}|{}",
                    fields.get("question").cloned().unwrap_or_default(),
                    fields.get("systemContext").cloned().unwrap_or_default(),
                    fields.get("maxTokens").cloned().unwrap_or_default()
                )
            }),
        );
        let base = serve(app).await;
        let client = RelayLLMClient::new(format!("{}/chat", base), Duration::from_secs(5)).unwrap();

        let reply = client.generate(&request()).await.unwrap();
        assert_eq!(reply, "What time is it?|Be brief.|2048");
    }

    #[tokio::test]
    async fn test_relay_error_status_is_llm_error() {
        let app = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(app).await;
        let client = RelayLLMClient::new(format!("{}/chat", base), Duration::from_secs(5)).unwrap();

        match client.generate(&request()).await {
            Err(AssistantError::LLMError(msg)) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("upstream down"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
