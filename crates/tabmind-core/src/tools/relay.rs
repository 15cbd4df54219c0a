//! Client side of the privileged network relay.
//!
//! The relay runs outside the sandbox and performs searches and page fetches
//! on the assistant's behalf. Only the client lives here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::NetworkRelayConfig;
use crate::errors::AssistantError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default, alias = "content")]
    pub snippet: String,
}

#[async_trait]
pub trait NetworkRelay: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AssistantError>;
    async fn fetch_url(&self, url: &str) -> Result<String, AssistantError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    content: String,
}

/// JSON-over-HTTP relay: `POST {base}/search` and `POST {base}/fetch`.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: Client,
    base_url: String,
}

impl HttpRelay {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistantError::ConfigError(format!("Failed to build relay client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &NetworkRelayConfig) -> Result<Arc<dyn NetworkRelay>, AssistantError> {
        log::info!("Using network relay at {}", config.base_url);
        Ok(Arc::new(Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?))
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response, AssistantError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::ToolError {
                tool_name: "relay".to_string(),
                message: format!("Relay request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::ToolError {
                tool_name: "relay".to_string(),
                message: format!("Relay {} answered with status {}", path, status),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl NetworkRelay for HttpRelay {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AssistantError> {
        let response = self.post("search", json!({ "query": query })).await?;
        let parsed: SearchResponse = response.json().await.map_err(|e| AssistantError::ToolError {
            tool_name: "relay".to_string(),
            message: format!("Invalid relay search response: {}", e),
        })?;
        log::debug!("Relay search '{}' returned {} results", query, parsed.results.len());
        Ok(parsed.results)
    }

    async fn fetch_url(&self, url: &str) -> Result<String, AssistantError> {
        let response = self.post("fetch", json!({ "url": url })).await?;
        let parsed: FetchResponse = response.json().await.map_err(|e| AssistantError::ToolError {
            tool_name: "relay".to_string(),
            message: format!("Invalid relay fetch response: {}", e),
        })?;
        Ok(parsed.content)
    }
}
