use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::core_types::{truncate_chars, ToolInvocation, FETCH_URL};
use crate::errors::AssistantError;
use crate::tools::relay::NetworkRelay;
use crate::tools::{Tool, ToolMetadata};

/// Retrieves page text through the network relay.
///
/// A failed fetch is routine, so it resolves to a placeholder the model can
/// reason about instead of an error.
pub struct FetchUrlTool {
    config: FetchConfig,
    relay: Option<Arc<dyn NetworkRelay>>,
}

impl FetchUrlTool {
    pub fn new(config: FetchConfig, relay: Option<Arc<dyn NetworkRelay>>) -> Self {
        Self { config, relay }
    }

    pub async fn fetch(&self, url: &str) -> String {
        let Some(relay) = &self.relay else {
            log::info!("No network relay available to fetch {}", url);
            return format!(
                "Could not fetch {}: page fetching is unavailable (no network relay configured).",
                url
            );
        };

        match relay.fetch_url(url).await {
            Ok(content) if content.trim().is_empty() => {
                format!("Fetched {} but the page had no readable text.", url)
            }
            Ok(content) => {
                log::info!("Fetched {} ({} chars)", url, content.chars().count());
                truncate_chars(content.trim(), self.config.max_content_chars)
            }
            Err(e) => {
                log::warn!("Fetch of {} failed: {}", url, e);
                format!("Could not fetch {}: {}", url, e)
            }
        }
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: FETCH_URL.to_string(),
            description: "Fetch the readable text of a web page.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Absolute http(s) URL of the page"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<String, AssistantError> {
        match invocation {
            ToolInvocation::FetchUrl { url } => Ok(self.fetch(url).await),
            other => Err(AssistantError::ToolError {
                tool_name: FETCH_URL.to_string(),
                message: format!("cannot handle '{}' invocation", other.name()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::relay::SearchHit;

    struct PageRelay {
        page: Result<String, AssistantError>,
    }

    #[async_trait]
    impl NetworkRelay for PageRelay {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, AssistantError> {
            Ok(Vec::new())
        }

        async fn fetch_url(&self, _url: &str) -> Result<String, AssistantError> {
            self.page.clone()
        }
    }

    fn invocation() -> ToolInvocation {
        ToolInvocation::FetchUrl {
            url: "https://example.com/article".to_string(),
        }
    }

    #[tokio::test]
    async fn test_content_is_truncated() {
        let relay = PageRelay {
            page: Ok("a".repeat(50)),
        };
        let tool = FetchUrlTool::new(FetchConfig { max_content_chars: 10 }, Some(Arc::new(relay)));
        let output = tool.execute(&invocation()).await.unwrap();
        assert_eq!(output, format!("{}…", "a".repeat(10)));
    }

    #[tokio::test]
    async fn test_relay_failure_is_not_an_error() {
        let relay = PageRelay {
            page: Err(AssistantError::ToolError {
                tool_name: "relay".to_string(),
                message: "connection refused".to_string(),
            }),
        };
        let tool = FetchUrlTool::new(FetchConfig::default(), Some(Arc::new(relay)));
        let output = tool.execute(&invocation()).await.unwrap();
        assert!(output.starts_with("Could not fetch https://example.com/article"));
        assert!(output.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_relay_yields_placeholder() {
        let tool = FetchUrlTool::new(FetchConfig::default(), None);
        let output = tool.execute(&invocation()).await.unwrap();
        assert!(output.contains("no network relay configured"));
    }
}
