//! Web search with a fallback chain
//!
//! Results come from the network relay when it has something usable, then
//! from the configured SearXNG-style meta-search endpoints, and finally from a
//! synthetic result that links to a manual search page. Searching never fails
//! the turn; the worst case is a link the user can open themselves.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SearchConfig, SearchEndpointConfig};
use crate::core_types::{truncate_chars, ToolInvocation, WEB_SEARCH};
use crate::errors::AssistantError;
use crate::tools::relay::{NetworkRelay, SearchHit};
use crate::tools::{Tool, ToolMetadata};

const SEARCH_ENGINE_HOSTS: &[&str] = &[
    "google.",
    "bing.com",
    "duckduckgo.com",
    "baidu.com",
    "search.yahoo.",
    "yandex.",
    "sogou.com",
    "so.com",
    "search.brave.com",
];

const SEARCH_QUERY_KEYS: &[&str] = &["q", "p", "wd", "word", "query", "text"];

/// True for links that are themselves a search engine's result listing
/// rather than a content page.
pub fn is_search_results_page(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_start_matches("www.");

    let is_engine = SEARCH_ENGINE_HOSTS.iter().any(|pattern| {
        if pattern.ends_with('.') {
            host.starts_with(pattern) || host.contains(&format!(".{}", pattern))
        } else {
            host == *pattern || host.ends_with(&format!(".{}", pattern))
        }
    });
    if !is_engine {
        return false;
    }

    parsed.path().starts_with("/search")
        || parsed
            .query_pairs()
            .any(|(key, _)| SEARCH_QUERY_KEYS.iter().any(|k| key == *k))
}

pub struct WebSearchTool {
    client: Client,
    config: SearchConfig,
    endpoint_timeout: Duration,
    relay: Option<Arc<dyn NetworkRelay>>,
}

impl WebSearchTool {
    pub fn new(config: SearchConfig, relay: Option<Arc<dyn NetworkRelay>>) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .user_agent(concat!("tabmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssistantError::ConfigError(format!("Failed to build search client: {}", e)))?;
        Ok(Self {
            client,
            endpoint_timeout: Duration::from_secs(config.endpoint_timeout_secs),
            config,
            relay,
        })
    }

    pub fn with_endpoint_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint_timeout = timeout;
        self
    }

    /// Runs the fallback chain. Always returns at least one hit.
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        if let Some(relay) = &self.relay {
            match relay.search(query).await {
                Ok(hits) => {
                    let usable = self.usable(hits);
                    if !usable.is_empty() {
                        log::info!("Relay search for '{}' returned {} usable results", query, usable.len());
                        return usable;
                    }
                    log::debug!("Relay search for '{}' had no usable results", query);
                }
                Err(e) => log::warn!("Relay search failed: {}", e),
            }
        }

        for endpoint in &self.config.endpoints {
            match tokio::time::timeout(self.endpoint_timeout, self.search_endpoint(endpoint, query)).await {
                Ok(Ok(hits)) => {
                    let usable = self.usable(hits);
                    if !usable.is_empty() {
                        log::info!(
                            "Search endpoint '{}' returned {} usable results",
                            endpoint.name,
                            usable.len()
                        );
                        return usable;
                    }
                }
                Ok(Err(e)) => log::warn!("Search endpoint '{}' failed: {}", endpoint.name, e),
                Err(_) => log::warn!(
                    "Search endpoint '{}' timed out after {:?}",
                    endpoint.name,
                    self.endpoint_timeout
                ),
            }
        }

        log::info!("All search backends came up empty for '{}'; offering a manual search link", query);
        vec![self.fallback_hit(query)]
    }

    async fn search_endpoint(
        &self,
        endpoint: &SearchEndpointConfig,
        query: &str,
    ) -> Result<Vec<SearchHit>, AssistantError> {
        let url = endpoint
            .url_template
            .replace("{query}", &urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AssistantError::ToolError {
                tool_name: WEB_SEARCH.to_string(),
                message: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AssistantError::ToolError {
                tool_name: WEB_SEARCH.to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let data: Value = response.json().await.map_err(|e| AssistantError::ToolError {
            tool_name: WEB_SEARCH.to_string(),
            message: format!("invalid JSON: {}", e),
        })?;

        Ok(parse_meta_search_results(&data))
    }

    fn usable(&self, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        hits.into_iter()
            .filter(|hit| !hit.url.is_empty() && !is_search_results_page(&hit.url))
            .take(self.config.max_results)
            .map(|hit| SearchHit {
                snippet: truncate_chars(hit.snippet.trim(), self.config.snippet_chars),
                ..hit
            })
            .collect()
    }

    fn fallback_hit(&self, query: &str) -> SearchHit {
        SearchHit {
            title: format!("Search the web for \"{}\"", query),
            url: self
                .config
                .fallback_search_url
                .replace("{query}", &urlencoding::encode(query)),
            snippet: "Automatic search is unavailable right now. Open this link to see results.".to_string(),
        }
    }
}

/// SearXNG-style `{results: [{title, url, content | snippet}]}`.
fn parse_meta_search_results(data: &Value) -> Vec<SearchHit> {
    data["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|result| {
                    let url = result["url"].as_str()?.to_string();
                    Some(SearchHit {
                        title: result["title"].as_str().unwrap_or_default().to_string(),
                        url,
                        snippet: result["content"]
                            .as_str()
                            .or_else(|| result["snippet"].as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("Search results for '{}':\n", query);
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n   URL: {}\n", i + 1, hit.title, hit.url));
        if !hit.snippet.is_empty() {
            out.push_str(&format!("   {}\n", hit.snippet));
        }
    }
    out.trim_end().to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: WEB_SEARCH.to_string(),
            description: "Search the web for current information. Returns titles, links and short snippets.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<String, AssistantError> {
        let ToolInvocation::WebSearch { query } = invocation else {
            return Err(AssistantError::ToolError {
                tool_name: WEB_SEARCH.to_string(),
                message: format!("cannot handle '{}' invocation", invocation.name()),
            });
        };

        log::info!("Web search: '{}'", query);
        let hits = self.search(query).await;
        Ok(format_results(query, &hits))
    }
}
