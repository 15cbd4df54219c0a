//! Tool system for the assistant's network actions
//!
//! Every action the model can request is a `Tool` registered by name. The
//! executor looks tools up in the registry, so the orchestration loop never
//! depends on a concrete implementation, and tests can swap in fakes. Tools
//! reach the network through a `NetworkRelay` where one is configured.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::core_types::ToolInvocation;
use crate::errors::AssistantError;

pub mod executor;
pub mod fetch_url;
pub mod relay;
pub mod web_search;

pub use executor::ToolExecutor;
pub use fetch_url::FetchUrlTool;
pub use relay::{HttpRelay, NetworkRelay, SearchHit};
pub use web_search::WebSearchTool;

/// What the model is told about a tool in the prompt catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// Core Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, invocation: &ToolInvocation) -> Result<String, AssistantError>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Metadata of all registered tools, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        let mut tools: Vec<ToolMetadata> = self.tools.values().map(|tool| tool.metadata()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ToolFactory;

impl ToolFactory {
    /// Builds the `web_search` and `fetch_url` tools, sharing one relay
    /// client when `tools.relay` is configured.
    pub fn create_registry(config: &ToolsConfig) -> Result<ToolRegistry, AssistantError> {
        let relay = match &config.relay {
            Some(relay_config) => Some(HttpRelay::from_config(relay_config)?),
            None => {
                log::info!("No network relay configured; fetches will return placeholders");
                None
            }
        };
        Self::create_registry_with_relay(config, relay)
    }

    pub fn create_registry_with_relay(
        config: &ToolsConfig,
        relay: Option<Arc<dyn NetworkRelay>>,
    ) -> Result<ToolRegistry, AssistantError> {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(WebSearchTool::new(config.search.clone(), relay.clone())?));
        registry.register_tool(Arc::new(FetchUrlTool::new(config.fetch.clone(), relay)));
        Ok(registry)
    }
}
