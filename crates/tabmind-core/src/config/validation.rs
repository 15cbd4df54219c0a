//! Sanity checks applied after a configuration has been loaded

use crate::config::types::TabmindConfig;
use crate::errors::AssistantError;

impl TabmindConfig {
    pub fn validate(&self) -> Result<(), AssistantError> {
        let assistant = &self.assistant;
        if assistant.max_iterations == 0 {
            return Err(AssistantError::ConfigError(
                "assistant.max_iterations must be at least 1".to_string(),
            ));
        }
        if assistant.greeting.trim().is_empty() {
            return Err(AssistantError::ConfigError(
                "assistant.greeting must not be empty".to_string(),
            ));
        }

        let context = &self.context;
        if context.max_tokens == 0 {
            return Err(AssistantError::ConfigError(
                "context.max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(context.compression_threshold > 0.0 && context.compression_threshold <= 1.0) {
            return Err(AssistantError::ConfigError(format!(
                "context.compression_threshold must be in (0, 1], got {}",
                context.compression_threshold
            )));
        }
        // The current user message and its reply must survive compression.
        if context.keep_recent < 2 {
            return Err(AssistantError::ConfigError(
                "context.keep_recent must be at least 2".to_string(),
            ));
        }

        let llm = &self.llm;
        if llm.use_custom_endpoint {
            if llm.custom.api_base.trim().is_empty() {
                return Err(AssistantError::ConfigError(
                    "llm.custom.api_base is required when use_custom_endpoint is set".to_string(),
                ));
            }
            if llm.custom.auth.api_key.is_none() && llm.custom.auth.api_key_env.is_none() {
                return Err(AssistantError::ConfigError(
                    "Custom endpoint requires either 'api_key' or 'api_key_env'".to_string(),
                ));
            }
        } else if llm.relay.url.trim().is_empty() {
            return Err(AssistantError::ConfigError(
                "llm.relay.url must not be empty".to_string(),
            ));
        }
        if llm.request_timeout_secs == 0 {
            return Err(AssistantError::ConfigError(
                "llm.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let search = &self.tools.search;
        for endpoint in &search.endpoints {
            if !endpoint.url_template.contains("{query}") {
                return Err(AssistantError::ConfigError(format!(
                    "Search endpoint '{}' has no {{query}} placeholder",
                    endpoint.name
                )));
            }
        }
        if !search.fallback_search_url.contains("{query}") {
            return Err(AssistantError::ConfigError(
                "tools.search.fallback_search_url has no {query} placeholder".to_string(),
            ));
        }
        if search.max_results == 0 {
            return Err(AssistantError::ConfigError(
                "tools.search.max_results must be at least 1".to_string(),
            ));
        }
        if let Some(relay) = &self.tools.relay {
            if relay.base_url.trim().is_empty() {
                return Err(AssistantError::ConfigError(
                    "tools.relay.base_url must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
