//! Factory for building the configured model client

use crate::config::LlmConfig;
use crate::errors::AssistantError;
use crate::llm::LLM;
use std::sync::Arc;

pub struct LLMFactory;

impl LLMFactory {
    /// Builds the relay or custom-endpoint client depending on
    /// `use_custom_endpoint`. Callers only ever see `dyn LLM`.
    pub fn create_from_config(config: &LlmConfig) -> Result<Arc<dyn LLM>, AssistantError> {
        log::info!(
            "Using {} model backend (model {}, timeout {}s)",
            if config.use_custom_endpoint { "custom" } else { "relay" },
            config.parameters.model,
            config.request_timeout_secs
        );
        crate::llm::providers::create_llm_client(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_backend_needs_no_key() {
        let config = LlmConfig::default();
        assert!(LLMFactory::create_from_config(&config).is_ok());
    }

    #[test]
    fn test_custom_backend_requires_resolved_key() {
        let mut config = LlmConfig {
            use_custom_endpoint: true,
            ..Default::default()
        };
        assert!(matches!(
            LLMFactory::create_from_config(&config),
            Err(AssistantError::ConfigError(_))
        ));

        config.custom.auth.api_key = Some("sk-test".to_string());
        assert!(LLMFactory::create_from_config(&config).is_ok());
    }
}
