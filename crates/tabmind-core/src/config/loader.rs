//! Configuration loader for YAML files and environment resolution

use crate::config::types::*;
use crate::errors::AssistantError;
use std::env;
use std::path::Path;
use tokio::fs;

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<TabmindConfig, AssistantError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            AssistantError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content, path.parent()).await
    }

    /// Load the file if it exists, otherwise fall back to built-in defaults.
    pub async fn from_file_or_default<P: AsRef<Path>>(
        path: P,
    ) -> Result<TabmindConfig, AssistantError> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_ok() {
            return Self::from_file(path).await;
        }

        log::warn!(
            "Config file {} not found, using default configuration",
            path.display()
        );
        let mut config = TabmindConfig::default();
        Self::resolve_environment(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub async fn from_str(
        content: &str,
        base_dir: Option<&Path>,
    ) -> Result<TabmindConfig, AssistantError> {
        let mut config: TabmindConfig = if content.trim().is_empty() {
            TabmindConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                AssistantError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        Self::resolve_environment(&mut config)?;
        Self::resolve_prompts(&mut config, base_dir).await?;

        config.validate()?;

        Ok(config)
    }

    /// Resolve environment variables in the configuration
    fn resolve_environment(config: &mut TabmindConfig) -> Result<(), AssistantError> {
        Self::resolve_llm_auth(&mut config.llm.custom.auth)?;

        if let Ok(level) = env::var("TABMIND_LOG_LEVEL") {
            if !level.trim().is_empty() {
                config.logging.level = level;
            }
        }

        Ok(())
    }

    fn resolve_llm_auth(auth: &mut LlmAuth) -> Result<(), AssistantError> {
        if auth.api_key.is_some() {
            return Ok(());
        }

        if let Some(env_var) = &auth.api_key_env {
            match env::var(env_var) {
                Ok(key) => {
                    log::debug!("Resolved API key from environment variable {}", env_var);
                    auth.api_key = Some(key);
                }
                Err(_) => {
                    log::warn!("Environment variable {} is not set", env_var);
                }
            }
        }

        Ok(())
    }

    async fn resolve_prompts(
        config: &mut TabmindConfig,
        base_dir: Option<&Path>,
    ) -> Result<(), AssistantError> {
        let Some(file) = config.assistant.system_prompt_file.clone() else {
            return Ok(());
        };

        let path = match base_dir {
            Some(dir) => dir.join(&file),
            None => Path::new(&file).to_path_buf(),
        };
        log::info!("Loading system prompt from file: {}", path.display());

        let content = fs::read_to_string(&path).await.map_err(|e| {
            AssistantError::ConfigError(format!(
                "Failed to read prompt file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.assistant.system_prompt = content.trim().to_string();
        Ok(())
    }
}
