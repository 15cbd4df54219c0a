//! Configuration module
//!
//! Configuration comes from a single YAML file (`tabmind.yaml` by default) with
//! environment-variable resolution for secrets. Missing sections fall back to
//! defaults.

pub mod types;
pub mod loader;
pub mod validation;

pub use types::*;
pub use loader::*;


use crate::errors::AssistantError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<TabmindConfig, AssistantError> {
    ConfigLoader::from_file(path).await
}

/// Validate a configuration
pub fn validate_config(config: &TabmindConfig) -> Result<(), AssistantError> {
    config.validate()
}
