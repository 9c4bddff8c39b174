//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod chat;
mod logging;
mod output;
mod providers;
mod repl;
mod storage;

pub use chat::FileChatConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use providers::{FileOpenAiConfig, FileProvidersConfig};
pub use repl::FileReplConfig;
pub use storage::FileStorageConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verinox_domain::Model;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("providers.openai.model cannot be empty")]
    EmptyModelName,

    #[error("providers.openai.base_url must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("providers.openai.temperature must be between 0 and 2 (got {0})")]
    InvalidTemperature(f32),

    #[error("providers.openai.max_tokens cannot be 0")]
    ZeroMaxTokens,

    #[error("providers.openai.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("providers.openai.api_key_env cannot be empty")]
    EmptyApiKeyEnv,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Remote model provider settings
    pub providers: FileProvidersConfig,
    /// Conversation behaviour
    pub chat: FileChatConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Persistence settings
    pub storage: FileStorageConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Model named by `providers.openai.model`.
    pub fn model(&self) -> Model {
        let Ok(model) = self.providers.openai.model.parse();
        model
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let openai = &self.providers.openai;

        if openai.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModelName);
        }
        if !(openai.base_url.starts_with("http://") || openai.base_url.starts_with("https://")) {
            issues.push(ConfigValidationError::InvalidBaseUrl(
                openai.base_url.clone(),
            ));
        }
        if !(0.0..=2.0).contains(&openai.temperature) {
            issues.push(ConfigValidationError::InvalidTemperature(
                openai.temperature,
            ));
        }
        if openai.max_tokens == 0 {
            issues.push(ConfigValidationError::ZeroMaxTokens);
        }
        if openai.timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }
        if openai.api_key_env.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyApiKeyEnv);
        }

        issues
    }
}
