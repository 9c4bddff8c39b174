//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the API, without the `/v1/...` path.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Max tokens per response.
    pub max_tokens: u32,
    /// Read timeout for the streaming response, in seconds.
    pub timeout_seconds: u64,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// OpenAI API settings.
    pub openai: FileOpenAiConfig,
}
