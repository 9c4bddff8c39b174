//! Chat configuration from TOML (`[chat]` section)

use serde::{Deserialize, Serialize};
use verinox_application::ChatConfig;
use verinox_domain::Model;

/// Raw chat configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Replaces the built-in system instruction
    pub system_prompt: Option<String>,
    /// Replay a conversation into the model context when it is selected
    pub restore_context_on_select: bool,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            restore_context_on_select: true,
        }
    }
}

impl FileChatConfig {
    /// Build the application-level [`ChatConfig`] for `model`.
    pub fn to_chat_config(&self, model: Model) -> ChatConfig {
        let config = ChatConfig::default()
            .with_model(model)
            .with_restore_context_on_select(self.restore_context_on_select);
        match &self.system_prompt {
            Some(prompt) => config.with_system_prompt(prompt.clone()),
            None => config,
        }
    }
}
