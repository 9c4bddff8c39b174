//! Chat behaviour parameters.

use verinox_domain::{DEFAULT_SYSTEM_PROMPT, Model};

/// Controls the orchestrator and the gateway client.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model used for new requests.
    pub model: Model,
    /// System instruction at the head of every gateway history.
    pub system_prompt: String,
    /// Replay a conversation's messages into the gateway history when it is
    /// selected. When false, selecting leaves the history untouched and the
    /// model keeps the context of whatever was discussed last.
    pub restore_context_on_select: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: Model::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            restore_context_on_select: true,
        }
    }
}

impl ChatConfig {
    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_restore_context_on_select(mut self, restore: bool) -> Self {
        self.restore_context_on_select = restore;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.model, Model::Gpt4);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(config.restore_context_on_select);
    }

    #[test]
    fn test_builders() {
        let config = ChatConfig::default()
            .with_model(Model::Gpt4oMini)
            .with_system_prompt("be terse")
            .with_restore_context_on_select(false);
        assert_eq!(config.model, Model::Gpt4oMini);
        assert_eq!(config.system_prompt, "be terse");
        assert!(!config.restore_context_on_select);
    }
}
