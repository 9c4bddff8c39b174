//! Application layer for verinox
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ChatConfig;
pub use ports::{
    chat_observer::{ChatObserver, NoChatObserver},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    key_value_store::{InMemoryKeyValueStore, KeyValueStore, StorageError},
    llm_gateway::{
        CONFIGURATION_NOTICE, CompletionBackend, CompletionRequest, GatewayError, StreamHandle,
        UPSTREAM_NOTICE,
    },
};
pub use use_cases::chat_orchestrator::{ChatOrchestrator, SendOutcome};
pub use use_cases::chat_state::{CHATS_KEY, ChatStateRepository, THEME_KEY};
pub use use_cases::gateway_client::{GatewayClient, TokenStream};
