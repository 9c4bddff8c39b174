//! Infrastructure layer for verinox
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod openai;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileChatConfig, FileConfig, FileLoggingConfig,
    FileOpenAiConfig, FileOutputConfig, FileReplConfig, FileStorageConfig,
};
pub use logging::JsonlConversationLogger;
pub use openai::{OpenAiBackend, OpenAiError, OpenAiSettings};
pub use storage::JsonFileKeyValueStore;
