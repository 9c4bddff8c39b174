//! Application-level configuration.
//!
//! Configuration types that control how the chat use cases behave.

mod chat_config;

pub use chat_config::ChatConfig;
