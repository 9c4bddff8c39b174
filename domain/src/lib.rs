//! Domain layer for verinox
//!
//! This crate contains the core entities and value objects of the chat
//! client. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversation
//!
//! A titled, timestamped, ordered list of [`Message`]s. The
//! [`ConversationStore`] is the only thing that mutates conversations.
//!
//! ## Gateway history
//!
//! The role-tagged context sent to the remote model ([`GatewayHistory`]).
//! It is kept apart from conversations on purpose: it is what the model
//! sees, not what the user sees.
//!
//! ## Exchange
//!
//! One request/response round trip, tracked by [`ExchangeState`].

pub mod chat;
pub mod config;
pub mod conversation;
pub mod core;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use chat::{ChatFlags, ExchangeState};
pub use config::Theme;
pub use conversation::{
    Author, Conversation, ConversationStore, DeleteOutcome, Message, StoreSnapshot,
};
pub use core::{
    error::DomainError,
    id::{ConversationId, MessageId},
    input::UserInput,
    model::Model,
};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use session::{GatewayHistory, HistoryEntry, Role, StreamEvent};
