//! Conversation domain.
//!
//! - [`entities::Conversation`]: a titled, ordered list of messages
//! - [`entities::Message`]: one user or assistant turn
//! - [`store::ConversationStore`]: the sole mutator of conversations

pub mod entities;
pub mod store;

pub use entities::{Author, Conversation, Message, DEFAULT_TITLE, TITLE_MAX_CHARS};
pub use store::{ConversationStore, DeleteOutcome, StoreSnapshot};
