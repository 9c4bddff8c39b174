//! Chat observer port
//!
//! Defines the callbacks the presentation layer receives while the
//! orchestrator mutates the conversation store.

use verinox_domain::{ConversationId, ExchangeState, Message};

/// Callback for store changes made by the orchestrator.
///
/// Implementations live in the presentation layer. All methods default to
/// no-ops so renderers only implement what they draw.
pub trait ChatObserver: Send + Sync {
    /// The "typing" flag changed.
    fn on_typing_changed(&self, _typing: bool) {}

    /// A message was appended to a conversation.
    fn on_message_appended(&self, _conversation: &ConversationId, _message: &Message) {}

    /// A streaming message received a new full text.
    fn on_message_updated(&self, _conversation: &ConversationId, _message: &Message) {}

    /// The exchange reached a terminal state.
    fn on_exchange_finished(&self, _state: ExchangeState) {}
}

/// No-op observer for when nothing is rendered
pub struct NoChatObserver;

impl ChatObserver for NoChatObserver {}
