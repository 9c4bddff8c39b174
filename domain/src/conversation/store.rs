//! In-memory conversation store.
//!
//! Conversations are kept newest-first. At most one is active at a time.
//! Every lookup that fails to resolve is a silent no-op reported through the
//! return value, never a panic.

use super::entities::{Conversation, Message};
use crate::core::id::{ConversationId, MessageId};
use serde::{Deserialize, Serialize};

/// Result of [`ConversationStore::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    /// A conversation with the given id existed and was removed.
    pub removed: bool,
    /// The removed conversation was the active one, so the active
    /// conversation changed (to the first remaining one, or none).
    pub active_changed: bool,
}

/// Serializable image of the store, used for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub conversations: Vec<Conversation>,
    pub active: Option<ConversationId>,
}

/// Collection of conversations plus the active selection.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted state.
    ///
    /// Messages left streaming by an interrupted run are finalized, and an
    /// active id that no longer resolves is dropped.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut conversations = snapshot.conversations;
        for conv in &mut conversations {
            conv.finish_all();
        }
        let active = snapshot
            .active
            .filter(|id| conversations.iter().any(|c| c.id() == id));
        Self {
            conversations,
            active,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            conversations: self.conversations.clone(),
            active: self.active.clone(),
        }
    }

    // ==================== Conversation lifecycle ====================

    /// Create a conversation at the front of the list and make it active.
    pub fn create(&mut self) -> ConversationId {
        let conversation = Conversation::new();
        let id = conversation.id().clone();
        self.conversations.insert(0, conversation);
        self.active = Some(id.clone());
        id
    }

    /// Make `id` active. Returns false (and changes nothing) if unknown.
    pub fn select(&mut self, id: &ConversationId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active = Some(id.clone());
        true
    }

    /// Remove a conversation.
    ///
    /// Deleting the active conversation activates the first remaining one,
    /// or leaves nothing active if the list is now empty.
    pub fn delete(&mut self, id: &ConversationId) -> DeleteOutcome {
        let Some(index) = self.position(id) else {
            return DeleteOutcome::default();
        };
        self.conversations.remove(index);

        let was_active = self.active.as_ref() == Some(id);
        if was_active {
            self.active = self.conversations.first().map(|c| c.id().clone());
        }

        DeleteOutcome {
            removed: true,
            active_changed: was_active,
        }
    }

    /// Remove every conversation. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.conversations.len();
        self.conversations.clear();
        self.active = None;
        count
    }

    // ==================== Message mutation ====================

    /// Append to the named conversation only.
    pub fn append_message(&mut self, conversation_id: &ConversationId, message: Message) -> bool {
        match self.get_mut(conversation_id) {
            Some(conv) => {
                conv.push(message);
                true
            }
            None => false,
        }
    }

    /// Replace the text of a streaming message.
    ///
    /// No-op if the pair does not resolve or the message is already finished.
    pub fn update_message(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        text: impl Into<String>,
    ) -> bool {
        self.get_mut(conversation_id)
            .and_then(|conv| conv.message_mut(message_id))
            .is_some_and(|msg| msg.replace_text(text.into()))
    }

    /// Flip a message's streaming flag off. No-op if the pair does not resolve.
    pub fn mark_finished(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> bool {
        match self
            .get_mut(conversation_id)
            .and_then(|conv| conv.message_mut(message_id))
        {
            Some(msg) => {
                msg.finish();
                true
            }
            None => false,
        }
    }

    // ==================== Queries ====================

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id() == id)
    }

    pub fn active_id(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Conversations in list order (newest first).
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn position(&self, id: &ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id() == id)
    }

    fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::entities::DEFAULT_TITLE;

    #[test]
    fn test_create_inserts_at_front_and_activates() {
        let mut store = ConversationStore::new();
        let first = store.create();
        let second = store.create();

        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].id(), &second);
        assert_eq!(store.list()[1].id(), &first);
        assert_eq!(store.active_id(), Some(&second));
    }

    #[test]
    fn test_select_unknown_is_noop() {
        let mut store = ConversationStore::new();
        let id = store.create();
        assert!(!store.select(&ConversationId::from("missing")));
        assert_eq!(store.active_id(), Some(&id));
    }

    #[test]
    fn test_select_known() {
        let mut store = ConversationStore::new();
        let first = store.create();
        store.create();
        assert!(store.select(&first));
        assert_eq!(store.active_id(), Some(&first));
    }

    #[test]
    fn test_delete_active_activates_first_remaining() {
        let mut store = ConversationStore::new();
        let a = store.create();
        let b = store.create();
        let c = store.create();
        // list order: c, b, a
        store.select(&b);

        let outcome = store.delete(&b);
        assert!(outcome.removed);
        assert!(outcome.active_changed);
        assert_eq!(store.active_id(), Some(&c));
        assert!(store.get(&a).is_some());
    }

    #[test]
    fn test_delete_inactive_keeps_active() {
        let mut store = ConversationStore::new();
        let a = store.create();
        let b = store.create();

        let outcome = store.delete(&a);
        assert!(outcome.removed);
        assert!(!outcome.active_changed);
        assert_eq!(store.active_id(), Some(&b));
    }

    #[test]
    fn test_delete_last_leaves_none_active() {
        let mut store = ConversationStore::new();
        let a = store.create();

        let outcome = store.delete(&a);
        assert!(outcome.active_changed);
        assert!(store.active_id().is_none());
        assert!(store.active().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut store = ConversationStore::new();
        store.create();
        assert_eq!(
            store.delete(&ConversationId::from("missing")),
            DeleteOutcome::default()
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_append_targets_named_conversation_only() {
        let mut store = ConversationStore::new();
        let a = store.create();
        let b = store.create();

        assert!(store.append_message(&a, Message::user("for a")));
        assert_eq!(store.get(&a).unwrap().messages().len(), 1);
        assert!(store.get(&b).unwrap().is_empty());
        assert_eq!(store.get(&a).unwrap().title(), "for a");
        assert_eq!(store.get(&b).unwrap().title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_append_to_unknown_conversation() {
        let mut store = ConversationStore::new();
        assert!(!store.append_message(&ConversationId::from("nope"), Message::user("x")));
    }

    #[test]
    fn test_update_and_finish_streaming_message() {
        let mut store = ConversationStore::new();
        let cid = store.create();
        let placeholder = Message::placeholder();
        let mid = placeholder.id().clone();
        store.append_message(&cid, placeholder);

        assert!(store.update_message(&cid, &mid, "partial"));
        assert!(store.update_message(&cid, &mid, "partial answer"));
        assert!(store.mark_finished(&cid, &mid));
        assert!(!store.update_message(&cid, &mid, "too late"));

        let msg = store.get(&cid).unwrap().message(&mid).unwrap();
        assert_eq!(msg.text(), "partial answer");
        assert!(!msg.is_streaming());
    }

    #[test]
    fn test_unresolved_message_mutations_are_noops() {
        let mut store = ConversationStore::new();
        let cid = store.create();
        let missing = MessageId::from("missing");
        assert!(!store.update_message(&cid, &missing, "x"));
        assert!(!store.mark_finished(&cid, &missing));
        assert!(!store.mark_finished(&ConversationId::from("c"), &missing));
    }

    #[test]
    fn test_clear() {
        let mut store = ConversationStore::new();
        store.create();
        store.create();
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.active_id().is_none());
    }

    #[test]
    fn test_snapshot_restore_finishes_streaming_messages() {
        let mut store = ConversationStore::new();
        let cid = store.create();
        store.append_message(&cid, Message::user("hi"));
        store.append_message(&cid, Message::placeholder());

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let snapshot: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let restored = ConversationStore::from_snapshot(snapshot);

        assert_eq!(restored.active_id(), Some(&cid));
        let conv = restored.active().unwrap();
        assert_eq!(conv.title(), "hi");
        assert!(conv.streaming_message().is_none());
    }

    #[test]
    fn test_restore_drops_dangling_active_id() {
        let snapshot = StoreSnapshot {
            conversations: Vec::new(),
            active: Some(ConversationId::from("gone")),
        };
        let store = ConversationStore::from_snapshot(snapshot);
        assert!(store.active_id().is_none());
    }
}
