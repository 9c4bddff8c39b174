//! Persisted chat state.
//!
//! Conversations and the theme flag are stored as opaque strings under
//! fixed keys of a [`KeyValueStore`], loaded on startup and overwritten on
//! every mutation.

use crate::ports::key_value_store::{KeyValueStore, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};
use verinox_domain::{StoreSnapshot, Theme};

/// Key holding the serialized conversation list.
pub const CHATS_KEY: &str = "all-chats";

/// Key holding the theme flag.
pub const THEME_KEY: &str = "themeColor";

/// Reads and writes chat state through a key-value port.
#[derive(Clone)]
pub struct ChatStateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ChatStateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the saved conversations.
    ///
    /// Missing or unreadable state yields an empty snapshot; the problem is
    /// logged, never surfaced to the chat.
    pub fn load_conversations(&self) -> StoreSnapshot {
        match self.try_load_conversations() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding saved conversations: {}", e);
                StoreSnapshot::default()
            }
        }
    }

    fn try_load_conversations(&self) -> Result<StoreSnapshot, StorageError> {
        let Some(raw) = self.store.get(CHATS_KEY)? else {
            return Ok(StoreSnapshot::default());
        };
        let snapshot: StoreSnapshot =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        debug!(
            "Loaded {} saved conversations",
            snapshot.conversations.len()
        );
        Ok(snapshot)
    }

    pub fn save_conversations(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(snapshot).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.store.set(CHATS_KEY, &raw)
    }

    /// Forget every saved conversation.
    pub fn clear_conversations(&self) -> Result<(), StorageError> {
        self.store.remove(CHATS_KEY)
    }

    pub fn load_theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(raw)) => Theme::from_stored(&raw),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Could not read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.store.set(THEME_KEY, theme.as_str())
    }
}
