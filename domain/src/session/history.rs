//! Role-tagged message log used as model context.
//!
//! This is deliberately separate from [`Conversation`](crate::conversation::Conversation):
//! the history is what the remote model sees, the conversation is what the
//! user sees. They are reconciled only through [`GatewayHistory::restore`].

use crate::conversation::{Author, Message};
use serde::{Deserialize, Serialize};

/// Role of an entry in the model context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl From<Author> for Role {
    fn from(author: Author) -> Self {
        match author {
            Author::User => Role::User,
            Author::Assistant => Role::Assistant,
        }
    }
}

/// One entry of the model context (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Linear context log: a fixed system instruction followed by turns.
///
/// Every [`reset`](Self::reset) or [`restore`](Self::restore) bumps the
/// generation so that a stream opened against an older history can tell
/// its result no longer belongs here.
#[derive(Debug, Clone)]
pub struct GatewayHistory {
    entries: Vec<HistoryEntry>,
    generation: u64,
}

impl GatewayHistory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::system(system_prompt)],
            generation: 0,
        }
    }

    /// All entries, system instruction first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entries after the system instruction.
    pub fn turns(&self) -> &[HistoryEntry] {
        &self.entries[1..]
    }

    pub fn system_prompt(&self) -> &str {
        &self.entries[0].content
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.entries.push(HistoryEntry::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.entries.push(HistoryEntry::assistant(content));
    }

    /// Truncate back to the system instruction.
    pub fn reset(&mut self) {
        self.entries.truncate(1);
        self.generation += 1;
    }

    /// Reset, then replay the finished, non-empty messages of a conversation.
    pub fn restore<'a>(&mut self, messages: impl IntoIterator<Item = &'a Message>) {
        self.reset();
        for message in messages {
            if message.is_streaming() || message.text().is_empty() {
                continue;
            }
            self.entries.push(HistoryEntry {
                role: message.author().into(),
                content: message.text().to_string(),
            });
        }
    }
}
