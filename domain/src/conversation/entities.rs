//! Conversation domain entities

use crate::core::id::{ConversationId, MessageId};
use crate::core::string::truncate_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to a conversation before its first user message.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Titles keep at most this many characters of the first user message.
pub const TITLE_MAX_CHARS: usize = 50;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation (Entity)
///
/// Once `streaming` is false the message is frozen; while it is true the
/// orchestrator may replace `text` wholesale through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    author: Author,
    created_at: DateTime<Utc>,
    streaming: bool,
}

impl Message {
    fn new(text: impl Into<String>, author: Author, streaming: bool) -> Self {
        Self {
            id: MessageId::generate(),
            text: text.into(),
            author,
            created_at: Utc::now(),
            streaming,
        }
    }

    /// A finished user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Author::User, false)
    }

    /// A finished assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, Author::Assistant, false)
    }

    /// An empty assistant message that will be filled while streaming.
    pub fn placeholder() -> Self {
        Self::new(String::new(), Author::Assistant, true)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_from_user(&self) -> bool {
        self.author == Author::User
    }

    pub(crate) fn replace_text(&mut self, text: String) -> bool {
        if !self.streaming {
            return false;
        }
        self.text = text;
        true
    }

    pub(crate) fn finish(&mut self) {
        self.streaming = false;
    }
}

/// A conversation with the assistant (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    title: String,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: ConversationId::generate(),
            title: DEFAULT_TITLE.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The message currently being streamed into, if any.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming())
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(Message::is_from_user)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, deriving the title from the first user message.
    ///
    /// A new streaming message finalizes any message still streaming, so a
    /// conversation never holds two in-flight messages.
    pub(crate) fn push(&mut self, message: Message) {
        if message.is_from_user() && !self.has_user_message() {
            self.title = truncate_chars(message.text(), TITLE_MAX_CHARS);
        }
        if message.is_streaming() {
            for existing in self.messages.iter_mut().filter(|m| m.is_streaming()) {
                existing.finish();
            }
        }
        self.messages.push(message);
    }

    pub(crate) fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id() == id)
    }

    /// Finish every streaming message. Returns how many were open.
    pub(crate) fn finish_all(&mut self) -> usize {
        let mut count = 0;
        for message in self.messages.iter_mut().filter(|m| m.is_streaming()) {
            message.finish();
            count += 1;
        }
        count
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
