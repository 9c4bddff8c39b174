//! OpenAI chat-completions adapter
//!
//! Streams replies from `POST /v1/chat/completions` and exposes them through
//! the [`CompletionBackend`](verinox_application::CompletionBackend) port.

pub mod backend;
pub mod error;
pub mod sse;

pub use backend::{OpenAiBackend, OpenAiSettings};
pub use error::OpenAiError;
