//! Model gateway client.
//!
//! Holds the [`GatewayHistory`] for the active conversation and turns each
//! user message into a single-pass [`TokenStream`] of text fragments.

use crate::ports::llm_gateway::{CompletionBackend, CompletionRequest, GatewayError, StreamHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use verinox_domain::{GatewayHistory, HistoryEntry, Message, Model, StreamEvent};

/// Client-side view of the remote model: context log plus transport.
pub struct GatewayClient {
    backend: Arc<dyn CompletionBackend>,
    history: Arc<Mutex<GatewayHistory>>,
    model: Model,
}

impl GatewayClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        model: Model,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            history: Arc::new(Mutex::new(GatewayHistory::new(system_prompt))),
            model,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn set_model(&mut self, model: Model) {
        info!("Switching model: {} -> {}", self.model, model);
        self.model = model;
    }

    /// Append `user_text` to the history and open a streaming request with
    /// the full history as context.
    ///
    /// The returned stream is one-shot. Once it has been read to the end,
    /// the concatenated reply is appended to the history as an assistant
    /// entry. Cancelling `cancellation` aborts the underlying request.
    pub async fn send(
        &self,
        user_text: &str,
        cancellation: CancellationToken,
    ) -> Result<TokenStream, GatewayError> {
        let (messages, generation) = {
            let mut history = self.lock_history();
            history.push_user(user_text);
            (history.entries().to_vec(), history.generation())
        };

        debug!(
            "Sending {} history entries to {}",
            messages.len(),
            self.model
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
        };
        let handle = self
            .backend
            .stream_completion(request, cancellation.clone())
            .await?;

        Ok(TokenStream {
            handle,
            history: Arc::clone(&self.history),
            generation,
            accumulated: String::new(),
            cancellation,
            finished: false,
        })
    }

    /// Truncate the history back to the system instruction.
    pub fn reset(&self) {
        debug!("Resetting gateway history");
        self.lock_history().reset();
    }

    /// Replace the history with the finished messages of a conversation.
    pub fn restore(&self, messages: &[Message]) {
        let mut history = self.lock_history();
        history.restore(messages);
        debug!("Restored gateway history with {} turns", history.turns().len());
    }

    /// Copy of the current history entries, system instruction first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().entries().to_vec()
    }

    fn lock_history(&self) -> MutexGuard<'_, GatewayHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lazy, single-pass, cancellable sequence of text fragments.
pub struct TokenStream {
    handle: StreamHandle,
    history: Arc<Mutex<GatewayHistory>>,
    generation: u64,
    accumulated: String,
    cancellation: CancellationToken,
    finished: bool,
}

impl TokenStream {
    /// Next text fragment.
    ///
    /// Returns `None` at the natural end of the reply and once cancellation
    /// has been observed; nothing is yielded after either.
    pub async fn next(&mut self) -> Option<Result<String, GatewayError>> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancellation.is_cancelled() {
                self.finished = true;
                return None;
            }

            match self.handle.recv().await {
                Some(StreamEvent::Delta(chunk)) => {
                    if self.cancellation.is_cancelled() {
                        continue;
                    }
                    if chunk.is_empty() {
                        continue;
                    }
                    self.accumulated.push_str(&chunk);
                    return Some(Ok(chunk));
                }
                Some(StreamEvent::Completed(text)) => {
                    if self.cancellation.is_cancelled() {
                        continue;
                    }
                    // Backends that never sent deltas deliver the whole reply here
                    let tail = if self.accumulated.is_empty() && !text.is_empty() {
                        self.accumulated = text.clone();
                        Some(text)
                    } else {
                        None
                    };
                    self.commit();
                    return tail.map(Ok);
                }
                Some(StreamEvent::Error(message)) => {
                    self.finished = true;
                    return Some(Err(GatewayError::Upstream(message)));
                }
                None => {
                    self.finished = true;
                    if self.cancellation.is_cancelled() {
                        return None;
                    }
                    return Some(Err(GatewayError::Upstream(
                        "stream closed before completion".to_string(),
                    )));
                }
            }
        }
    }

    /// Abort the request. Already-buffered fragments are discarded.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Text yielded so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    fn commit(&mut self) {
        self.finished = true;
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.generation() == self.generation {
            history.push_assistant(self.accumulated.clone());
        } else {
            debug!("History changed while streaming; reply not recorded");
        }
    }
}
