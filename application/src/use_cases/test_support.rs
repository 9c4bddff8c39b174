//! Scripted backend and recording observer shared by use case tests.

use crate::ports::chat_observer::ChatObserver;
use crate::ports::llm_gateway::{CompletionBackend, CompletionRequest, GatewayError, StreamHandle};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use verinox_domain::{ConversationId, ExchangeState, Message, StreamEvent};

/// What the backend does for one request.
pub(crate) enum Script {
    /// Send these events, then close the channel.
    Events(Vec<StreamEvent>),
    /// Send these deltas, then keep the channel open until cancelled.
    Hold(Vec<&'static str>),
    /// Refuse the request.
    Fail(GatewayError),
    /// Never answer; give up only once cancelled.
    Stall,
}

impl Script {
    /// Deltas followed by a `Completed` with their concatenation.
    pub(crate) fn reply(fragments: &[&str]) -> Self {
        let mut events: Vec<StreamEvent> = fragments
            .iter()
            .map(|f| StreamEvent::Delta(f.to_string()))
            .collect();
        events.push(StreamEvent::Completed(fragments.concat()));
        Script::Events(events)
    }
}

pub(crate) struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::reply(&["(default response)"]));

        let (tx, rx) = mpsc::channel(64);
        match script {
            Script::Fail(err) => return Err(err),
            Script::Stall => {
                cancellation.cancelled().await;
                return Err(GatewayError::Cancelled);
            }
            Script::Events(events) => {
                for event in events {
                    tx.send(event).await.unwrap();
                }
            }
            Script::Hold(fragments) => {
                for fragment in fragments {
                    tx.send(StreamEvent::Delta(fragment.to_string()))
                        .await
                        .unwrap();
                }
                tokio::spawn(async move {
                    cancellation.cancelled().await;
                    drop(tx);
                });
            }
        }
        Ok(StreamHandle::new(rx))
    }
}

/// Records every callback; optionally fires a stop token after N updates.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub(crate) typing: Mutex<Vec<bool>>,
    pub(crate) appended: Mutex<Vec<Message>>,
    pub(crate) updates: Mutex<Vec<String>>,
    pub(crate) finished: Mutex<Vec<ExchangeState>>,
    stop_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl RecordingObserver {
    pub(crate) fn stopping_after(updates: usize, stop: CancellationToken) -> Self {
        Self {
            stop_after: Mutex::new(Some((updates, stop))),
            ..Self::default()
        }
    }
}

impl ChatObserver for RecordingObserver {
    fn on_typing_changed(&self, typing: bool) {
        self.typing.lock().unwrap().push(typing);
    }

    fn on_message_appended(&self, _conversation: &ConversationId, message: &Message) {
        self.appended.lock().unwrap().push(message.clone());
    }

    fn on_message_updated(&self, _conversation: &ConversationId, message: &Message) {
        let mut updates = self.updates.lock().unwrap();
        updates.push(message.text().to_string());
        if let Some((limit, stop)) = self.stop_after.lock().unwrap().as_ref()
            && updates.len() >= *limit
        {
            stop.cancel();
        }
    }

    fn on_exchange_finished(&self, state: ExchangeState) {
        self.finished.lock().unwrap().push(state);
    }
}
