//! Chat orchestrator.
//!
//! Coordinates one request/response exchange at a time between the
//! presentation layer, the [`GatewayClient`] and the [`ConversationStore`]:
//!
//! 1. [`send_message`](ChatOrchestrator::send_message) appends the user
//!    message and an empty streaming placeholder, then opens the stream
//! 2. [`on_fragment`](ChatOrchestrator::on_fragment) grows the placeholder
//! 3. [`finish_stream`](ChatOrchestrator::finish_stream),
//!    [`stop_streaming`](ChatOrchestrator::stop_streaming) or
//!    [`fail`](ChatOrchestrator::fail) end it
//!
//! [`run_exchange`](ChatOrchestrator::run_exchange) drives all three steps
//! for callers that just want to hand over text and a stop signal.
//!
//! The presentation layer is expected to check [`ChatFlags::is_busy`] before
//! dispatching a message. The orchestrator re-checks it, so a message sent
//! while another exchange is open is ignored either way.

use crate::config::ChatConfig;
use crate::ports::chat_observer::{ChatObserver, NoChatObserver};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::GatewayError;
use crate::use_cases::chat_state::ChatStateRepository;
use crate::use_cases::gateway_client::{GatewayClient, TokenStream};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verinox_domain::core::string::preview;
use verinox_domain::{
    ChatFlags, Conversation, ConversationId, ConversationStore, DeleteOutcome, DomainError,
    ExchangeState, Message, MessageId, Model, UserInput,
};

/// Result of [`ChatOrchestrator::send_message`].
pub enum SendOutcome {
    /// The request is open; feed its fragments back through the orchestrator.
    Started(TokenStream),
    /// Nothing happened (empty input, or an exchange is already open).
    Ignored(DomainError),
    /// The request could not be opened; an error notice was appended.
    Failed,
}

/// Bookkeeping for the exchange currently in flight.
struct InFlight {
    conversation_id: ConversationId,
    message_id: MessageId,
    accumulated: String,
    cancellation: CancellationToken,
    started: Instant,
}

/// Bridges presentation events to the gateway and the conversation store.
pub struct ChatOrchestrator {
    store: ConversationStore,
    gateway: GatewayClient,
    config: ChatConfig,
    flags: ChatFlags,
    state: ExchangeState,
    in_flight: Option<InFlight>,
    observer: Arc<dyn ChatObserver>,
    logger: Arc<dyn ConversationLogger>,
    repository: Option<ChatStateRepository>,
}

impl ChatOrchestrator {
    pub fn new(gateway: GatewayClient, config: ChatConfig) -> Self {
        Self {
            store: ConversationStore::new(),
            gateway,
            config,
            flags: ChatFlags::default(),
            state: ExchangeState::Idle,
            in_flight: None,
            observer: Arc::new(NoChatObserver),
            logger: Arc::new(NoConversationLogger),
            repository: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Persist conversations through `repository`, loading what it holds.
    pub fn with_repository(mut self, repository: ChatStateRepository) -> Self {
        self.store = ConversationStore::from_snapshot(repository.load_conversations());
        if let Some(active) = self.store.active() {
            info!(
                "Resuming conversation '{}' ({} messages)",
                active.title(),
                active.messages().len()
            );
            if self.config.restore_context_on_select {
                self.gateway.restore(active.messages());
            }
        }
        self.repository = Some(repository);
        self
    }

    // ==================== Accessors ====================

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.store.active()
    }

    pub fn flags(&self) -> ChatFlags {
        self.flags
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn model(&self) -> &Model {
        self.gateway.model()
    }

    pub fn set_model(&mut self, model: Model) {
        self.gateway.set_model(model);
    }

    // ==================== Conversation management ====================

    /// Create a conversation if there are none.
    pub fn initialize(&mut self) {
        if self.store.is_empty() {
            self.new_conversation();
        }
    }

    /// Create and activate a fresh conversation; the model starts over.
    pub fn new_conversation(&mut self) -> ConversationId {
        let id = self.store.create();
        self.gateway.reset();
        info!("Created conversation {}", id);
        self.persist();
        id
    }

    /// Activate a conversation. Unknown ids are ignored.
    pub fn select_conversation(&mut self, id: &ConversationId) -> bool {
        if !self.store.select(id) {
            debug!("Ignoring select of unknown conversation {}", id);
            return false;
        }
        if self.config.restore_context_on_select
            && let Some(conversation) = self.store.get(id)
        {
            self.gateway.restore(conversation.messages());
        }
        self.persist();
        true
    }

    /// Delete a conversation, stopping its exchange first if one is open.
    ///
    /// When the active conversation goes away the gateway history is reset,
    /// whether or not another conversation takes its place.
    pub fn delete_conversation(&mut self, id: &ConversationId) -> DeleteOutcome {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| &f.conversation_id == id)
        {
            self.stop_streaming();
        }

        let outcome = self.store.delete(id);
        if outcome.active_changed {
            self.gateway.reset();
        }
        if outcome.removed {
            info!("Deleted conversation {}", id);
            self.persist();
        }
        outcome
    }

    /// Delete every conversation.
    pub fn clear_conversations(&mut self) -> usize {
        self.stop_streaming();
        let removed = self.store.clear();
        self.gateway.reset();
        if let Some(repository) = &self.repository
            && let Err(e) = repository.clear_conversations()
        {
            warn!("Could not clear saved conversations: {}", e);
        }
        info!("Cleared {} conversations", removed);
        removed
    }

    // ==================== Exchange lifecycle ====================

    /// Start an exchange for `text`.
    ///
    /// Empty input and input arriving while another exchange is open are
    /// ignored without any visible effect.
    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        self.start(text, CancellationToken::new()).await
    }

    /// [`send_message`](Self::send_message) with the request bound to
    /// `cancellation`, so firing it also aborts a connection still being
    /// opened.
    async fn start(&mut self, text: &str, cancellation: CancellationToken) -> SendOutcome {
        let input = match UserInput::parse(text) {
            Ok(input) => input,
            Err(e) => return SendOutcome::Ignored(e),
        };
        if self.state.is_in_flight() || self.flags.is_busy() {
            debug!("Ignoring message while exchange is {}", self.state);
            return SendOutcome::Ignored(DomainError::ExchangeInFlight);
        }

        let conversation_id = match self.store.active_id() {
            Some(id) => id.clone(),
            None => self.new_conversation(),
        };

        self.append(&conversation_id, Message::user(input.content()));
        self.logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "conversation_id": conversation_id.as_str(),
                "model": self.gateway.model().as_str(),
                "text": input.content(),
            }),
        ));

        self.transition(ExchangeState::AwaitingFirstToken);
        self.flags.typing = true;
        self.flags.streaming = true;
        self.observer.on_typing_changed(true);

        let placeholder = Message::placeholder();
        let message_id = placeholder.id().clone();
        self.append(&conversation_id, placeholder);
        self.persist();

        self.in_flight = Some(InFlight {
            conversation_id,
            message_id,
            accumulated: String::new(),
            cancellation: cancellation.clone(),
            started: Instant::now(),
        });

        match self.gateway.send(input.content(), cancellation).await {
            Ok(stream) => SendOutcome::Started(stream),
            Err(e) => {
                self.fail(e);
                SendOutcome::Failed
            }
        }
    }

    /// Apply one fragment to the in-flight message.
    ///
    /// The store always receives the full accumulated text. Fragments that
    /// arrive after cancellation, or with nothing in flight, are dropped.
    pub fn on_fragment(&mut self, fragment: &str) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        if in_flight.cancellation.is_cancelled() {
            return;
        }

        in_flight.accumulated.push_str(fragment);
        let conversation_id = in_flight.conversation_id.clone();
        let message_id = in_flight.message_id.clone();
        let text = in_flight.accumulated.clone();

        if self.state == ExchangeState::AwaitingFirstToken {
            self.transition(ExchangeState::Streaming);
            self.flags.typing = false;
            self.observer.on_typing_changed(false);
        }

        if self
            .store
            .update_message(&conversation_id, &message_id, text)
        {
            self.notify_updated(&conversation_id, &message_id);
        }
    }

    /// The stream ended naturally.
    pub fn finish_stream(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        self.close(in_flight, ExchangeState::Finalized);
    }

    /// Abort the open exchange, keeping whatever text has arrived.
    ///
    /// Flags are cleared even when nothing is in flight.
    pub fn stop_streaming(&mut self) {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.cancellation.cancel();
                info!(
                    "Exchange cancelled after {} bytes",
                    in_flight.accumulated.len()
                );
                self.close(in_flight, ExchangeState::Cancelled);
            }
            None => self.clear_flags(),
        }
    }

    /// End the open exchange with a failure notice.
    ///
    /// The raw error goes to the log; the transcript only receives the
    /// user-facing notice for its kind.
    pub fn fail(&mut self, error: GatewayError) {
        if error == GatewayError::Cancelled {
            self.stop_streaming();
            return;
        }
        warn!("Exchange failed: {}", error);

        let conversation_id = match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.cancellation.cancel();
                let conversation_id = in_flight.conversation_id.clone();
                self.close(in_flight, ExchangeState::Failed);
                conversation_id
            }
            None => {
                self.clear_flags();
                match self.store.active_id() {
                    Some(id) => id.clone(),
                    None => return,
                }
            }
        };

        self.logger.log(ConversationEvent::new(
            "exchange_failed",
            serde_json::json!({
                "conversation_id": conversation_id.as_str(),
                "kind": error.kind(),
                "error": error.to_string(),
            }),
        ));
        self.append(&conversation_id, Message::assistant(error.user_message()));
        self.persist();
    }

    /// Send `text` and pump its stream until it ends, fails, or `stop` fires.
    ///
    /// Returns the terminal state of the exchange, or the reason the message
    /// was ignored.
    pub async fn run_exchange(
        &mut self,
        text: &str,
        stop: &CancellationToken,
    ) -> Result<ExchangeState, DomainError> {
        let mut stream = match self.start(text, stop.child_token()).await {
            SendOutcome::Started(stream) => stream,
            SendOutcome::Ignored(reason) => return Err(reason),
            SendOutcome::Failed => return Ok(self.state),
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    self.stop_streaming();
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => self.on_fragment(&fragment),
                Some(Err(e)) => {
                    self.fail(e);
                    break;
                }
                None => {
                    self.finish_stream();
                    break;
                }
            }
        }

        Ok(self.state)
    }

    // ==================== Internals ====================

    /// Finalize the in-flight message and enter a terminal state.
    fn close(&mut self, in_flight: InFlight, terminal: ExchangeState) {
        let InFlight {
            conversation_id,
            message_id,
            accumulated,
            started,
            ..
        } = in_flight;

        if self.store.mark_finished(&conversation_id, &message_id) {
            self.notify_updated(&conversation_id, &message_id);
        }
        self.transition(terminal);
        self.clear_flags();

        let elapsed = started.elapsed();
        debug!(
            "Exchange {} in {:?}: {}",
            terminal,
            elapsed,
            preview(&accumulated, 80)
        );
        if terminal != ExchangeState::Failed {
            self.logger.log(ConversationEvent::new(
                "assistant_response",
                serde_json::json!({
                    "conversation_id": conversation_id.as_str(),
                    "message_id": message_id.as_str(),
                    "model": self.gateway.model().as_str(),
                    "state": terminal.as_str(),
                    "bytes": accumulated.len(),
                    "duration_ms": elapsed.as_millis() as u64,
                    "text": accumulated,
                }),
            ));
        }

        self.observer.on_exchange_finished(terminal);
        self.persist();
    }

    fn clear_flags(&mut self) {
        let was_typing = self.flags.typing;
        self.flags.clear();
        if was_typing {
            self.observer.on_typing_changed(false);
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected exchange transition {} -> {}", self.state, next);
        }
        debug!("Exchange state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn append(&mut self, conversation_id: &ConversationId, message: Message) {
        let appended = message.clone();
        if self.store.append_message(conversation_id, message) {
            self.observer.on_message_appended(conversation_id, &appended);
        }
    }

    fn notify_updated(&self, conversation_id: &ConversationId, message_id: &MessageId) {
        if let Some(message) = self
            .store
            .get(conversation_id)
            .and_then(|c| c.message(message_id))
        {
            self.observer.on_message_updated(conversation_id, message);
        }
    }

    fn persist(&self) {
        if let Some(repository) = &self.repository
            && let Err(e) = repository.save_conversations(&self.store.snapshot())
        {
            warn!("Could not save conversations: {}", e);
        }
    }
}
