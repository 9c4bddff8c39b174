//! Completion backend port
//!
//! Defines the interface for streaming chat completions from a remote model.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use verinox_domain::{HistoryEntry, Model, StreamEvent};

/// User-facing text for a missing or invalid credential.
pub const CONFIGURATION_NOTICE: &str =
    "The assistant is not configured yet. Please add an API key and try again.";

/// User-facing text for any transport or API failure.
pub const UPSTREAM_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No usable credential is configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network, HTTP or protocol failure reported by the remote side.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Text safe to show in the transcript. Never contains raw error detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => CONFIGURATION_NOTICE,
            GatewayError::Upstream(_) | GatewayError::Cancelled => UPSTREAM_NOTICE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => "configuration",
            GatewayError::Upstream(_) => "upstream",
            GatewayError::Cancelled => "cancelled",
        }
    }
}

/// A single streaming completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: Model,
    /// Full context, system instruction first.
    pub messages: Vec<HistoryEntry>,
}

/// Handle for receiving streaming events from a backend.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`; the sending half lives in the
/// backend's reader task.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event, or `None` once the sender is gone.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Remote chat-completion service.
///
/// Implementations (adapters) live in the infrastructure layer. They must
/// stop reading and drop the sender as soon as `cancellation` fires.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError>;
}
