//! Streaming chat-completions backend over HTTP.
//!
//! Implements the [`CompletionBackend`] port: one POST per exchange with
//! `stream: true`, the body decoded by a spawned reader task that forwards
//! [`StreamEvent`]s over a bounded channel.

use super::error::OpenAiError;
use super::sse::SseDecoder;
use crate::config::FileOpenAiConfig;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verinox_application::{CompletionBackend, CompletionRequest, GatewayError, StreamHandle};
use verinox_domain::core::string::preview;
use verinox_domain::{HistoryEntry, StreamEvent};

const STREAM_CHANNEL_CAPACITY: usize = 64;
const ERROR_BODY_PREVIEW: usize = 200;

/// Resolved connection settings.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    /// Env var the key was looked up in, for error messages.
    pub api_key_env: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl OpenAiSettings {
    /// Resolve settings from the `[providers.openai]` section.
    ///
    /// An explicit `api_key` wins over the environment variable. Empty
    /// values count as missing.
    pub fn from_config(config: &FileOpenAiConfig) -> Self {
        let usable = |key: &String| !key.trim().is_empty();
        let api_key = config.api_key.clone().filter(usable).or_else(|| {
            std::env::var(&config.api_key_env)
                .ok()
                .filter(usable)
        });

        Self {
            api_key,
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Request body of `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [HistoryEntry],
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

/// [`CompletionBackend`] for OpenAI-compatible chat-completions APIs.
pub struct OpenAiBackend {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiBackend {
    pub fn new(settings: OpenAiSettings) -> Result<Self, OpenAiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(settings.timeout)
            .build()
            .map_err(|e| OpenAiError::Client(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn open(&self, request: &CompletionRequest) -> Result<Response, OpenAiError> {
        let api_key =
            self.settings
                .api_key
                .as_deref()
                .ok_or_else(|| OpenAiError::MissingApiKey {
                    env: self.settings.api_key_env.clone(),
                })?;

        let body = ChatCompletionBody {
            model: request.model.as_str(),
            messages: &request.messages,
            stream: true,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        info!(
            "Chat completion request to {} model={} messages={}",
            self.settings.endpoint(),
            body.model,
            body.messages.len()
        );

        let response = self
            .client
            .post(self.settings.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Chat completion failed with {}: {}", status, preview(&text, 500));
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body: preview(&text, ERROR_BODY_PREVIEW).to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
        cancellation: CancellationToken,
    ) -> Result<StreamHandle, GatewayError> {
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(GatewayError::Cancelled),
            response = self.open(&request) => response?,
        };

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(read_event_stream(response, tx, cancellation));
        Ok(StreamHandle::new(rx))
    }
}

/// Decode the response body into events until it ends, the request is
/// cancelled, or the receiver goes away. Dropping the response aborts the
/// HTTP transfer.
async fn read_event_stream(
    response: Response,
    tx: mpsc::Sender<StreamEvent>,
    cancellation: CancellationToken,
) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let next = tokio::select! {
            _ = cancellation.cancelled() => {
                debug!("Completion stream cancelled");
                return;
            }
            _ = tx.closed() => {
                debug!("Completion stream receiver dropped");
                return;
            }
            next = body.next() => next,
        };

        let events = match next {
            Some(Ok(bytes)) => decoder.feed(&bytes),
            Some(Err(e)) => vec![StreamEvent::Error(OpenAiError::Http(e).to_string())],
            None => decoder.finish(),
        };

        for event in events {
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() || terminal {
                return;
            }
        }

        if decoder.is_done() {
            return;
        }
    }
}
