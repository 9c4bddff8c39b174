//! Exchange state machine.
//!
//! ```text
//! Idle ──send──▶ AwaitingFirstToken ──first fragment──▶ Streaming ──end──▶ Finalized
//!                      │                                    │
//!                      ├──────────── stop ──────────────────┴──▶ Cancelled
//!                      └──────────── failure ───────────────────▶ Failed
//! ```
//!
//! `Streaming` can also fail. Terminal states go back to accepting a new
//! exchange, exactly like `Idle`.

use serde::{Deserialize, Serialize};

/// Lifecycle of a single outgoing exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    #[default]
    Idle,
    AwaitingFirstToken,
    Streaming,
    Finalized,
    Cancelled,
    Failed,
}

impl ExchangeState {
    /// A request is open and no new exchange may start.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ExchangeState::AwaitingFirstToken | ExchangeState::Streaming
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeState::Finalized | ExchangeState::Cancelled | ExchangeState::Failed
        )
    }

    /// Whether moving to `next` is a legal edge of the state machine.
    pub fn can_transition_to(&self, next: ExchangeState) -> bool {
        use ExchangeState::*;
        match (self, next) {
            (Idle | Finalized | Cancelled | Failed, AwaitingFirstToken) => true,
            (AwaitingFirstToken, Streaming) => true,
            (AwaitingFirstToken | Streaming, Finalized | Cancelled | Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::AwaitingFirstToken => "awaiting_first_token",
            ExchangeState::Streaming => "streaming",
            ExchangeState::Finalized => "finalized",
            ExchangeState::Cancelled => "cancelled",
            ExchangeState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags the presentation layer checks before dispatching a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChatFlags {
    /// Waiting for the first fragment of a reply.
    pub typing: bool,
    /// A reply is open (placeholder present, stream not finished).
    pub streaming: bool,
}

impl ChatFlags {
    pub fn is_busy(&self) -> bool {
        self.typing || self.streaming
    }

    pub fn clear(&mut self) {
        self.typing = false;
        self.streaming = false;
    }
}
