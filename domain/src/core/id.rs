//! Opaque identifiers for conversations and messages.
//!
//! An id is `<millis>-<sequence>-<suffix>`: wall-clock milliseconds, a
//! process-wide counter, and six random base-36 characters. The counter
//! alone makes ids unique within a process; the suffix keeps ids from
//! separate runs apart in persisted state.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_token() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{millis}-{seq}-{suffix}")
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier.
            pub fn generate() -> Self {
                Self(next_token())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

opaque_id!(
    /// Identifies a [`Conversation`](crate::conversation::Conversation).
    ConversationId
);

opaque_id!(
    /// Identifies a [`Message`](crate::conversation::Message) within its conversation.
    MessageId
);
