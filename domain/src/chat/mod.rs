//! Chat exchange domain.
//!
//! - [`state::ExchangeState`]: lifecycle of one request/response exchange
//! - [`state::ChatFlags`]: the shared "typing" / "streaming" flags

pub mod state;

pub use state::{ChatFlags, ExchangeState};
