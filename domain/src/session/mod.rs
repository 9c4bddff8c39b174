//! Gateway session domain.
//!
//! - [`history::GatewayHistory`]: the role-tagged context sent to the model
//! - [`stream::StreamEvent`]: typed events of a streaming completion

pub mod history;
pub mod stream;

pub use history::{GatewayHistory, HistoryEntry, Role};
pub use stream::StreamEvent;
