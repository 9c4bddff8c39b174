//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_orchestrator;
pub mod chat_state;
pub mod gateway_client;

#[cfg(test)]
pub(crate) mod test_support;
