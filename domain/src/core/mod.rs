//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: the remote chat model to talk to
//! - [`input::UserInput`]: validated text submitted by the user
//! - [`id::ConversationId`] / [`id::MessageId`]: opaque identifiers
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod id;
pub mod input;
pub mod model;
pub mod string;
