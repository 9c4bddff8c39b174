//! Interactive chat module
//!
//! Provides a readline-based chat interface plus the one-shot `ask` mode.

pub mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::ChatRepl;
