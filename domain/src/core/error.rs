//! Domain error types

use thiserror::Error;

/// Why a message was not sent. Both cases are silent in the chat flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Submitted text was empty after trimming.
    #[error("Input cannot be empty")]
    EmptyInput,

    #[error("An exchange is already in flight")]
    ExchangeInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(DomainError::EmptyInput.to_string(), "Input cannot be empty");
        assert_eq!(
            DomainError::ExchangeInFlight.to_string(),
            "An exchange is already in flight"
        );
    }
}
