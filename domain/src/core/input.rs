//! User input value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Text submitted by the user (Value Object)
///
/// Always trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    content: String,
}

impl UserInput {
    /// Validate and trim raw input.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyInput);
        }
        Ok(Self {
            content: trimmed.to_string(),
        })
    }

    /// Get the input content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
