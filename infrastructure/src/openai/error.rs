//! Error types for the OpenAI adapter

use thiserror::Error;
use verinox_application::GatewayError;

/// Errors that can occur when talking to the chat-completions API
#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("API key not configured (set {env} or providers.openai.api_key)")]
    MissingApiKey { env: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API reported an error: {0}")]
    Api(String),

    #[error("Malformed stream chunk: {0}")]
    MalformedChunk(String),

    #[error("Stream ended before [DONE] after {0} bytes of content")]
    Truncated(usize),
}

impl From<OpenAiError> for GatewayError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::MissingApiKey { .. } | OpenAiError::Client(_) => {
                GatewayError::Configuration(err.to_string())
            }
            // Bad credentials are a configuration problem, not a transient one
            OpenAiError::Status { status: 401, .. } => GatewayError::Configuration(err.to_string()),
            _ => GatewayError::Upstream(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_maps_to_configuration() {
        let err: GatewayError = OpenAiError::MissingApiKey {
            env: "OPENAI_API_KEY".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::Configuration(ref m) if m.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_status_errors_map_by_code() {
        let unauthorized: GatewayError = OpenAiError::Status {
            status: 401,
            body: "invalid key".to_string(),
        }
        .into();
        assert!(matches!(unauthorized, GatewayError::Configuration(_)));

        let server: GatewayError = OpenAiError::Status {
            status: 500,
            body: "oops".to_string(),
        }
        .into();
        assert_eq!(
            server,
            GatewayError::Upstream("API error 500: oops".to_string())
        );
    }
}
