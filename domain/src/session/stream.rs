//! What a completion backend hands back, one event at a time.

/// One event of a streamed reply.
///
/// A stream is any number of `Delta`s followed by exactly one terminal
/// event. `Completed` carries the whole reply so that backends which do not
/// stream can still satisfy the contract with a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Completed(String),
    Error(String),
}

impl StreamEvent {
    /// Nothing follows a terminal event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Delta(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deltas_continue_the_stream() {
        assert!(!StreamEvent::Delta(String::new()).is_terminal());
        assert!(StreamEvent::Completed("Hi".to_string()).is_terminal());
        assert!(StreamEvent::Error("reset".to_string()).is_terminal());
    }
}
