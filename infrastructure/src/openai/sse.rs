//! Server-sent event decoding for streamed chat completions.
//!
//! The body arrives as arbitrary byte chunks. [`SseDecoder`] buffers them
//! until a full line is available, so multi-byte characters split across
//! chunks survive, then turns each `data:` line into [`StreamEvent`]s.

use super::error::OpenAiError;
use serde_json::Value;
use verinox_domain::StreamEvent;

/// Classification of one `data:` payload.
#[derive(Debug, PartialEq, Eq)]
pub enum SseData {
    /// A non-empty content delta.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
    /// An API error object inside the stream.
    Error(String),
    /// Role preambles, finish markers, empty deltas.
    Ignored,
}

/// Parse the payload of a single `data:` line.
pub fn parse_data(data: &str) -> Result<SseData, OpenAiError> {
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|e| OpenAiError::MalformedChunk(format!("{}: {}", e, data)))?;

    if let Some(error) = value.get("error") {
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Ok(SseData::Error(message));
    }

    let content = value["choices"]
        .get(0)
        .and_then(|choice| choice["delta"]["content"].as_str());
    match content {
        Some(text) if !text.is_empty() => Ok(SseData::Delta(text.to_string())),
        _ => Ok(SseData::Ignored),
    }
}

/// Incremental decoder from body bytes to stream events.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal event has been produced; further input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of the body, returning the events completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// The body ended. Flushes a trailing unterminated line; a body that
    /// stops before `[DONE]` is reported as an error, not a finished reply.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        let rest = std::mem::take(&mut self.buffer);
        if let Some(event) = self.decode_line(&rest) {
            events.push(event);
        }
        if !self.done {
            self.done = true;
            let received = std::mem::take(&mut self.text).len();
            events.push(StreamEvent::Error(
                OpenAiError::Truncated(received).to_string(),
            ));
        }
        events
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        // Comments (": keep-alive"), event names and blank separators
        let data = line.strip_prefix("data:")?.trim_start();

        let event = match parse_data(data) {
            Ok(SseData::Delta(text)) => {
                self.text.push_str(&text);
                StreamEvent::Delta(text)
            }
            Ok(SseData::Done) => StreamEvent::Completed(std::mem::take(&mut self.text)),
            Ok(SseData::Error(message)) => StreamEvent::Error(OpenAiError::Api(message).to_string()),
            Ok(SseData::Ignored) => return None,
            Err(e) => StreamEvent::Error(e.to_string()),
        };
        self.done = event.is_terminal();
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(content).unwrap()
        )
    }

    #[test]
    fn test_parse_data_variants() {
        assert_eq!(parse_data("[DONE]").unwrap(), SseData::Done);
        assert_eq!(
            parse_data(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap(),
            SseData::Delta("Hi".to_string())
        );
        assert_eq!(
            parse_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseData::Ignored
        );
        assert_eq!(
            parse_data(r#"{"choices":[{"delta":{"content":""},"finish_reason":"stop"}]}"#)
                .unwrap(),
            SseData::Ignored
        );
        assert_eq!(
            parse_data(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
                .unwrap(),
            SseData::Error("Rate limit reached".to_string())
        );
        assert!(matches!(
            parse_data("{not json"),
            Err(OpenAiError::MalformedChunk(_))
        ));
    }

    #[test]
    fn test_decoder_full_stream() {
        let mut decoder = SseDecoder::new();
        let body = format!(
            "data: {{\"choices\":[{{\"delta\":{{\"role\":\"assistant\"}}}}]}}\n\n{}{}data: [DONE]\n\n",
            chunk("Hello"),
            chunk(", world")
        );

        let events = decoder.feed(body.as_bytes());

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hello".to_string()),
                StreamEvent::Delta(", world".to_string()),
                StreamEvent::Completed("Hello, world".to_string()),
            ]
        );
        assert!(decoder.is_done());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_decoder_handles_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let body = chunk("héllo");
        let bytes = body.as_bytes();
        // Split inside the two-byte 'é'
        let split = body.find('é').unwrap() + 1;

        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.feed(&bytes[split..]),
            vec![StreamEvent::Delta("héllo".to_string())]
        );
    }

    #[test]
    fn test_decoder_skips_comments_and_blank_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\nevent: message\n\r\n");
        assert!(events.is_empty());
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_decoder_error_object_ends_stream() {
        let mut decoder = SseDecoder::new();
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n{}",
            chunk("par"),
            chunk("ignored")
        );

        let events = decoder.feed(body.as_bytes());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Delta("par".to_string()));
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("overloaded")));
        assert!(decoder.is_done());
    }

    #[test]
    fn test_decoder_malformed_chunk_is_error() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"choices\": [\n");
        assert!(matches!(&events[..], [StreamEvent::Error(m)] if m.contains("Malformed")));
    }

    #[test]
    fn test_finish_flushes_trailing_done() {
        let mut decoder = SseDecoder::new();
        decoder.feed(chunk("a").as_bytes());
        decoder.feed(b"data: [DONE]");

        assert_eq!(
            decoder.finish(),
            vec![StreamEvent::Completed("a".to_string())]
        );
    }

    #[test]
    fn test_body_ending_before_done_is_error() {
        let mut decoder = SseDecoder::new();
        decoder.feed(chunk("a").as_bytes());
        // Trailing line without newline
        let tail = chunk("b");
        decoder.feed(tail.trim_end().as_bytes());

        let events = decoder.finish();

        assert_eq!(events[0], StreamEvent::Delta("b".to_string()));
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("before [DONE]")));
        assert_eq!(events.len(), 2);
        assert!(decoder.is_done());
    }
}
