//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON line carrying `type`,
//! `timestamp` and the `session` it belongs to. The file is opened in append
//! mode so successive runs accumulate in one log.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;
use verinox_application::{ConversationEvent, ConversationLogger};

/// Appends one JSON object per line to a conversation log.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    session: String,
}

impl JsonlConversationLogger {
    /// Open (or create) the log at `path`.
    ///
    /// Returns `None` if the file cannot be opened; the chat then runs
    /// without a conversation log.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            session: Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier shared by every record written through this logger.
    pub fn session(&self) -> &str {
        &self.session
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::from(event.event_type));
        map.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        map.insert("session".to_string(), Value::from(self.session.as_str()));
        Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(line) = serde_json::to_string(&self.record(event)) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // One flush per record keeps the log readable after a crash
        if writeln!(writer, "{}", line).and_then(|_| writer.flush()).is_err() {
            warn!("Could not write to conversation log {}", self.path.display());
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}
