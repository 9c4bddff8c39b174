//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Diagnostic log file; overridden by `--log-file`.
    /// Defaults to `<data dir>/verinox/verinox.log`
    pub file: Option<String>,
    /// JSONL file receiving one record per exchange event
    pub conversation_log: Option<String>,
}

impl FileLoggingConfig {
    /// Where diagnostic logs go, if a location can be determined.
    pub fn resolve_file(&self) -> Option<PathBuf> {
        match &self.file {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_file(),
        }
    }

    pub fn default_file() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("verinox").join("verinox.log"))
    }
}
