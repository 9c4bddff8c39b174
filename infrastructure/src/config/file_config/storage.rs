//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw storage configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Persist conversations and the theme between runs
    pub enabled: bool,
    /// State file; defaults to `<data dir>/verinox/state.json`
    pub state_file: Option<String>,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            state_file: None,
        }
    }
}

impl FileStorageConfig {
    /// Where the state file lives, if a location can be determined.
    pub fn resolve_state_file(&self) -> Option<PathBuf> {
        match &self.state_file {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_state_file(),
        }
    }

    pub fn default_state_file() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("verinox").join("state.json"))
    }
}
