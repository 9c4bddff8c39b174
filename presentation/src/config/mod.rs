//! Presentation-level configuration
//!
//! Configuration for output formatting and REPL behavior.

use std::path::PathBuf;

/// Output configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Enable colored terminal output
    pub color: bool,
    /// Hide the banner and the typing indicator
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            quiet: false,
        }
    }
}

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Show the typing indicator while waiting for the first fragment
    pub show_typing: bool,
    /// Path to history file
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_typing: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// History file location, falling back to `<data dir>/verinox/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("verinox").join("history.txt")))
    }
}
