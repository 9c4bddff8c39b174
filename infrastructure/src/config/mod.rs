//! Configuration file loading for verinox
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables: `VERINOX_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./verinox.toml` or `./.verinox.toml`
//! 4. Global: `$XDG_CONFIG_HOME/verinox/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileChatConfig, FileConfig, FileLoggingConfig, FileOpenAiConfig,
    FileOutputConfig, FileProvidersConfig, FileReplConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
