//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for verinox
#[derive(Parser, Debug)]
#[command(name = "verinox")]
#[command(author, version, about = "Streaming terminal chat with an OpenAI-compatible model")]
#[command(long_about = r#"
Verinox is a terminal chat client. Replies stream in as they are generated,
conversations are kept between runs, and Ctrl-C stops a reply mid-way.

Without a question, an interactive session starts. With a question, one
answer is streamed to stdout and the program exits.

The API key is read from OPENAI_API_KEY (or providers.openai.api_key).

Configuration files are loaded from (in priority order):
1. VERINOX_<SECTION>__<KEY>   Environment overrides
2. --config <path>            Explicit config file
3. ./verinox.toml             Project-level config
4. ~/.config/verinox/config.toml   Global config

Example:
  verinox
  verinox "Explain recursion with a short example"
  verinox -m gpt-4o-mini --no-persist
"#)]
pub struct Cli {
    /// Ask a single question and exit (interactive mode if omitted)
    pub question: Option<String>,

    /// Model to use (e.g. gpt-4, gpt-4o, gpt-4o-mini)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the banner and typing indicator
    #[arg(short, long)]
    pub quiet: bool,

    /// Keep conversations in memory only
    #[arg(long)]
    pub no_persist: bool,

    /// Write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
