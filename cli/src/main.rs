//! CLI entrypoint for verinox
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use verinox_application::{
    ChatObserver, ChatOrchestrator, ChatStateRepository, ConversationLogger, GatewayClient,
    InMemoryKeyValueStore, KeyValueStore,
};
use verinox_domain::{ExchangeState, Model};
use verinox_infrastructure::{
    ConfigLoader, FileConfig, JsonFileKeyValueStore, JsonlConversationLogger, OpenAiBackend,
    OpenAiSettings,
};
use verinox_presentation::{ChatRepl, Cli, OutputConfig, ReplConfig, StreamRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let log_file = cli.log_file.clone().or_else(|| config.logging.resolve_file());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref());

    info!("Starting verinox");

    if let Some(model) = &cli.model {
        config.providers.openai.model = model.clone();
    }
    for issue in config.validate() {
        warn!("Config: {}", issue);
    }
    if !config.output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let model: Model = config.model();
    let chat_config = config.chat.to_chat_config(model.clone());

    let settings = OpenAiSettings::from_config(&config.providers.openai);
    let backend = OpenAiBackend::new(settings).context("Failed to build HTTP client")?;
    if !backend.has_api_key() {
        warn!(
            "No API key found in {}; replies will ask for configuration",
            config.providers.openai.api_key_env
        );
    }
    let gateway = GatewayClient::new(Arc::new(backend), model, chat_config.system_prompt.clone());

    let repository = ChatStateRepository::new(open_state_store(&config, cli.no_persist));
    let theme = repository.load_theme();
    let one_shot = cli.question.is_some();

    let renderer = Arc::new(
        StreamRenderer::new(theme)
            .with_typing_indicator(config.repl.show_typing && !cli.quiet)
            .with_labels(!one_shot),
    );

    let mut orchestrator = ChatOrchestrator::new(gateway, chat_config)
        .with_observer(renderer.clone() as Arc<dyn ChatObserver>)
        .with_repository(repository.clone());
    if let Some(path) = &config.logging.conversation_log
        && let Some(logger) = JsonlConversationLogger::open(path)
    {
        info!("Logging conversation events to {}", logger.path().display());
        orchestrator = orchestrator.with_logger(Arc::new(logger) as Arc<dyn ConversationLogger>);
    }

    let mut repl = ChatRepl::new(orchestrator, renderer)
        .with_repository(repository)
        .with_repl_config(ReplConfig {
            show_typing: config.repl.show_typing,
            history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        })
        .with_output_config(OutputConfig {
            color: config.output.color,
            quiet: cli.quiet,
        });

    // Single question mode
    if let Some(question) = cli.question {
        match repl.ask(&question).await {
            Ok(ExchangeState::Failed) => bail!("The request failed"),
            Ok(state) => info!("One-shot exchange ended as {}", state),
            Err(e) => bail!("Nothing to ask: {}", e),
        }
        return Ok(());
    }

    repl.run().await?;
    Ok(())
}

/// Filter directive for a `-v` count.
fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    }
}

/// Directive for the stderr layer, or `None` when logs go to a file.
///
/// Without a file only errors reach the terminal unless `-v` asks for more,
/// so diagnostics stay out of the chat transcript.
fn stderr_directive(verbose: u8, has_file: bool) -> Option<&'static str> {
    match (has_file, verbose) {
        (true, _) => None,
        (false, 0) => Some("error"),
        (false, v) => Some(level_for(v)),
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Install the tracing subscriber.
///
/// Logs go to `log_file` through a non-blocking writer; stderr is only used
/// when no file can be opened. The returned guard flushes the file writer
/// when dropped.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = |fallback: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    let file = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path.display(), e);
            None
        }
    });

    match (file, stderr_directive(verbose, log_file.is_some())) {
        (Some(file), _) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(filter(level_for(verbose)))
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        (None, directive) => {
            tracing_subscriber::registry()
                .with(filter(directive.unwrap_or("error")))
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
            None
        }
    }
}

/// Pick the key-value store backing chat state.
///
/// Falls back to memory when persistence is off or the file can't be opened.
fn open_state_store(config: &FileConfig, no_persist: bool) -> Arc<dyn KeyValueStore> {
    if no_persist || !config.storage.enabled {
        info!("Conversations will not be saved");
        return Arc::new(InMemoryKeyValueStore::new());
    }
    let Some(path) = config.storage.resolve_state_file() else {
        warn!("No data directory available; conversations will not be saved");
        return Arc::new(InMemoryKeyValueStore::new());
    };
    match JsonFileKeyValueStore::open(&path) {
        Ok(store) => {
            info!("Chat state: {}", store.path().display());
            Arc::new(store) as Arc<dyn KeyValueStore>
        }
        Err(e) => {
            warn!("Cannot open {}: {}; conversations will not be saved", path.display(), e);
            Arc::new(InMemoryKeyValueStore::new())
        }
    }
}
