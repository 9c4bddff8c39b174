//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::config::{OutputConfig, ReplConfig};
use crate::output::console::ConsoleFormatter;
use crate::progress::renderer::StreamRenderer;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use verinox_application::{ChatOrchestrator, ChatStateRepository};
use verinox_domain::{ConversationId, DomainError, ExchangeState, Model, Theme};

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// Ask before deleting every chat
    ConfirmClear,
    Quit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    orchestrator: ChatOrchestrator,
    repository: Option<ChatStateRepository>,
    renderer: Arc<StreamRenderer>,
    repl_config: ReplConfig,
    output_config: OutputConfig,
}

impl ChatRepl {
    /// `renderer` must be the observer registered on `orchestrator`.
    pub fn new(orchestrator: ChatOrchestrator, renderer: Arc<StreamRenderer>) -> Self {
        Self {
            orchestrator,
            repository: None,
            renderer,
            repl_config: ReplConfig::default(),
            output_config: OutputConfig::default(),
        }
    }

    /// Where `/theme` persists its choice
    pub fn with_repository(mut self, repository: ChatStateRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_repl_config(mut self, config: ReplConfig) -> Self {
        self.repl_config = config;
        self
    }

    pub fn with_output_config(mut self, config: OutputConfig) -> Self {
        self.output_config = config;
        self
    }

    pub fn orchestrator(&self) -> &ChatOrchestrator {
        &self.orchestrator
    }

    fn theme(&self) -> Theme {
        self.renderer.theme()
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.repl_config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.orchestrator.initialize();
        if !self.output_config.quiet {
            print!(
                "{}",
                ConsoleFormatter::welcome(self.orchestrator.model(), self.theme())
            );
            if let Some(active) = self.orchestrator.active_conversation()
                && !active.is_empty()
            {
                println!(
                    "{}",
                    ConsoleFormatter::notice(
                        &format!("Continuing '{}'. /new starts a fresh chat.", active.title()),
                        self.theme()
                    )
                );
            }
            println!();
        }

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    let Some(command) = ReplCommand::parse(line) else {
                        self.chat(line).await;
                        continue;
                    };

                    match self.execute(command, &mut |text| print!("{}", text)) {
                        Flow::Continue => {}
                        Flow::Quit => {
                            println!("Bye!");
                            break;
                        }
                        Flow::ConfirmClear => {
                            let answer =
                                rl.readline("Are you sure you want to delete all chats? [y/N] ");
                            let confirmed = matches!(
                                answer.as_deref().map(str::trim),
                                Ok("y") | Ok("Y") | Ok("yes")
                            );
                            if confirmed {
                                println!("{}", self.clear_all());
                            } else {
                                println!("{}", ConsoleFormatter::notice("Kept.", self.theme()));
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    /// Stream one answer to `question` in a fresh conversation.
    pub async fn ask(&mut self, question: &str) -> Result<ExchangeState, DomainError> {
        self.orchestrator.new_conversation();
        self.exchange(question).await
    }

    async fn chat(&mut self, text: &str) {
        match self.exchange(text).await {
            Ok(state) => debug!("Exchange ended as {}", state),
            Err(DomainError::ExchangeInFlight) => {
                println!(
                    "{}",
                    ConsoleFormatter::notice("Still answering, please wait.", self.theme())
                );
            }
            Err(e) => debug!("Input ignored: {}", e),
        }
        println!();
    }

    /// Run one exchange; Ctrl-C stops the reply instead of the program.
    async fn exchange(&mut self, text: &str) -> Result<ExchangeState, DomainError> {
        let stop = CancellationToken::new();
        let watcher = {
            let stop = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stop.cancel();
                }
            })
        };

        let result = self.orchestrator.run_exchange(text, &stop).await;
        watcher.abort();
        result
    }

    /// Apply a slash command, sending any output to `out`.
    pub(crate) fn execute(&mut self, command: ReplCommand, out: &mut dyn FnMut(&str)) -> Flow {
        let theme = self.theme();
        match command {
            ReplCommand::Help => out(&ConsoleFormatter::help()),
            ReplCommand::New => {
                if self.orchestrator.flags().is_busy() {
                    out(&Self::line(ConsoleFormatter::notice(
                        "Wait for the current reply to finish first.",
                        theme,
                    )));
                } else {
                    self.orchestrator.new_conversation();
                    out(&Self::line(ConsoleFormatter::notice("Started a new chat.", theme)));
                }
            }
            ReplCommand::List => out(&ConsoleFormatter::conversation_list(
                self.orchestrator.store().list(),
                self.orchestrator.store().active_id(),
                theme,
            )),
            ReplCommand::Select(position) => match self.conversation_at(position) {
                Some(id) => {
                    self.orchestrator.select_conversation(&id);
                    if let Some(active) = self.orchestrator.active_conversation() {
                        out(&ConsoleFormatter::conversation(active, theme));
                    }
                }
                None => out(&Self::no_such_chat(position)),
            },
            ReplCommand::Delete(position) => match self.conversation_at(position) {
                Some(id) => {
                    let title = self
                        .orchestrator
                        .store()
                        .get(&id)
                        .map(|c| c.title().to_string())
                        .unwrap_or_default();
                    let outcome = self.orchestrator.delete_conversation(&id);
                    if outcome.removed {
                        out(&Self::line(ConsoleFormatter::notice(
                            &format!("Deleted '{}'.", title),
                            theme,
                        )));
                    }
                    if outcome.active_changed {
                        let text = match self.orchestrator.active_conversation() {
                            Some(active) => format!("Now in '{}'.", active.title()),
                            None => "No chats left. Type a message to start one.".to_string(),
                        };
                        out(&Self::line(ConsoleFormatter::notice(&text, theme)));
                    }
                }
                None => out(&Self::no_such_chat(position)),
            },
            ReplCommand::Clear => {
                if self.orchestrator.store().is_empty() {
                    out(&Self::line(ConsoleFormatter::notice("No chats to delete.", theme)));
                } else {
                    return Flow::ConfirmClear;
                }
            }
            ReplCommand::History => match self.orchestrator.active_conversation() {
                Some(active) => out(&ConsoleFormatter::conversation(active, theme)),
                None => out(&Self::line(ConsoleFormatter::notice("No active chat.", theme))),
            },
            ReplCommand::Export(path) => out(&self.export(&path)),
            ReplCommand::Theme => {
                let theme = theme.toggled();
                self.renderer.set_theme(theme);
                if let Some(repository) = &self.repository
                    && let Err(e) = repository.save_theme(theme)
                {
                    warn!("Failed to save theme: {}", e);
                }
                out(&Self::line(ConsoleFormatter::notice(
                    &format!("Theme: {}", theme),
                    theme,
                )));
            }
            ReplCommand::Model(None) => {
                out(&format!("Model: {}\n", self.orchestrator.model()));
            }
            ReplCommand::Model(Some(name)) => {
                let Ok(model) = name.parse::<Model>();
                self.orchestrator.set_model(model);
                out(&Self::line(ConsoleFormatter::notice(
                    &format!("Model set to {}", self.orchestrator.model()),
                    theme,
                )));
            }
            ReplCommand::Quit => return Flow::Quit,
            ReplCommand::Usage(usage) => out(&format!("Usage: {}\n", usage)),
            ReplCommand::Unknown(line) => {
                out(&format!(
                    "Unknown command: {}\nType /help for available commands\n",
                    line
                ));
            }
        }
        Flow::Continue
    }

    pub(crate) fn clear_all(&mut self) -> String {
        let removed = self.orchestrator.clear_conversations();
        ConsoleFormatter::notice(&format!("Deleted {} chats.", removed), self.theme())
    }

    fn export(&self, path: &Path) -> String {
        let Some(active) = self.orchestrator.active_conversation() else {
            return Self::line(ConsoleFormatter::notice("No active chat.", self.theme()));
        };
        match std::fs::write(path, ConsoleFormatter::transcript(active)) {
            Ok(()) => Self::line(ConsoleFormatter::notice(
                &format!("Saved '{}' to {}", active.title(), path.display()),
                self.theme(),
            )),
            Err(e) => {
                warn!("Export to {} failed: {}", path.display(), e);
                Self::line(ConsoleFormatter::error(&format!(
                    "Could not write {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn conversation_at(&self, position: usize) -> Option<ConversationId> {
        self.orchestrator
            .store()
            .list()
            .get(position.checked_sub(1)?)
            .map(|c| c.id().clone())
    }

    fn no_such_chat(position: usize) -> String {
        format!("No chat #{}. See /list.\n", position)
    }

    fn line(text: String) -> String {
        text + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use verinox_application::{
        ChatConfig, CompletionBackend, CompletionRequest, GatewayClient, GatewayError,
        InMemoryKeyValueStore, StreamHandle, THEME_KEY,
    };
    use verinox_domain::StreamEvent;

    /// Replies with a fixed text, split into two fragments.
    struct EchoBackend(&'static str);

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn stream_completion(
            &self,
            _request: CompletionRequest,
            _cancellation: CancellationToken,
        ) -> Result<StreamHandle, GatewayError> {
            let (tx, rx) = mpsc::channel(8);
            let (head, tail) = self.0.split_at(self.0.len() / 2);
            tx.send(StreamEvent::Delta(head.to_string())).await.unwrap();
            tx.send(StreamEvent::Delta(tail.to_string())).await.unwrap();
            tx.send(StreamEvent::Completed(self.0.to_string()))
                .await
                .unwrap();
            Ok(StreamHandle::new(rx))
        }
    }

    fn repl() -> (ChatRepl, Arc<InMemoryKeyValueStore>) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let repository = ChatStateRepository::new(kv.clone());
        let renderer = Arc::new(
            StreamRenderer::with_writer(Theme::Dark, Box::new(std::io::sink()))
                .with_typing_indicator(false),
        );
        let gateway = GatewayClient::new(Arc::new(EchoBackend("Hello there!")), Model::Gpt4, "sys");
        let orchestrator = ChatOrchestrator::new(gateway, ChatConfig::default())
            .with_observer(renderer.clone())
            .with_repository(repository.clone());
        let repl = ChatRepl::new(orchestrator, renderer).with_repository(repository);
        (repl, kv)
    }

    fn run(repl: &mut ChatRepl, line: &str) -> (Flow, String) {
        let mut output = String::new();
        let command = ReplCommand::parse(line).unwrap();
        let flow = repl.execute(command, &mut |text| output.push_str(text));
        (flow, output)
    }

    #[tokio::test]
    async fn test_ask_streams_into_new_conversation() {
        let (mut repl, _) = repl();

        let state = repl.ask("Hi").await.unwrap();

        assert_eq!(state, ExchangeState::Finalized);
        let active = repl.orchestrator().active_conversation().unwrap();
        assert_eq!(active.title(), "Hi");
        assert_eq!(active.messages()[1].text(), "Hello there!");
    }

    #[tokio::test]
    async fn test_empty_question_is_ignored() {
        let (mut repl, _) = repl();
        assert_eq!(repl.ask("   ").await, Err(DomainError::EmptyInput));
    }

    #[tokio::test]
    async fn test_list_select_and_delete_by_position() {
        let (mut repl, _) = repl();
        repl.ask("First").await.unwrap();
        repl.ask("Second").await.unwrap();

        let (_, listing) = run(&mut repl, "/list");
        assert!(listing.contains("Second"));
        assert!(listing.contains("First"));

        let (_, shown) = run(&mut repl, "/select 2");
        assert!(shown.contains("First"));
        assert_eq!(
            repl.orchestrator().active_conversation().unwrap().title(),
            "First"
        );

        let (_, deleted) = run(&mut repl, "/delete 2");
        assert!(deleted.contains("Deleted 'First'"));
        assert!(deleted.contains("Now in 'Second'"));
        assert_eq!(repl.orchestrator().store().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_position() {
        let (mut repl, _) = repl();
        let (flow, output) = run(&mut repl, "/select 4");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("No chat #4"));
    }

    #[tokio::test]
    async fn test_clear_needs_confirmation() {
        let (mut repl, _) = repl();
        repl.ask("Keep me?").await.unwrap();

        let (flow, _) = run(&mut repl, "/clear");
        assert_eq!(flow, Flow::ConfirmClear);
        assert_eq!(repl.orchestrator().store().len(), 1);

        repl.clear_all();
        assert!(repl.orchestrator().store().is_empty());
    }

    #[tokio::test]
    async fn test_clear_with_nothing_to_delete() {
        let (mut repl, _) = repl();
        let (flow, output) = run(&mut repl, "/clear");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("No chats to delete."));
    }

    #[tokio::test]
    async fn test_theme_toggle_is_persisted() {
        let (mut repl, kv) = repl();

        run(&mut repl, "/theme");

        assert_eq!(repl.theme(), Theme::Light);
        assert_eq!(
            verinox_application::KeyValueStore::get(kv.as_ref(), THEME_KEY)
                .unwrap()
                .as_deref(),
            Some("light_mode")
        );
    }

    #[tokio::test]
    async fn test_model_show_and_switch() {
        let (mut repl, _) = repl();

        let (_, shown) = run(&mut repl, "/model");
        assert!(shown.contains("gpt-4"));

        run(&mut repl, "/model gpt-4o-mini");
        assert_eq!(repl.orchestrator().model(), &Model::Gpt4oMini);
    }

    #[tokio::test]
    async fn test_export_writes_transcript() {
        let (mut repl, _) = repl();
        repl.ask("Export me").await.unwrap();
        let path = std::env::temp_dir().join(format!(
            "verinox-export-{}.txt",
            std::process::id()
        ));

        let (_, output) = run(&mut repl, &format!("/export {}", path.display()));

        assert!(output.contains("Saved 'Export me'"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Export me\n\nYou: Export me\n\nVerinox: Hello there!"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_quit_and_unknown() {
        let (mut repl, _) = repl();
        assert_eq!(run(&mut repl, "/quit").0, Flow::Quit);

        let (flow, output) = run(&mut repl, "/bogus");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("Unknown command: /bogus"));
    }
}
