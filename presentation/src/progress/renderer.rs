//! Incremental rendering of streamed replies
//!
//! [`StreamRenderer`] observes the orchestrator. It shows a spinner while
//! the assistant is "typing", then prints only the new suffix of the
//! accumulated reply on every update, so the terminal shows the text as it
//! grows without redrawing.

use crate::output::console::{ASSISTANT_NAME, ConsoleFormatter};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use verinox_application::ChatObserver;
use verinox_domain::{Author, ConversationId, ExchangeState, Message, Theme};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Terminal [`ChatObserver`] that streams assistant text as it arrives
pub struct StreamRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    theme: Mutex<Theme>,
    show_typing: bool,
    show_labels: bool,
    spinner: Mutex<Option<ProgressBar>>,
    /// Label held back until the first fragment, so the spinner can own
    /// the line meanwhile
    pending_label: Mutex<Option<String>>,
    /// Bytes of the in-flight message already written
    printed: Mutex<usize>,
}

impl StreamRenderer {
    pub fn new(theme: Theme) -> Self {
        Self::with_writer(theme, Box::new(std::io::stdout()))
    }

    pub fn with_writer(theme: Theme, out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            theme: Mutex::new(theme),
            show_typing: true,
            show_labels: true,
            spinner: Mutex::new(None),
            pending_label: Mutex::new(None),
            printed: Mutex::new(0),
        }
    }

    /// Show the spinner while waiting for the first fragment
    pub fn with_typing_indicator(mut self, show: bool) -> Self {
        self.show_typing = show;
        self
    }

    /// Prefix replies with the assistant's name
    pub fn with_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    pub fn theme(&self) -> Theme {
        *lock(&self.theme)
    }

    pub fn set_theme(&self, theme: Theme) {
        *lock(&self.theme) = theme;
    }

    fn write(&self, text: &str) {
        let mut out = lock(&self.out);
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message(format!("{} is typing...", ASSISTANT_NAME));
        spinner.enable_steady_tick(Duration::from_millis(100));
        *lock(&self.spinner) = Some(spinner);
    }

    fn stop_spinner(&self) {
        if let Some(spinner) = lock(&self.spinner).take() {
            spinner.finish_and_clear();
        }
    }
}

impl ChatObserver for StreamRenderer {
    fn on_typing_changed(&self, typing: bool) {
        if typing && self.show_typing {
            self.start_spinner();
        } else {
            self.stop_spinner();
        }
    }

    fn on_message_appended(&self, _conversation: &ConversationId, message: &Message) {
        if message.author() != Author::Assistant {
            return;
        }
        let theme = self.theme();
        let label = if self.show_labels {
            format!("\n{} ", ConsoleFormatter::label(Author::Assistant, theme))
        } else {
            String::new()
        };

        if message.is_streaming() {
            *lock(&self.printed) = 0;
            *lock(&self.pending_label) = Some(label);
        } else {
            self.stop_spinner();
            self.write(&format!(
                "{}{}\n",
                label,
                ConsoleFormatter::error(message.text())
            ));
        }
    }

    fn on_message_updated(&self, _conversation: &ConversationId, message: &Message) {
        if message.author() != Author::Assistant {
            return;
        }
        if let Some(label) = lock(&self.pending_label).take() {
            self.write(&label);
        }
        let text = message.text();
        let mut printed = lock(&self.printed);
        if let Some(suffix) = text.get(*printed..)
            && !suffix.is_empty()
        {
            self.write(suffix);
            *printed = text.len();
        }
        if !message.is_streaming() {
            self.write("\n");
            *printed = 0;
        }
    }

    fn on_exchange_finished(&self, state: ExchangeState) {
        self.stop_spinner();
        if state == ExchangeState::Cancelled {
            self.write(&format!(
                "{}\n",
                ConsoleFormatter::notice("[stopped]", self.theme())
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use verinox_domain::ConversationStore;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn renderer(labels: bool) -> (SharedBuffer, StreamRenderer) {
        let buffer = SharedBuffer::default();
        let renderer = StreamRenderer::with_writer(Theme::Dark, Box::new(buffer.clone()))
            .with_typing_indicator(false)
            .with_labels(labels);
        (buffer, renderer)
    }

    /// Drive the renderer through a streamed reply using real store messages.
    fn stream(renderer: &StreamRenderer, fragments: &[&str]) {
        let mut store = ConversationStore::new();
        let cid = store.create();
        let placeholder = Message::placeholder();
        let mid = placeholder.id().clone();
        store.append_message(&cid, placeholder.clone());
        renderer.on_message_appended(&cid, &placeholder);

        let mut text = String::new();
        for fragment in fragments {
            text.push_str(fragment);
            store.update_message(&cid, &mid, text.clone());
            renderer.on_message_updated(&cid, store.get(&cid).unwrap().message(&mid).unwrap());
        }
        store.mark_finished(&cid, &mid);
        renderer.on_message_updated(&cid, store.get(&cid).unwrap().message(&mid).unwrap());
    }

    #[test]
    fn test_prints_only_new_suffix() {
        let (buffer, renderer) = renderer(false);

        stream(&renderer, &["Recursion ", "is when a function ", "calls itself."]);

        assert_eq!(
            buffer.contents(),
            "Recursion is when a function calls itself.\n"
        );
    }

    #[test]
    fn test_label_precedes_reply() {
        let (buffer, renderer) = renderer(true);

        stream(&renderer, &["hi"]);

        let output = buffer.contents();
        let label = output.find(ASSISTANT_NAME).unwrap();
        let reply = output.find("hi\n").unwrap();
        assert!(label < reply);
    }

    #[test]
    fn test_failure_notice_is_printed() {
        let (buffer, renderer) = renderer(false);
        let notice = Message::assistant("Sorry, I encountered an error. Please try again.");

        renderer.on_message_appended(&ConversationId::from("c"), &notice);

        assert!(buffer.contents().contains("Sorry, I encountered an error."));
    }

    #[test]
    fn test_cancelled_exchange_is_marked() {
        let (buffer, renderer) = renderer(false);
        renderer.on_exchange_finished(ExchangeState::Cancelled);
        assert!(buffer.contents().contains("[stopped]"));
    }

    #[test]
    fn test_user_messages_are_not_echoed() {
        let (buffer, renderer) = renderer(true);
        renderer.on_message_appended(&ConversationId::from("c"), &Message::user("typed"));
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_theme_can_change() {
        let (_, renderer) = renderer(true);
        renderer.set_theme(Theme::Light);
        assert_eq!(renderer.theme(), Theme::Light);
    }
}
