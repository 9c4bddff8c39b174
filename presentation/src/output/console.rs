//! Console output formatter for chat sessions

use colored::{Color, Colorize};
use verinox_domain::{Author, Conversation, ConversationId, Message, Model, Theme};

/// Name shown in front of assistant messages
pub const ASSISTANT_NAME: &str = "Verinox";

/// Name shown in front of user messages
pub const USER_NAME: &str = "You";

/// Starter prompts offered on the welcome screen
pub const SUGGESTIONS: [&str; 4] = [
    "Explain a difficult concept in simple terms",
    "Help me debug a piece of code",
    "Summarize the key ideas of a topic step by step",
    "Draft a clear, professional email",
];

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
struct Palette {
    user: Color,
    assistant: Color,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                user: Color::Cyan,
                assistant: Color::Green,
                accent: Color::Yellow,
                muted: Color::BrightBlack,
            },
            Theme::Light => Self {
                user: Color::Blue,
                assistant: Color::Magenta,
                accent: Color::Red,
                muted: Color::Black,
            },
        }
    }
}

/// Formats chat state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Banner, model, suggestions and commands
    pub fn welcome(model: &Model, theme: Theme) -> String {
        let palette = Palette::for_theme(theme);
        let mut output = String::new();

        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            "╭─────────────────────────────────────────────╮".color(palette.accent)
        ));
        output.push_str(&format!(
            "{}\n",
            "│        Verinox - Ask me anything            │".color(palette.accent)
        ));
        output.push_str(&format!(
            "{}\n\n",
            "╰─────────────────────────────────────────────╯".color(palette.accent)
        ));
        output.push_str(&format!("{} {}\n\n", "Model:".bold(), model));

        output.push_str(&format!("{}\n", "Try asking:".bold()));
        for suggestion in SUGGESTIONS {
            output.push_str(&format!("  {} {}\n", "*".color(palette.assistant), suggestion));
        }
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            "Type /help for commands, Ctrl-C stops a reply, /quit exits.".color(palette.muted)
        ));
        output
    }

    /// Slash command reference
    pub fn help() -> String {
        let commands = [
            ("/help", "Show this help"),
            ("/new", "Start a new chat"),
            ("/list", "List chats (newest first)"),
            ("/select <n>", "Switch to chat n from /list"),
            ("/delete <n>", "Delete chat n from /list"),
            ("/clear", "Delete all chats"),
            ("/history", "Show the current chat again"),
            ("/export [path]", "Save the current chat as text (chat_history.txt)"),
            ("/theme", "Toggle dark / light colors"),
            ("/model [name]", "Show or switch the model"),
            ("/quit", "Exit"),
        ];

        let mut output = String::from("\nCommands:\n");
        for (command, description) in commands {
            output.push_str(&format!("  {:<16} - {}\n", command, description));
        }
        output
    }

    /// Label printed before a message body
    pub fn label(author: Author, theme: Theme) -> String {
        let palette = Palette::for_theme(theme);
        match author {
            Author::User => format!("{}:", USER_NAME).color(palette.user).bold().to_string(),
            Author::Assistant => format!("{}:", ASSISTANT_NAME)
                .color(palette.assistant)
                .bold()
                .to_string(),
        }
    }

    /// One message with its label
    pub fn message(message: &Message, theme: Theme) -> String {
        format!("{} {}", Self::label(message.author(), theme), message.text())
    }

    /// Every message of a conversation, under its title
    pub fn conversation(conversation: &Conversation, theme: Theme) -> String {
        let palette = Palette::for_theme(theme);
        let mut output = format!(
            "\n{}\n{}\n",
            conversation.title().color(palette.accent).bold(),
            "-".repeat(40).color(palette.muted)
        );
        if conversation.is_empty() {
            output.push_str(&format!("{}\n", "(no messages yet)".color(palette.muted)));
        }
        for message in conversation.messages() {
            output.push_str(&format!("\n{}\n", Self::message(message, theme)));
        }
        output
    }

    /// Numbered conversation list, marking the active one
    pub fn conversation_list(
        conversations: &[Conversation],
        active: Option<&ConversationId>,
        theme: Theme,
    ) -> String {
        let palette = Palette::for_theme(theme);
        if conversations.is_empty() {
            return format!("{}\n", "No chats yet.".color(palette.muted));
        }

        let mut output = String::new();
        for (index, conversation) in conversations.iter().enumerate() {
            let is_active = active == Some(conversation.id());
            let marker = if is_active { "*" } else { " " };
            let title = if is_active {
                conversation.title().color(palette.accent).bold().to_string()
            } else {
                conversation.title().to_string()
            };
            output.push_str(&format!(
                "{} {:>3}. {} {}\n",
                marker,
                index + 1,
                title,
                format!(
                    "({} messages, {})",
                    conversation.messages().len(),
                    conversation.created_at().format("%Y-%m-%d %H:%M")
                )
                .color(palette.muted)
            ));
        }
        output
    }

    /// Plain-text transcript for export
    pub fn transcript(conversation: &Conversation) -> String {
        let mut output = format!("{}\n\n", conversation.title());
        for message in conversation.messages() {
            let name = match message.author() {
                Author::User => USER_NAME,
                Author::Assistant => ASSISTANT_NAME,
            };
            output.push_str(&format!("{}: {}\n\n", name, message.text()));
        }
        output
    }

    /// Informational line
    pub fn notice(text: &str, theme: Theme) -> String {
        text.color(Palette::for_theme(theme).muted).to_string()
    }

    /// Error line (also used for the assistant's failure notices)
    pub fn error(text: &str) -> String {
        text.red().to_string()
    }
}
