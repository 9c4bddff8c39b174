//! Slash command parsing for the chat REPL

use std::path::PathBuf;

/// Default `/export` destination
pub const DEFAULT_EXPORT_FILE: &str = "chat_history.txt";

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    New,
    List,
    /// 1-based position in `/list`
    Select(usize),
    /// 1-based position in `/list`
    Delete(usize),
    Clear,
    History,
    Export(PathBuf),
    Theme,
    /// Show the model, or switch to the named one
    Model(Option<String>),
    Quit,
    /// Known command with bad arguments; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line of input. Returns `None` for plain chat text.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        let command = match name {
            "help" | "h" | "?" => ReplCommand::Help,
            "new" => ReplCommand::New,
            "list" | "ls" => ReplCommand::List,
            "select" | "s" => match Self::position(arg) {
                Some(n) => ReplCommand::Select(n),
                None => ReplCommand::Usage("/select <n>  (n from /list)"),
            },
            "delete" | "del" => match Self::position(arg) {
                Some(n) => ReplCommand::Delete(n),
                None => ReplCommand::Usage("/delete <n>  (n from /list)"),
            },
            "clear" => ReplCommand::Clear,
            "history" => ReplCommand::History,
            "export" => {
                ReplCommand::Export(PathBuf::from(arg.unwrap_or(DEFAULT_EXPORT_FILE)))
            }
            "theme" => ReplCommand::Theme,
            "model" => ReplCommand::Model(arg.map(str::to_string)),
            "quit" | "exit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        };
        Some(command)
    }

    fn position(arg: Option<&str>) -> Option<usize> {
        arg?.parse::<usize>().ok().filter(|n| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(ReplCommand::parse("hello /new"), None);
        assert_eq!(ReplCommand::parse(""), None);
    }

    #[test]
    fn test_simple_commands_and_aliases() {
        assert_eq!(ReplCommand::parse("/help"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse("/?"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse("  /new  "), Some(ReplCommand::New));
        assert_eq!(ReplCommand::parse("/ls"), Some(ReplCommand::List));
        assert_eq!(ReplCommand::parse("/clear"), Some(ReplCommand::Clear));
        assert_eq!(ReplCommand::parse("/history"), Some(ReplCommand::History));
        assert_eq!(ReplCommand::parse("/theme"), Some(ReplCommand::Theme));
        assert_eq!(ReplCommand::parse("/exit"), Some(ReplCommand::Quit));
    }

    #[test]
    fn test_positions() {
        assert_eq!(ReplCommand::parse("/select 2"), Some(ReplCommand::Select(2)));
        assert_eq!(ReplCommand::parse("/delete 1"), Some(ReplCommand::Delete(1)));
        assert!(matches!(
            ReplCommand::parse("/select"),
            Some(ReplCommand::Usage(_))
        ));
        assert!(matches!(
            ReplCommand::parse("/delete 0"),
            Some(ReplCommand::Usage(_))
        ));
        assert!(matches!(
            ReplCommand::parse("/select two"),
            Some(ReplCommand::Usage(_))
        ));
    }

    #[test]
    fn test_export_path() {
        assert_eq!(
            ReplCommand::parse("/export"),
            Some(ReplCommand::Export(PathBuf::from(DEFAULT_EXPORT_FILE)))
        );
        assert_eq!(
            ReplCommand::parse("/export notes/today.txt"),
            Some(ReplCommand::Export(PathBuf::from("notes/today.txt")))
        );
    }

    #[test]
    fn test_model() {
        assert_eq!(ReplCommand::parse("/model"), Some(ReplCommand::Model(None)));
        assert_eq!(
            ReplCommand::parse("/model gpt-4o"),
            Some(ReplCommand::Model(Some("gpt-4o".to_string())))
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            ReplCommand::parse("/frobnicate now"),
            Some(ReplCommand::Unknown("/frobnicate now".to_string()))
        );
    }
}
