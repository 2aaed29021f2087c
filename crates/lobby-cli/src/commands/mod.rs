//! Slash commands for the chat page

/// Result of executing a slash command
pub enum CommandResult {
    /// Start a fresh conversation
    NewChat,
    /// Rename the current conversation
    Rename(String),
    /// Replace the last user turn and resend
    Edit(String),
    /// Open the conversation picker
    OpenChats,
    /// Show a message to the user (not sent to the assistant)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse a slash command. Returns `None` for ordinary chat input.
pub fn execute_command(input: &str) -> Option<CommandResult> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = input[1..].splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "new" | "n" => CommandResult::NewChat,

        "chats" | "c" => CommandResult::OpenChats,

        "rename" | "r" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /rename <new title>".to_string())
            } else {
                CommandResult::Rename(args.to_string())
            }
        }

        "edit" | "e" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /edit <replacement message>".to_string())
            } else {
                CommandResult::Edit(args.to_string())
            }
        }

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /new, /n             Start a fresh conversation
  /chats, /c           Open the conversation picker
  /rename, /r <title>  Rename the current conversation
  /edit, /e <text>     Replace your last message and resend
  /quit, /exit, /q     Exit lobby

Examples:
  /rename Deployment questions
  /edit what does the 409 on user save mean?"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(execute_command("hello there").is_none());
    }

    #[test]
    fn test_edit_requires_text() {
        match execute_command("/edit").unwrap() {
            CommandResult::Message(m) => assert!(m.contains("Usage")),
            _ => panic!("expected usage message"),
        }
        match execute_command("/edit try again").unwrap() {
            CommandResult::Edit(text) => assert_eq!(text, "try again"),
            _ => panic!("expected Edit"),
        }
    }

    #[test]
    fn test_unknown_command_reported() {
        match execute_command("/frobnicate").unwrap() {
            CommandResult::Unknown(name) => assert_eq!(name, "frobnicate"),
            _ => panic!("expected Unknown"),
        }
    }
}
