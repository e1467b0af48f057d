//! # Input Commands
//!
//! The input box doubles as a command line. Plain text is submitted for
//! sentiment analysis; a leading `/` selects a command:
//!
//! ```text
//! /attach <path>      stage a .txt, .pdf or .docx file
//! /detach             drop the staged file
//! /analyze [text]     analyze the staged file's sentiment
//! /summarize [text]   summarize the staged file
//! /new                start a new chat
//! /chats              open the chat picker
//! /quit               exit
//! ```

use std::path::PathBuf;

use crate::core::message::DocumentAction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Submit {
        text: String,
        action: Option<DocumentAction>,
    },
    Attach(PathBuf),
    Detach,
    NewChat,
    OpenChats,
    Quit,
    /// Malformed or unrecognized; carries the message to show.
    Invalid(String),
}

pub const HELP_TEXT: &str =
    "/attach <path>  /detach  /analyze  /summarize  /new  /chats  /quit";

pub fn parse(input: &str) -> Command {
    let trimmed = input.trim_start();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Submit {
            text: input.to_string(),
            action: None,
        };
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim_end(), ""),
    };

    match name {
        "attach" if arg.is_empty() => Command::Invalid("Usage: /attach <path>".to_string()),
        "attach" => Command::Attach(expand_home(arg)),
        "detach" => Command::Detach,
        "analyze" => Command::Submit {
            text: arg.to_string(),
            action: Some(DocumentAction::AnalyzeSentiment),
        },
        "summarize" => Command::Submit {
            text: arg.to_string(),
            action: Some(DocumentAction::Summarize),
        },
        "new" => Command::NewChat,
        "chats" => Command::OpenChats,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command /{other}. Try: {HELP_TEXT}")),
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_submitted_verbatim() {
        assert_eq!(
            parse("I'm so excited about this new project!"),
            Command::Submit {
                text: "I'm so excited about this new project!".to_string(),
                action: None,
            }
        );
    }

    #[test]
    fn test_document_actions() {
        assert_eq!(
            parse("/summarize"),
            Command::Submit {
                text: String::new(),
                action: Some(DocumentAction::Summarize),
            }
        );
        assert_eq!(
            parse("/analyze  what is the tone?"),
            Command::Submit {
                text: "what is the tone?".to_string(),
                action: Some(DocumentAction::AnalyzeSentiment),
            }
        );
    }

    #[test]
    fn test_attach_requires_path() {
        assert_eq!(parse("/attach report.pdf"), Command::Attach(PathBuf::from("report.pdf")));
        assert_eq!(
            parse("/attach  my notes.txt "),
            Command::Attach(PathBuf::from("my notes.txt"))
        );
        assert!(matches!(parse("/attach"), Command::Invalid(_)));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/detach"), Command::Detach);
        assert_eq!(parse("/new"), Command::NewChat);
        assert_eq!(parse("/chats"), Command::OpenChats);
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("  /exit  "), Command::Quit);
    }

    #[test]
    fn test_unknown_command() {
        match parse("/frobnicate") {
            Command::Invalid(msg) => assert!(msg.contains("/frobnicate")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(parse("/attach ~/a.txt"), Command::Attach(home.join("a.txt")));
        }
    }
}
