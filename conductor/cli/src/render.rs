//! Terminal rendering of chat updates
//!
//! A growing bot message is printed incrementally: each update prints only
//! the part of the text that is new since the last one. When a message's
//! text is replaced rather than extended (a failed reply turned into the
//! fallback message), the new text is printed on a fresh line.

use std::collections::HashMap;

use chat_conductor::{ChatUpdate, MessageId, Sender};

/// Turns updates into text for a line-oriented terminal
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    /// Text already printed for each message still being typed
    printed: HashMap<MessageId, String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for one update, if any
    pub fn render(&mut self, update: &ChatUpdate) -> Option<String> {
        match update {
            // The user typed it, the terminal already shows it
            ChatUpdate::MessageAppended(message) if message.sender == Sender::User => None,
            ChatUpdate::MessageAppended(message) if message.is_typing => {
                self.printed.insert(message.id, message.text.clone());
                (!message.text.is_empty()).then(|| message.text.clone())
            }
            ChatUpdate::MessageAppended(message) => Some(format!("{}\n", message.text)),
            ChatUpdate::MessageTextUpdated {
                id,
                text,
                is_typing,
            } => self.render_text(*id, text, *is_typing),
            ChatUpdate::LoadingStateChanged(_) => None,
        }
    }

    fn render_text(&mut self, id: MessageId, text: &str, is_typing: bool) -> Option<String> {
        let previous = self.printed.remove(&id).unwrap_or_default();

        let mut out = match text.strip_prefix(previous.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{text}"),
        };

        if is_typing {
            self.printed.insert(id, text.to_string());
        } else {
            out.push('\n');
        }

        (!out.is_empty()).then_some(out)
    }
}
