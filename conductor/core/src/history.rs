//! Conversation History
//!
//! The ordered list of messages a renderer displays, kept as an explicit
//! reducer over [`ChatUpdate`]s. Every change to the conversation goes through
//! [`ConversationHistory::apply`], so the whole reconciliation can be tested
//! without a network.
//!
//! # Invariants
//!
//! - Insertion order is display order
//! - Message ids are unique and strictly increasing
//! - At most one message has `is_typing = true` (the in-flight bot reply)
//!
//! Lookups go through an id → position index instead of a linear scan.

use std::collections::HashMap;

use thiserror::Error;

use crate::messages::{ChatUpdate, Message, MessageId};

/// Errors raised when an update would break a history invariant
///
/// The history is left untouched when any of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Appended message reuses an existing id
    #[error("message {0} already exists")]
    DuplicateId(MessageId),

    /// Appended message id does not follow the last one
    #[error("message {id} is not newer than {last}")]
    NonIncreasingId {
        /// The rejected id
        id: MessageId,
        /// Id of the current last message
        last: MessageId,
    },

    /// Update addresses a message that is not in the history
    #[error("message {0} not found")]
    UnknownMessage(MessageId),

    /// A second message would be marked as typing
    #[error("message {typing} is already typing, cannot start {id}")]
    AlreadyTyping {
        /// The message that is currently typing
        typing: MessageId,
        /// The message that tried to start typing
        id: MessageId,
    },
}

/// Ordered, id-indexed conversation history
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    /// Messages in display order
    messages: Vec<Message>,
    /// Position of each message in `messages`
    index: HashMap<MessageId, usize>,
    /// Id of the message currently typing, if any
    typing: Option<MessageId>,
    /// Loading indicator shown by the renderer
    loading: bool,
}

impl ConversationHistory {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next appended message must use
    #[must_use]
    pub fn next_id(&self) -> MessageId {
        self.messages
            .last()
            .map_or(MessageId(1), |last| last.id.next())
    }

    /// Apply one update in place
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] (and leaves the history unchanged) if the
    /// update would violate an invariant.
    pub fn apply(&mut self, update: &ChatUpdate) -> Result<(), HistoryError> {
        match update {
            ChatUpdate::MessageAppended(message) => self.append(message.clone()),
            ChatUpdate::MessageTextUpdated {
                id,
                text,
                is_typing,
            } => self.update_text(*id, text, *is_typing),
            ChatUpdate::LoadingStateChanged(loading) => {
                self.loading = *loading;
                Ok(())
            }
        }
    }

    /// Apply one update, consuming and returning the history
    ///
    /// # Errors
    ///
    /// Same as [`ConversationHistory::apply`].
    pub fn reduce(mut self, update: &ChatUpdate) -> Result<Self, HistoryError> {
        self.apply(update)?;
        Ok(self)
    }

    fn append(&mut self, message: Message) -> Result<(), HistoryError> {
        if self.index.contains_key(&message.id) {
            return Err(HistoryError::DuplicateId(message.id));
        }
        if let Some(last) = self.messages.last() {
            if message.id <= last.id {
                return Err(HistoryError::NonIncreasingId {
                    id: message.id,
                    last: last.id,
                });
            }
        }
        if message.is_typing {
            self.check_can_type(message.id)?;
            self.typing = Some(message.id);
        }

        self.index.insert(message.id, self.messages.len());
        self.messages.push(message);
        Ok(())
    }

    fn update_text(
        &mut self,
        id: MessageId,
        text: &str,
        is_typing: bool,
    ) -> Result<(), HistoryError> {
        let position = *self
            .index
            .get(&id)
            .ok_or(HistoryError::UnknownMessage(id))?;

        if is_typing {
            self.check_can_type(id)?;
            self.typing = Some(id);
        } else if self.typing == Some(id) {
            self.typing = None;
        }

        let message = &mut self.messages[position];
        message.text.clear();
        message.text.push_str(text);
        message.is_typing = is_typing;
        Ok(())
    }

    fn check_can_type(&self, id: MessageId) -> Result<(), HistoryError> {
        match self.typing {
            Some(typing) if typing != id => Err(HistoryError::AlreadyTyping { typing, id }),
            _ => Ok(()),
        }
    }

    /// All messages in display order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by id
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).map(|&position| &self.messages[position])
    }

    /// The last message, if any
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The message currently being typed, if any
    #[must_use]
    pub fn typing_message(&self) -> Option<&Message> {
        self.typing.and_then(|id| self.get(id))
    }

    /// Whether the loading indicator is on
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history has no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn typing_update(id: u64, text: &str, is_typing: bool) -> ChatUpdate {
        ChatUpdate::MessageTextUpdated {
            id: MessageId(id),
            text: text.to_string(),
            is_typing,
        }
    }

    #[test]
    fn test_next_id_starts_at_one() {
        let history = ConversationHistory::new();
        assert_eq!(history.next_id(), MessageId(1));
        assert!(history.is_empty());
    }

    #[test]
    fn test_append_and_lookup() {
        let history = ConversationHistory::new()
            .reduce(&ChatUpdate::MessageAppended(Message::bot(
                MessageId(1),
                "Welcome",
            )))
            .unwrap()
            .reduce(&ChatUpdate::MessageAppended(Message::user(
                MessageId(2),
                "hello",
            )))
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.next_id(), MessageId(3));
        assert_eq!(history.get(MessageId(2)).unwrap().text, "hello");
        assert_eq!(history.last().unwrap().id, MessageId(2));
    }

    #[test]
    fn test_rejects_duplicate_and_stale_ids() {
        let mut history = ConversationHistory::new();
        history
            .apply(&ChatUpdate::MessageAppended(Message::user(MessageId(5), "a")))
            .unwrap();

        let dup = history.apply(&ChatUpdate::MessageAppended(Message::user(MessageId(5), "b")));
        assert_eq!(dup, Err(HistoryError::DuplicateId(MessageId(5))));

        let stale = history.apply(&ChatUpdate::MessageAppended(Message::user(MessageId(4), "c")));
        assert_eq!(
            stale,
            Err(HistoryError::NonIncreasingId {
                id: MessageId(4),
                last: MessageId(5),
            })
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_streaming_updates_replace_text() {
        let mut history = ConversationHistory::new();
        history
            .apply(&ChatUpdate::MessageAppended(Message::placeholder(MessageId(1))))
            .unwrap();

        history.apply(&typing_update(1, "Hel", true)).unwrap();
        history.apply(&typing_update(1, "Hello", true)).unwrap();
        assert_eq!(history.typing_message().unwrap().text, "Hello");

        history.apply(&typing_update(1, "Hello", false)).unwrap();
        let message = history.get(MessageId(1)).unwrap();
        assert_eq!(message.text, "Hello");
        assert!(!message.is_typing);
        assert!(history.typing_message().is_none());
    }

    #[test]
    fn test_single_typing_message() {
        let mut history = ConversationHistory::new();
        history
            .apply(&ChatUpdate::MessageAppended(Message::placeholder(MessageId(1))))
            .unwrap();

        let second = history.apply(&ChatUpdate::MessageAppended(Message::placeholder(MessageId(2))));
        assert_eq!(
            second,
            Err(HistoryError::AlreadyTyping {
                typing: MessageId(1),
                id: MessageId(2),
            })
        );

        history
            .apply(&ChatUpdate::MessageAppended(Message::bot(MessageId(2), "done")))
            .unwrap();
        let restart = history.apply(&typing_update(2, "again", true));
        assert!(matches!(restart, Err(HistoryError::AlreadyTyping { .. })));

        assert_eq!(
            history.messages().iter().filter(|m| m.is_typing).count(),
            1
        );
    }

    #[test]
    fn test_update_unknown_message() {
        let mut history = ConversationHistory::new();
        let result = history.apply(&typing_update(9, "x", false));
        assert_eq!(result, Err(HistoryError::UnknownMessage(MessageId(9))));
    }

    #[test]
    fn test_loading_flag() {
        let mut history = ConversationHistory::new();
        assert!(!history.is_loading());
        history.apply(&ChatUpdate::LoadingStateChanged(true)).unwrap();
        assert!(history.is_loading());
        history.apply(&ChatUpdate::LoadingStateChanged(false)).unwrap();
        assert!(!history.is_loading());
    }
}
