//! Chat Messages and Renderer Updates
//!
//! Types shared between the Conductor and whatever renders the conversation.
//! The renderer never mutates history directly: it receives [`ChatUpdate`]s
//! and folds them into its own view (or into a [`ConversationHistory`]).
//!
//! # Design Philosophy
//!
//! The Conductor owns the conversation; the renderer is a pure consumer.
//! Every visible change (a new message, a growing bot reply, the loading
//! indicator) travels as exactly one update, in the order it happened.
//!
//! [`ConversationHistory`]: crate::history::ConversationHistory

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message identifier
///
/// Assigned by the history at append time, strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// The id that follows this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg_{}", self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the chat
    User,
    /// The streaming assistant on the other end
    Bot,
}

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Message text (grows while the bot is typing)
    pub text: String,
    /// Who sent this message
    pub sender: Sender,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// Whether the message is still being streamed
    pub is_typing: bool,
}

impl Message {
    /// Create a finished user message
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            is_typing: false,
        }
    }

    /// Create a finished bot message
    pub fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            is_typing: false,
        }
    }

    /// Create an empty bot message that is still being typed
    #[must_use]
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            is_typing: true,
            ..Self::bot(id, String::new())
        }
    }
}

/// Updates from the Conductor to the renderer
///
/// These are the only ways the conversation visible to a user can change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatUpdate {
    /// A new message was added at the end of the history
    MessageAppended(Message),

    /// The text (and typing flag) of an existing message changed
    MessageTextUpdated {
        /// Message being updated
        id: MessageId,
        /// The complete text so far (not a fragment)
        text: String,
        /// Whether more text is still expected
        is_typing: bool,
    },

    /// The session-scoped loading indicator toggled
    ///
    /// Renderers use this to disable input while a reply is in flight.
    LoadingStateChanged(bool),
}

impl ChatUpdate {
    /// The message this update touches, if any
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::MessageAppended(message) => Some(message.id),
            Self::MessageTextUpdated { id, .. } => Some(*id),
            Self::LoadingStateChanged(_) => None,
        }
    }
}
