//! Stream Session Types
//!
//! A session is one exchange: the user's message goes out, the bot's reply
//! streams back. The Conductor runs at most one session at a time.
//!
//! # States
//!
//! ```text
//!        begin()          stream opened          completion / end of data
//! Idle ─────────▶ Sending ─────────────▶ Streaming ─────────────────────────▶ Completed
//!                   │                      │  │
//!                   │ error                │  │ cancel
//!                   ▼                      │  ▼
//!                 Failed ◀─────────────────┘ Abandoned
//! ```
//!
//! `Completed`, `Failed` and `Abandoned` are resting states: a new session may
//! begin from any of them.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::backend::TransportError;
use crate::messages::MessageId;
use crate::streaming::{DecodeError, PipelineStats};

/// Where the current (or last) session stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session has run yet
    #[default]
    Idle,
    /// Request sent, waiting for the service to accept it
    Sending,
    /// Reply is streaming into the placeholder message
    Streaming,
    /// Reply arrived in full
    Completed,
    /// Reply failed; the fallback message is shown
    Failed,
    /// Consumer cancelled the reply
    Abandoned,
}

impl SessionState {
    /// Whether a session is in flight
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Sending | Self::Streaming)
    }
}

/// Errors that end a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport failed (connect, status or read)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply ended inside a multi-byte character
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The reply ended without any text and without a completion
    #[error("reply ended without any text")]
    EmptyResponse,
}

/// Why a submission was not started
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Input was empty after trimming
    #[error("message is empty")]
    EmptyInput,

    /// Another session is still in flight
    #[error("a reply is already in progress")]
    SessionActive,
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// The reply was received in full
    Completed {
        /// The finalized bot message
        message_id: MessageId,
        /// Its final text
        text: String,
        /// Pipeline counters for the reply
        stats: PipelineStats,
    },

    /// The reply failed and the fallback message was shown
    Failed {
        /// What went wrong
        error: SessionError,
    },

    /// The consumer cancelled the reply
    Abandoned {
        /// The bot message that was finalized early (none if cancelled
        /// before the stream opened)
        message_id: Option<MessageId>,
        /// Text received before cancellation
        text: String,
    },
}

impl SessionOutcome {
    /// Whether the reply was received in full
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The state the session rested in
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self {
            Self::Completed { .. } => SessionState::Completed,
            Self::Failed { .. } => SessionState::Failed,
            Self::Abandoned { .. } => SessionState::Abandoned,
        }
    }
}

/// Result of driving a session one step
#[derive(Debug)]
pub enum Step {
    /// No session to drive
    Idle,
    /// The session is still streaming
    Pending,
    /// The session just ended
    Finished(SessionOutcome),
}

/// Lets a consumer cancel the in-flight session from elsewhere
///
/// Cancellation takes effect at the next suspension point of the session:
/// while waiting for the service to accept the request, or between chunks.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub(crate) fn new(tx: Arc<watch::Sender<bool>>) -> Self {
        Self { tx }
    }

    /// Request cancellation of the in-flight session
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been requested for the current session
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}
