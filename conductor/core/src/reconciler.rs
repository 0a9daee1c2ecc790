//! Message Reconciler
//!
//! Folds the events of one streamed reply into updates for a single bot
//! message. The reconciler owns the accumulated text; every update it emits
//! carries the full text so far, never a fragment.
//!
//! After a completion (or an explicit [`MessageReconciler::finalize`]) the
//! reconciler is terminal: late deltas and repeated completions produce
//! nothing.

use crate::messages::{ChatUpdate, MessageId};
use crate::streaming::StreamEvent;

/// Accumulates deltas for one target message
#[derive(Debug)]
pub struct MessageReconciler {
    target: MessageId,
    accumulated: String,
    finalized: bool,
}

impl MessageReconciler {
    /// Bind a reconciler to the placeholder message it will fill
    #[must_use]
    pub fn new(target: MessageId) -> Self {
        Self {
            target,
            accumulated: String::new(),
            finalized: false,
        }
    }

    /// Apply one event, returning the update it causes (if any)
    pub fn apply(&mut self, event: &StreamEvent) -> Option<ChatUpdate> {
        if self.finalized {
            return None;
        }

        match event {
            StreamEvent::Delta(text) => {
                self.accumulated.push_str(text);
                Some(self.update(true))
            }
            StreamEvent::Complete => self.finalize(),
            StreamEvent::Unrecognized(value) => {
                tracing::trace!(message_id = %self.target, ?value, "Ignoring unrecognized event");
                None
            }
        }
    }

    /// Mark the message as finished with whatever text has accumulated
    ///
    /// Returns `None` if the reconciler was already finalized.
    pub fn finalize(&mut self) -> Option<ChatUpdate> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        Some(self.update(false))
    }

    fn update(&self, is_typing: bool) -> ChatUpdate {
        ChatUpdate::MessageTextUpdated {
            id: self.target,
            text: self.accumulated.clone(),
            is_typing,
        }
    }

    /// Text accumulated so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Whether no further updates will be produced
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The message this reconciler fills
    #[must_use]
    pub fn target(&self) -> MessageId {
        self.target
    }
}
