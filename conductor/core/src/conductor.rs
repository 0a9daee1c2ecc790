//! Conductor - The Session Controller
//!
//! The Conductor owns the conversation. It:
//! - Sends user messages through a [`ChatTransport`]
//! - Feeds the streamed reply through the decoding pipeline
//! - Reconciles reply text into the history
//! - Tells the renderer about every change as a [`ChatUpdate`]
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It doesn't know or care whether it's talking
//! to a terminal, a web page or a test harness. Renderers receive updates over
//! an `mpsc` channel and never touch the history themselves.
//!
//! Every update is first applied to the Conductor's own
//! [`ConversationHistory`] and only sent if that succeeded, so a renderer
//! replaying the updates ends up with exactly the same history.
//!
//! # Driving a Session
//!
//! ```ignore
//! let (tx, mut rx) = mpsc::channel(100);
//! let mut conductor = Conductor::new(transport, ConductorConfig::default(), tx);
//! conductor.start().await;
//!
//! conductor.begin("Hello!").await?;
//! while let Step::Pending = conductor.step().await {
//!     // render updates from rx
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};

use crate::backend::{ByteStream, ChatRequest, ChatTransport, HealthStatus};
use crate::config::ConductorConfig;
use crate::history::ConversationHistory;
use crate::messages::{ChatUpdate, Message};
use crate::reconciler::MessageReconciler;
use crate::session::{
    CancelHandle, RejectReason, SessionError, SessionOutcome, SessionState, Step,
};
use crate::streaming::{PipelineStats, StreamEvent, StreamPipeline};

/// Everything owned by a streaming session
///
/// Dropping this releases the byte stream and the decoder state.
struct ActiveSession {
    stream: ByteStream,
    pipeline: StreamPipeline,
    reconciler: MessageReconciler,
    started_at: Instant,
}

/// The Conductor - headless chat session controller
pub struct Conductor<T: ChatTransport> {
    /// Configuration
    config: ConductorConfig,
    /// Chat service transport
    transport: Arc<T>,
    /// Conversation as the renderer sees it
    history: ConversationHistory,
    /// State of the current (or last) session
    state: SessionState,
    /// The session currently streaming, if any
    active: Option<ActiveSession>,
    /// Outcome of a session that ended before streaming
    finished: Option<SessionOutcome>,
    /// Channel to send updates to the renderer
    tx: mpsc::Sender<ChatUpdate>,
    /// Cancellation flag, shared with every [`CancelHandle`]
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl<T: ChatTransport> Conductor<T> {
    /// Create a new Conductor with the given transport
    ///
    /// The history is seeded with the configured greeting, if any. It is
    /// announced to the renderer by [`Conductor::start`].
    pub fn new(transport: T, config: ConductorConfig, tx: mpsc::Sender<ChatUpdate>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let mut history = ConversationHistory::new();
        if let Some(ref greeting) = config.greeting {
            let update = ChatUpdate::MessageAppended(Message::bot(history.next_id(), greeting));
            if let Err(e) = history.apply(&update) {
                tracing::warn!(error = %e, "Failed to seed greeting");
            }
        }

        Self {
            config,
            transport: Arc::new(transport),
            history,
            state: SessionState::Idle,
            active: None,
            finished: None,
            tx,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the conversation history
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Get the state of the current (or last) session
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the loading indicator is on
    pub fn is_loading(&self) -> bool {
        self.history.is_loading()
    }

    /// Get a handle that can cancel the in-flight session
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancel_tx))
    }

    /// Announce the existing history and probe the service
    ///
    /// An unreachable or unhealthy service is reported but not fatal: the
    /// user may still try to send messages.
    pub async fn start(&mut self) -> Option<HealthStatus> {
        for message in self.history.messages() {
            self.send(ChatUpdate::MessageAppended(message.clone())).await;
        }

        match self.transport.health_check().await {
            Ok(health) => {
                if !health.is_healthy() {
                    tracing::warn!(status = %health.status, "Chat service reports unhealthy");
                } else if !health.api_key_configured {
                    tracing::warn!("Chat service has no API key configured");
                } else {
                    tracing::info!(transport = self.transport.name(), "Chat service is healthy");
                }
                Some(health)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat service health check failed");
                None
            }
        }
    }

    /// Start a session for the given user input
    ///
    /// Appends the user message, turns loading on and opens the reply
    /// stream. A failure to open the stream ends the session right away;
    /// its outcome is returned by the next [`Conductor::step`].
    ///
    /// # Errors
    ///
    /// Returns a [`RejectReason`] (with no side effects) if the input is
    /// blank or another session is in flight.
    pub async fn begin(&mut self, input: &str) -> Result<(), RejectReason> {
        let request = self.open_session(input).await?;

        let opened = tokio::select! {
            biased;
            () = wait_for_cancel(&mut self.cancel_rx) => None,
            result = self.transport.open_stream(&request) => Some(result),
        };

        match opened {
            None => {
                let outcome = self.abandon_before_stream().await;
                self.finished = Some(outcome);
            }
            Some(Err(e)) => {
                let outcome = self.fail(SessionError::Transport(e), None).await;
                self.finished = Some(outcome);
            }
            Some(Ok(stream)) => {
                let id = self.history.next_id();
                let mut outbox = Vec::new();
                self.commit(ChatUpdate::MessageAppended(Message::placeholder(id)), &mut outbox);
                self.state = SessionState::Streaming;
                self.active = Some(ActiveSession {
                    stream,
                    pipeline: StreamPipeline::new(),
                    reconciler: MessageReconciler::new(id),
                    started_at: Instant::now(),
                });
                self.flush(outbox).await;
                tracing::debug!(message_id = %id, "Reply stream opened");
            }
        }

        Ok(())
    }

    /// Drive the current session until the next chunk has been handled
    pub async fn step(&mut self) -> Step {
        if let Some(outcome) = self.finished.take() {
            return Step::Finished(outcome);
        }

        let Some(mut active) = self.active.take() else {
            return Step::Idle;
        };

        let next = tokio::select! {
            biased;
            () = wait_for_cancel(&mut self.cancel_rx) => None,
            chunk = futures::StreamExt::next(&mut active.stream) => Some(chunk),
        };

        match next {
            None => Step::Finished(self.abandon_active(active).await),

            Some(Some(Ok(bytes))) => {
                let events = active.pipeline.push(&bytes);
                if self.reconcile(&mut active, &events).await {
                    Step::Finished(self.complete(active).await)
                } else {
                    self.active = Some(active);
                    Step::Pending
                }
            }

            Some(Some(Err(e))) => {
                Step::Finished(self.fail(SessionError::Transport(e), Some(active)).await)
            }

            // End of data
            Some(None) => match active.pipeline.finish() {
                Err(e) => Step::Finished(self.fail(SessionError::Decode(e), Some(active)).await),
                Ok(events) => {
                    let finalized = self.reconcile(&mut active, &events).await;
                    if finalized || !active.reconciler.text().is_empty() {
                        Step::Finished(self.complete(active).await)
                    } else {
                        Step::Finished(self.fail(SessionError::EmptyResponse, Some(active)).await)
                    }
                }
            },
        }
    }

    /// Drive the current session to its end
    ///
    /// Returns `None` if no session was started.
    pub async fn run_session(&mut self) -> Option<SessionOutcome> {
        loop {
            match self.step().await {
                Step::Idle => return None,
                Step::Pending => {}
                Step::Finished(outcome) => return Some(outcome),
            }
        }
    }

    /// Send a message and stream the reply to its end
    ///
    /// # Errors
    ///
    /// Returns a [`RejectReason`] if the submission was not started.
    pub async fn send_message(&mut self, input: &str) -> Result<SessionOutcome, RejectReason> {
        self.begin(input).await?;
        Ok(self
            .run_session()
            .await
            .unwrap_or(SessionOutcome::Abandoned {
                message_id: None,
                text: String::new(),
            }))
    }

    /// Send a message and wait for the whole reply without streaming
    ///
    /// The reply is appended as a single finished bot message.
    ///
    /// # Errors
    ///
    /// Returns a [`RejectReason`] if the submission was not started.
    pub async fn send_without_streaming(
        &mut self,
        input: &str,
    ) -> Result<SessionOutcome, RejectReason> {
        let request = self.open_session(input).await?;

        let sent = tokio::select! {
            biased;
            () = wait_for_cancel(&mut self.cancel_rx) => None,
            result = self.transport.send(&request) => Some(result),
        };

        let outcome = match sent {
            None => self.abandon_before_stream().await,
            Some(Err(e)) => self.fail(SessionError::Transport(e), None).await,
            Some(Ok(reply)) if reply.response.is_empty() => {
                self.fail(SessionError::EmptyResponse, None).await
            }
            Some(Ok(reply)) => {
                tracing::debug!(
                    career_plan = reply.career_plan.is_some(),
                    schedule = reply.schedule.is_some(),
                    resources = reply.resources.as_ref().map_or(0, Vec::len),
                    "Received whole reply"
                );

                let id = self.history.next_id();
                let mut outbox = Vec::new();
                self.commit(
                    ChatUpdate::MessageAppended(Message::bot(id, reply.response.clone())),
                    &mut outbox,
                );
                self.commit(ChatUpdate::LoadingStateChanged(false), &mut outbox);
                self.state = SessionState::Completed;
                self.flush(outbox).await;

                SessionOutcome::Completed {
                    message_id: id,
                    text: reply.response,
                    stats: PipelineStats::default(),
                }
            }
        };

        Ok(outcome)
    }

    /// Abandon the streaming session right away
    ///
    /// Returns `None` if nothing was streaming.
    pub async fn abandon(&mut self) -> Option<SessionOutcome> {
        if let Some(outcome) = self.finished.take() {
            return Some(outcome);
        }
        let active = self.active.take()?;
        Some(self.abandon_active(active).await)
    }

    // =========================================================================
    // Session transitions
    // =========================================================================

    /// Idle → Sending: validate input, append the user message, loading on
    async fn open_session(&mut self, input: &str) -> Result<ChatRequest, RejectReason> {
        if input.trim().is_empty() {
            return Err(RejectReason::EmptyInput);
        }
        if self.state.is_active() || self.active.is_some() {
            return Err(RejectReason::SessionActive);
        }
        // An early outcome nobody collected belongs to a finished session
        self.finished = None;

        // Forget any cancellation aimed at a previous session
        self.cancel_tx.send_replace(false);
        self.cancel_rx.borrow_and_update();

        let id = self.history.next_id();
        let mut outbox = Vec::new();
        self.commit(ChatUpdate::MessageAppended(Message::user(id, input)), &mut outbox);
        self.commit(ChatUpdate::LoadingStateChanged(true), &mut outbox);
        self.state = SessionState::Sending;
        self.flush(outbox).await;

        tracing::info!(
            message_id = %id,
            transport = self.transport.name(),
            "Sending message"
        );

        Ok(ChatRequest::new(input, self.config.user_id.as_str()))
    }

    /// Apply events in order; returns true once the reply is finalized
    async fn reconcile(&mut self, active: &mut ActiveSession, events: &[StreamEvent]) -> bool {
        let mut outbox = Vec::new();
        for event in events {
            if let Some(update) = active.reconciler.apply(event) {
                self.commit(update, &mut outbox);
            }
            if active.reconciler.is_finalized() {
                // Remaining events (and bytes) are not needed
                break;
            }
        }
        self.flush(outbox).await;
        active.reconciler.is_finalized()
    }

    /// Streaming → Completed
    async fn complete(&mut self, mut active: ActiveSession) -> SessionOutcome {
        let mut outbox = Vec::new();
        if let Some(update) = active.reconciler.finalize() {
            self.commit(update, &mut outbox);
        }
        self.commit(ChatUpdate::LoadingStateChanged(false), &mut outbox);
        self.state = SessionState::Completed;
        self.flush(outbox).await;

        let stats = active.pipeline.stats();
        let message_id = active.reconciler.target();
        tracing::info!(
            message_id = %message_id,
            chunks = stats.chunks,
            bytes = stats.bytes,
            deltas = stats.deltas,
            malformed = stats.malformed_frames,
            elapsed = ?active.started_at.elapsed(),
            "Reply completed"
        );

        SessionOutcome::Completed {
            message_id,
            text: active.reconciler.text().to_string(),
            stats,
        }
    }

    /// Sending | Streaming → Failed
    async fn fail(&mut self, error: SessionError, active: Option<ActiveSession>) -> SessionOutcome {
        tracing::warn!(error = %error, "Session failed");

        let mut outbox = Vec::new();
        let fallback = self.config.fallback_message.clone();

        match active {
            None => {
                let id = self.history.next_id();
                self.commit(ChatUpdate::MessageAppended(Message::bot(id, fallback)), &mut outbox);
            }
            Some(mut active) => {
                active.pipeline.abandon();
                if active.reconciler.text().is_empty() {
                    // Placeholder turns into the fallback in place
                    self.commit(
                        ChatUpdate::MessageTextUpdated {
                            id: active.reconciler.target(),
                            text: fallback,
                            is_typing: false,
                        },
                        &mut outbox,
                    );
                } else {
                    if let Some(update) = active.reconciler.finalize() {
                        self.commit(update, &mut outbox);
                    }
                    let id = self.history.next_id();
                    self.commit(ChatUpdate::MessageAppended(Message::bot(id, fallback)), &mut outbox);
                }
            }
        }

        self.commit(ChatUpdate::LoadingStateChanged(false), &mut outbox);
        self.state = SessionState::Failed;
        self.flush(outbox).await;

        SessionOutcome::Failed { error }
    }

    /// Streaming → Abandoned
    async fn abandon_active(&mut self, mut active: ActiveSession) -> SessionOutcome {
        // Partial frame is dropped, not flushed
        active.pipeline.abandon();

        let mut outbox = Vec::new();
        if let Some(update) = active.reconciler.finalize() {
            self.commit(update, &mut outbox);
        }
        self.commit(ChatUpdate::LoadingStateChanged(false), &mut outbox);
        self.state = SessionState::Abandoned;
        self.flush(outbox).await;

        let message_id = active.reconciler.target();
        tracing::info!(message_id = %message_id, "Reply abandoned");

        SessionOutcome::Abandoned {
            message_id: Some(message_id),
            text: active.reconciler.text().to_string(),
        }
    }

    /// Sending → Abandoned
    async fn abandon_before_stream(&mut self) -> SessionOutcome {
        let mut outbox = Vec::new();
        self.commit(ChatUpdate::LoadingStateChanged(false), &mut outbox);
        self.state = SessionState::Abandoned;
        self.flush(outbox).await;

        tracing::info!("Request abandoned before the reply started");

        SessionOutcome::Abandoned {
            message_id: None,
            text: String::new(),
        }
    }

    // =========================================================================
    // Update delivery
    // =========================================================================

    /// Apply an update to the history and queue it for the renderer
    fn commit(&mut self, update: ChatUpdate, outbox: &mut Vec<ChatUpdate>) {
        match self.history.apply(&update) {
            Ok(()) => outbox.push(update),
            Err(e) => tracing::warn!(error = %e, ?update, "Dropping update"),
        }
    }

    /// Send queued updates in order
    async fn flush(&self, outbox: Vec<ChatUpdate>) {
        for update in outbox {
            self.send(update).await;
        }
    }

    /// Send an update to the renderer
    async fn send(&self, update: ChatUpdate) {
        if let Err(e) = self.tx.send(update).await {
            tracing::warn!("Failed to send update to renderer: {}", e);
        }
    }
}

/// Resolves once cancellation has been requested
async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: cancellation can no longer happen
            std::future::pending::<()>().await;
        }
    }
}
