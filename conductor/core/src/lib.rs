//! Chat Conductor - Streaming Chat Client Core
//!
//! This crate sends a user's message to a streaming chat service and turns
//! the streamed reply into an incrementally growing bot message. It is
//! independent of any UI framework: a terminal, a web view or a test harness
//! can all render the same stream of updates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Renderer                                │
//! │          (terminal, web view, test harness, ...)                 │
//! └──────────────────────────────▲───────────────────────────────────┘
//!                                │ ChatUpdate (mpsc)
//! ┌──────────────────────────────┼───────────────────────────────────┐
//! │                         Conductor                                │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────────┐  │
//! │  │   History    │◀─│   Reconciler   │◀─│   StreamPipeline     │  │
//! │  │  (reducer)   │  │ (one message)  │  │ decode/split/parse   │  │
//! │  └──────────────┘  └────────────────┘  └──────────▲───────────┘  │
//! │                                                   │ bytes        │
//! │                                        ┌──────────┴───────────┐  │
//! │                                        │    ChatTransport     │  │
//! │                                        │       (HTTP)         │  │
//! │                                        └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Runs one chat session at a time and owns the history
//! - [`ChatUpdate`]: Changes sent from the Conductor to the renderer
//! - [`ConversationHistory`]: Ordered messages, kept as a reducer over updates
//! - [`StreamPipeline`]: Bytes in, stream events out
//! - [`ChatTransport`]: Connection to the chat service
//!
//! # Quick Start
//!
//! ```ignore
//! use chat_conductor::{load_config, Conductor, HttpTransport};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let (tx, mut rx) = mpsc::channel(config.update_channel_capacity);
//!
//!     let transport = HttpTransport::from_config(&config)?;
//!     let mut conductor = Conductor::new(transport, config, tx);
//!     conductor.start().await;
//!
//!     tokio::spawn(async move {
//!         while let Some(update) = rx.recv().await {
//!             // Render update
//!         }
//!     });
//!
//!     let outcome = conductor.send_message("Hello!").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Chat service transport abstraction (HTTP)
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: Layered configuration (defaults, TOML, environment, CLI)
//! - [`history`]: Conversation history reducer
//! - [`messages`]: Messages and renderer updates
//! - [`reconciler`]: Folds stream events into one bot message
//! - [`session`]: Session states, outcomes and cancellation
//! - [`streaming`]: Decoder, frame splitter and event parser

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod history;
pub mod messages;
pub mod reconciler;
pub mod session;
pub mod streaming;

// Re-exports for convenience
pub use backend::{
    ByteStream, ChatReply, ChatRequest, ChatTransport, HealthStatus, HttpTransport,
    TransportError,
};
pub use conductor::Conductor;
pub use history::{ConversationHistory, HistoryError};
pub use messages::{ChatUpdate, Message, MessageId, Sender};
pub use reconciler::MessageReconciler;
pub use session::{CancelHandle, RejectReason, SessionError, SessionOutcome, SessionState, Step};

// Streaming exports
pub use streaming::{
    parse_frame, DecodeError, FrameParseError, FrameSplitter, ParsedFrame, PipelineStats,
    StreamEvent, StreamPipeline, Utf8ChunkDecoder,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env,
    ConductorConfig, ConductorToml, ConfigError, ConfigOverrides, ConfigSource,
};
