//! Chat Transport Traits
//!
//! Trait definitions for the connection between the Conductor and the chat
//! service. The Conductor only ever sees a [`ByteStream`]; how the bytes get
//! there (HTTP, a scripted test double, ...) is the transport's business.
//!
//! # Design Philosophy
//!
//! The [`ChatTransport`] trait provides a common interface for:
//! - Opening a streamed reply for one user message
//! - Health checking the service
//! - Sending a message and waiting for the whole reply
//!
//! A transport never interprets the streamed bytes. Decoding and framing
//! belong to [`crate::streaming`].

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Raw reply bytes, in network order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Errors raised by a transport
///
/// All of these are fatal to the session that hit them. There is no retry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be delivered
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The service answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any could be read
        body: String,
    },

    /// Reading the next chunk of the reply failed
    #[error("failed to read response: {0}")]
    ReceiveFailed(String),

    /// A non-streamed response body could not be understood
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// One user message bound for the chat service
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// The user's text
    pub message: String,
    /// Which user is talking
    pub user_id: String,
}

impl ChatRequest {
    /// Create a new request
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: user_id.into(),
        }
    }
}

/// Result of a health probe
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Service-reported status, `"healthy"` when all is well
    pub status: String,
    /// Whether the service has credentials for its upstream model
    #[serde(default)]
    pub api_key_configured: bool,
}

impl HealthStatus {
    /// Whether the service reported itself healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// A complete, non-streamed reply
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatReply {
    /// The reply text
    pub response: String,
    /// Structured career plan, when the service produced one
    #[serde(default)]
    pub career_plan: Option<Value>,
    /// Structured schedule, when the service produced one
    #[serde(default)]
    pub schedule: Option<Value>,
    /// Suggested resources, when the service produced any
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
}

/// Chat transport trait
///
/// Implement this trait to connect the Conductor to a chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Get the transport name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Probe the service
    async fn health_check(&self) -> Result<HealthStatus, TransportError>;

    /// Send a message and get the reply as a byte stream
    ///
    /// Resolves once the service has accepted the request with a success
    /// status. Dropping the returned stream releases the connection.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;

    /// Send a message and wait for the complete reply (non-streaming)
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;

    /// Check if the service is reachable and healthy
    async fn is_available(&self) -> bool {
        self.health_check()
            .await
            .is_ok_and(|health| health.is_healthy())
    }
}
