//! Chat Service Transport
//!
//! This module provides abstracted access to the chat service through a
//! common trait interface.
//!
//! # Available Transports
//!
//! - **HTTP**: The streaming chat service over HTTP (default)
//!
//! # Usage
//!
//! ```ignore
//! use chat_conductor::backend::{ChatRequest, ChatTransport, HttpTransport};
//! use chat_conductor::ConductorConfig;
//!
//! let transport = HttpTransport::from_config(&ConductorConfig::default())?;
//! let request = ChatRequest::new("Hello!", "default_user");
//! let stream = transport.open_stream(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::{
    ByteStream, ChatReply, ChatRequest, ChatTransport, HealthStatus, TransportError,
};
