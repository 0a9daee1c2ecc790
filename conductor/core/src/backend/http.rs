//! HTTP Transport Implementation
//!
//! Chat transport for the streaming chat service over plain HTTP.
//!
//! # Service API
//!
//! - `POST /chat/stream` - Streamed reply (`data: {...}` lines)
//! - `POST /chat` - Whole reply as one JSON document
//! - `GET /health` - Service status
//!
//! Paths are configurable; see [`ConductorConfig`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;

use super::traits::{ByteStream, ChatReply, ChatRequest, ChatTransport, HealthStatus, TransportError};
use crate::config::ConductorConfig;

/// HTTP chat service client
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Base URL without trailing slash
    base_url: String,
    /// Path of the streaming endpoint
    stream_path: String,
    /// Path of the non-streaming endpoint
    chat_path: String,
    /// Path of the health endpoint
    health_path: String,
    /// Timeout for requests that are not streamed
    request_timeout: Duration,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the HTTP client cannot
    /// be built (e.g. no TLS backend available).
    pub fn from_config(config: &ConductorConfig) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            stream_path: config.stream_path.clone(),
            chat_path: config.chat_path.clone(),
            health_path: config.health_path.clone(),
            request_timeout: config.request_timeout,
            http_client,
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Turn a non-success response into [`TransportError::Status`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> Result<HealthStatus, TransportError> {
        let response = self
            .http_client
            .get(self.url(&self.health_path))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let url = self.url(&self.stream_path);
        tracing::debug!(%url, user_id = %request.user_id, "Opening reply stream");

        // No overall timeout: a reply may legitimately stream for a long time
        let response = self
            .http_client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::ReceiveFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self
            .http_client
            .post(self.url(&self.chat_path))
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}
