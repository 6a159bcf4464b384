//! Transport abstraction for the sync engine.
//!
//! The engine never performs network I/O itself: strategies produce
//! [`OutboundRequest`]s, and a [`Transport`] implementation executes them
//! and reports a [`TransportResponse`] back. Retry and back-off timing
//! belong to the transport, not to the engine.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_response(TransportResponse::ok());
//! let response = transport.execute(&OutboundRequest::get("/self")).await?;
//! ```

mod mock;

pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;

use quill_sync_types::{OutboundRequest, TransportResponse};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Request execution failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,
}

/// Executes outbound requests produced by the sync strategies.
///
/// Implementations handle the underlying connection mechanism; the engine
/// only contracts request-in, response-out.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and return the server's response.
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;

    /// Check if the transport currently has a connection.
    fn is_connected(&self) -> bool;
}
