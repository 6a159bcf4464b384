//! Mock transport for testing.
//!
//! Allows queueing responses and capturing executed requests for
//! verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use quill_sync_types::{OutboundRequest, TransportResponse};

/// Mock transport for testing.
///
/// Allows queueing responses and capturing executed requests for
/// verification.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug)]
struct MockTransportInner {
    connected: bool,
    executed: Vec<OutboundRequest>,
    response_queue: VecDeque<TransportResponse>,
    fail_next: Option<String>,
}

impl Default for MockTransportInner {
    fn default() -> Self {
        Self {
            connected: true,
            executed: Vec::new(),
            response_queue: VecDeque::new(),
            fail_next: None,
        }
    }
}

impl MockTransport {
    /// Create a new mock transport, connected by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to be returned by the next `execute()` call.
    pub fn queue_response(&self, response: TransportResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.response_queue.push_back(response);
    }

    /// All requests executed so far, in execution order.
    pub fn executed_requests(&self) -> Vec<OutboundRequest> {
        let inner = self.inner.lock().unwrap();
        inner.executed.clone()
    }

    /// The most recently executed request.
    pub fn last_request(&self) -> Option<OutboundRequest> {
        let inner = self.inner.lock().unwrap();
        inner.executed.last().cloned()
    }

    /// Cause the next `execute()` to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }

    /// Simulate losing the connection.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
    }

    /// Simulate regaining the connection.
    pub fn reconnect(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = true;
    }

    /// Clear all state (requests, queue) and reconnect.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        inner.executed.push(request.clone());

        // Check for forced failure
        if let Some(error) = inner.fail_next.take() {
            return Err(TransportError::RequestFailed(error));
        }
        inner
            .response_queue
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }
}
