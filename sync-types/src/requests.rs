//! The request boundary between the sync engine and the transport.
//!
//! Strategies produce [`OutboundRequest`]s; the transport executes them and
//! reports a [`TransportResponse`] back into the synchronization context.
//! How a request is serialized on the wire is the transport's business.

use serde::{Deserialize, Serialize};

/// HTTP-ish method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMethod {
    /// Fetch a resource.
    Get,
    /// Create or relay.
    Post,
    /// Update a resource.
    Put,
}

/// An outbound request produced by a sync strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    /// Request method.
    pub method: RequestMethod,
    /// Resource path, e.g. `/self` or `/notifications`.
    pub path: String,
    /// Optional request body (opaque to the engine).
    pub payload: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            path: path.into(),
            payload: None,
        }
    }

    /// Create a POST request with a body.
    pub fn post(path: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            method: RequestMethod::Post,
            path: path.into(),
            payload: Some(payload),
        }
    }

    /// Create a PUT request with a body.
    pub fn put(path: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            method: RequestMethod::Put,
            path: path.into(),
            payload: Some(payload),
        }
    }
}

/// The transport's answer to an [`OutboundRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResponse {
    /// Status code, HTTP semantics (2xx = success).
    pub status: u16,
    /// Optional response body (opaque to the engine).
    pub payload: Option<Vec<u8>>,
}

impl TransportResponse {
    /// A successful, empty response.
    pub fn ok() -> Self {
        Self {
            status: 200,
            payload: None,
        }
    }

    /// A successful response with a body.
    pub fn ok_with(payload: Vec<u8>) -> Self {
        Self {
            status: 200,
            payload: Some(payload),
        }
    }

    /// A failed response with the given status.
    pub fn error(status: u16) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
