//! Identity and ordering types for the Quill sync engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a single update event.
///
/// UUID v4 format (16 bytes), assigned by the server.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl EventId {
    /// Create a new random EventId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create an EventId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

/// A unique identifier for a conversation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(uuid::Uuid);

impl ConversationId {
    /// Create a new random ConversationId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversationId({})", self.0)
    }
}

/// A unique identifier for a user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(uuid::Uuid);

impl UserId {
    /// Create a new random UserId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// A monotonically increasing position marker for ordering update events.
///
/// Assigned by the server, not by clients. Positions are used only for
/// ordering and backlog recovery, never for business interpretation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventPosition(u64);

impl EventPosition {
    /// Create a new EventPosition with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this EventPosition.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Create an EventPosition representing "nothing processed yet".
    pub fn zero() -> Self {
        Self(0)
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventPosition({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_roundtrip() {
        let original = EventId::new();
        let restored = EventId::from_bytes(original.as_uuid().as_bytes()).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn event_id_is_uuid_v4() {
        let id = EventId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn event_id_from_invalid_length_fails() {
        assert!(EventId::from_bytes(&[0u8; 8]).is_none());
        assert!(EventId::from_bytes(&[0u8; 32]).is_none());
    }

    #[test]
    fn position_ordering() {
        let p1 = EventPosition::new(100);
        let p2 = EventPosition::new(200);
        assert!(p1 < p2);
        assert!(p2 > p1);
    }

    #[test]
    fn position_zero() {
        assert_eq!(EventPosition::zero().value(), 0);
    }
}
