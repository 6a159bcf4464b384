//! Update events in raw and decoded form.
//!
//! The server pushes [`RawUpdateEvent`]s over the update-event stream. The
//! payload is an opaque MessagePack blob until the engine decodes it into a
//! [`DomainEvent`] carrying a typed [`EventPayload`].

use serde::{Deserialize, Serialize};

use crate::{ConversationId, EventId, EventPosition, TypesError, UserId};

/// A raw update event as delivered by the transport.
///
/// Opaque to the orchestration core apart from its position marker, which is
/// used only for ordering and backlog recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdateEvent {
    /// Server-assigned event identifier.
    pub id: EventId,
    /// Ordering position assigned by the server.
    pub position: EventPosition,
    /// MessagePack-encoded [`EventPayload`].
    pub payload: Vec<u8>,
}

impl RawUpdateEvent {
    /// Create a raw event from an already-encoded payload.
    pub fn new(position: EventPosition, payload: Vec<u8>) -> Self {
        Self {
            id: EventId::new(),
            position,
            payload,
        }
    }

    /// Encode a typed payload into a raw event.
    ///
    /// Used by tests and by transports that synthesize events locally.
    pub fn from_payload(position: EventPosition, payload: &EventPayload) -> Result<Self, TypesError> {
        Ok(Self::new(position, payload.to_bytes()?))
    }
}

/// Discriminator for the decoded event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A message was added to a conversation.
    MessageAdded,
    /// A conversation was created.
    ConversationCreated,
    /// A conversation was renamed.
    ConversationRenamed,
    /// A user's profile changed.
    UserUpdated,
    /// Calling signaling data for a conversation.
    CallSignal,
}

/// The decoded, typed payload of an update event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    /// A message was added to a conversation.
    MessageAdded {
        /// The conversation the message belongs to.
        conversation: ConversationId,
        /// The sending user.
        sender: UserId,
        /// Opaque message content (already decrypted by the transport layer).
        content: Vec<u8>,
    },
    /// A conversation was created.
    ConversationCreated {
        /// The new conversation.
        conversation: ConversationId,
        /// The creating user.
        creator: UserId,
    },
    /// A conversation was renamed.
    ConversationRenamed {
        /// The renamed conversation.
        conversation: ConversationId,
        /// The new name.
        name: String,
    },
    /// A user's profile changed.
    UserUpdated {
        /// The affected user.
        user: UserId,
        /// New display name, if it changed.
        name: Option<String>,
        /// New handle, if it changed.
        handle: Option<String>,
    },
    /// Calling signaling data for a conversation.
    CallSignal {
        /// The conversation the call belongs to.
        conversation: ConversationId,
        /// The signaling sender.
        sender: UserId,
        /// Opaque signaling blob, relayed to the calling pipeline.
        data: Vec<u8>,
    },
}

impl EventPayload {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)
    }

    /// The discriminator for this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageAdded { .. } => EventKind::MessageAdded,
            Self::ConversationCreated { .. } => EventKind::ConversationCreated,
            Self::ConversationRenamed { .. } => EventKind::ConversationRenamed,
            Self::UserUpdated { .. } => EventKind::UserUpdated,
            Self::CallSignal { .. } => EventKind::CallSignal,
        }
    }
}

/// A decoded update event, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    /// Identifier carried over from the raw event.
    pub id: EventId,
    /// Ordering position carried over from the raw event.
    pub position: EventPosition,
    /// The decoded payload.
    pub payload: EventPayload,
}

impl DomainEvent {
    /// The discriminator of the decoded payload.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
