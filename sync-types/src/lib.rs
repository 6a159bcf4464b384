//! # sync-types
//!
//! Event and request types for the Quill client sync engine.
//!
//! This crate provides the foundational types used across all quill-sync crates:
//! - [`EventId`], [`ConversationId`], [`UserId`], [`EventPosition`] - Identity and ordering types
//! - [`RawUpdateEvent`], [`DomainEvent`], [`EventPayload`] - Update events in raw and decoded form
//! - [`OutboundRequest`], [`TransportResponse`] - The request boundary with the transport
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod ids;
mod requests;

pub use error::TypesError;
pub use events::{DomainEvent, EventKind, EventPayload, RawUpdateEvent};
pub use ids::{ConversationId, EventId, EventPosition, UserId};
pub use requests::{OutboundRequest, RequestMethod, TransportResponse};
