//! # sync-core
//!
//! Pure logic for the Quill sync engine (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms for client-side
//! synchronization without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (network, persistence) is performed by `sync-engine`, which
//! interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod cursor;
pub mod state;

pub use buffer::EventStreamBuffer;
pub use cursor::EventCursor;
pub use state::{StreamAction, StreamInput, StreamState, SyncStateController};
