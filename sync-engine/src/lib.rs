//! # sync-engine
//!
//! Client-side synchronization orchestrator for the Quill messaging service.
//!
//! This is the component a session wires up to keep locally persisted
//! conversation/user state consistent with the server:
//!
//! - buffers and replays update events across stream interruptions
//! - decodes raw events into domain events in strict arrival order
//! - fans decoded events out to a registry of independent consumers
//! - pulls outbound requests from a registry of independent sync
//!   strategies, each owning a disjoint slice of domain state
//!
//! ## Architecture
//!
//! The engine interprets the pure state machines from `sync-core` and
//! performs the actual work (dispatch, persistence, request production).
//! All engine access is serialized onto one synchronization context; the
//! [`SyncPump`] is the async driver that enforces this and feeds requests
//! to a [`Transport`].
//!
//! ```text
//! transport events → SyncEngine → EventDecoder → ConsumerRegistry
//!                        ↓
//!                 StrategyRegistry → next_request() → Transport
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use quill_sync_engine::{SyncEngine, SyncConfig, SessionContext, InMemoryCursorStore};
//!
//! let ctx = SessionContext::new();
//! let mut engine = SyncEngine::new(SyncConfig::default(), ctx, InMemoryCursorStore::default())?;
//! engine.register_consumer(Box::new(my_consumer));
//! engine.did_establish_update_events_stream();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod consumer;
pub mod context;
pub mod decoder;
pub mod engine;
pub mod fault;
pub mod hotfix;
pub mod pump;
pub mod store;
pub mod strategies;
pub mod strategy;
pub mod transport;

pub use config::SyncConfig;
pub use consumer::{ConsumerError, ConsumerRegistry, EventConsumer};
pub use context::{ChangeSignal, OutgoingCallSignal, SelfProfile, SessionContext};
pub use decoder::EventDecoder;
pub use engine::{EngineError, SyncEngine};
pub use fault::{FaultRecord, FaultReporter, LogFaultReporter, RecordingFaultReporter};
pub use hotfix::{HotFix, HotFixApplier, PurgeStaleCallSignals};
pub use pump::SyncPump;
pub use store::{CursorStore, InMemoryCursorStore, StoreError};
pub use strategies::{
    CallingStrategy, DeviceRegistrationStrategy, MissingEventsStrategy, SelfProfilePayload,
    SelfProfileStrategy,
};
pub use strategy::{PendingRequest, RequestToken, StrategyError, StrategyRegistry, SyncStrategy};
pub use transport::{MockTransport, Transport, TransportError};
