//! Persistence collaborator seam for the durable decode cursor.
//!
//! The engine records the highest contiguously processed event position so
//! that after a restart, streaming resumes without re-applying events. The
//! store's schema is the application's business; the core only contracts
//! read and write of the position.

use thiserror::Error;

use quill_sync_types::EventPosition;

/// Cursor store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be read or written.
    #[error("cursor store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for the decode cursor.
pub trait CursorStore: Send {
    /// Load the persisted position ([`EventPosition::zero`] when none).
    fn load(&self) -> Result<EventPosition, StoreError>;

    /// Persist the given position.
    fn save(&mut self, position: EventPosition) -> Result<(), StoreError>;
}

/// In-memory cursor store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    position: EventPosition,
}

impl InMemoryCursorStore {
    /// Create a store resuming from a given position.
    pub fn starting_at(position: EventPosition) -> Self {
        Self { position }
    }

    /// The currently stored position.
    pub fn position(&self) -> EventPosition {
        self.position
    }
}

impl CursorStore for InMemoryCursorStore {
    fn load(&self) -> Result<EventPosition, StoreError> {
        Ok(self.position)
    }

    fn save(&mut self, position: EventPosition) -> Result<(), StoreError> {
        self.position = position;
        Ok(())
    }
}
