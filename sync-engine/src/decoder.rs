//! Decoding raw update events into ordered domain events.
//!
//! The decoder owns the durable decode cursor: after each batch it records
//! the highest contiguously processed position through the [`CursorStore`],
//! so a restarted session resumes without re-applying events. Decoding is
//! order preserving, and one malformed event never blocks the rest of the
//! batch: the failure goes to the fault collaborator and decoding
//! continues.

use quill_sync_core::EventCursor;
use quill_sync_types::{DomainEvent, EventPayload, EventPosition, RawUpdateEvent};

use crate::fault::FaultReporter;
use crate::store::{CursorStore, StoreError};

/// Turns raw update events into ordered, typed domain events.
#[derive(Debug)]
pub struct EventDecoder<S: CursorStore> {
    cursor: EventCursor,
    store: S,
}

impl<S: CursorStore> EventDecoder<S> {
    /// Create a decoder resuming from the store's persisted position.
    pub fn new(store: S) -> Result<Self, StoreError> {
        let position = store.load()?;
        Ok(Self {
            cursor: EventCursor::resume_from(position),
            store,
        })
    }

    /// Decode a batch, in input order, skipping duplicates and failures.
    ///
    /// Already-processed positions are suppressed so a re-delivered event is
    /// decoded at most once. An undecodable event is reported to `faults`,
    /// counted as processed (it was consumed from the stream) and decoding
    /// continues with the next event. The contiguous position is persisted
    /// once, after the batch.
    pub fn decode_batch(
        &mut self,
        raw_events: &[RawUpdateEvent],
        faults: &dyn FaultReporter,
    ) -> Vec<DomainEvent> {
        let mut decoded = Vec::with_capacity(raw_events.len());

        for raw in raw_events {
            if self.cursor.is_processed(raw.position) {
                tracing::debug!("skipping already-processed event at {}", raw.position);
                continue;
            }

            match EventPayload::from_bytes(&raw.payload) {
                Ok(payload) => {
                    decoded.push(DomainEvent {
                        id: raw.id,
                        position: raw.position,
                        payload,
                    });
                }
                Err(error) => {
                    faults.decode_failed(raw.position, &error);
                }
            }
            self.cursor.mark_processed(raw.position);
        }

        self.persist_cursor();
        decoded
    }

    /// Acknowledge that a backlog pull covered everything up to `position`.
    pub fn acknowledge_up_to(&mut self, position: EventPosition) {
        self.cursor.acknowledge_up_to(position);
        self.persist_cursor();
    }

    /// The cursor state (contiguous position, gaps).
    pub fn cursor(&self) -> &EventCursor {
        &self.cursor
    }

    fn persist_cursor(&mut self) {
        if let Err(error) = self.store.save(self.cursor.contiguous()) {
            // The cursor is rebuilt from the store on restart; a failed save
            // means re-processing, which duplicate suppression absorbs.
            tracing::warn!("failed to persist decode cursor: {}", error);
        }
    }
}
